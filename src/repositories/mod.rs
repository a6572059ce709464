// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO cross-repository calls
// - Explicit SQL only

pub mod processed_file_repository;

pub use processed_file_repository::{
    ProcessedFileRepository, ProcessedRecord, SqliteProcessedFileRepository,
};
