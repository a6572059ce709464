// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod materialization_service;
pub mod resolution_service;
pub mod sync_service;

#[cfg(test)]
mod materialization_service_tests;



// Re-export all services and their types
pub use materialization_service::MaterializationService;

pub use resolution_service::{
    clean_filename, extension_of, similarity_ratio, stem_of, Resolution, ResolutionService,
};

pub use sync_service::SyncService;
