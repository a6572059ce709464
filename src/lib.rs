// src/lib.rs
// ShokoLink - Shoko Server to media-server library bridge
//
// Architecture:
// - Domain: serde wire models for the two catalogs, no behavior
// - Services: resolution (classify + path), materialization (link groups),
//   sync (orchestration)
// - Repositories: the SQLite idempotency ledger
// - Integrations: thin HTTP clients, cache, request pacing
// - Infrastructure: log sink, unmatched report

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod integrations;
pub mod repositories;
pub mod services;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    EpisodeKind, EpisodeRecord, ReferenceEpisode, ReferenceMovie, ReferenceSeries,
    SourceFileDetails,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::{load_config, Config, LinkType, PathMapping};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::open_connection;

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{ProcessedFileRepository, ProcessedRecord, SqliteProcessedFileRepository};

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{
    MetadataCache, ReferenceCatalog, RequestPacer, ShokoClient, SourceCatalog, TmdbClient,
};

// ============================================================================
// PUBLIC API - Infrastructure
// ============================================================================

pub use infrastructure::UnmatchedReport;

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    MaterializationService, Resolution, ResolutionService, SyncService,
};
