// src/integrations/tmdb/mod.rs
//
// Reference catalog (TMDb) integration

pub mod cache;
pub mod client;
pub mod pacer;

pub use cache::MetadataCache;
pub use client::TmdbClient;
pub use pacer::RequestPacer;

use crate::domain::{ReferenceEpisode, ReferenceMovie, ReferenceSeries};

/// Read-only view of the reference catalog.
///
/// Implementations consult a persistent cache before any network call and
/// enforce a minimum pause between requests. Failures degrade to None/empty.
#[cfg_attr(test, mockall::automock)]
pub trait ReferenceCatalog: Send + Sync {
    fn series_details(&self, tmdb_id: i64) -> Option<ReferenceSeries>;

    fn movie_details(&self, tmdb_id: i64) -> Option<ReferenceMovie>;

    /// Episodes of one season, in the order TMDb lists them.
    fn season_episodes(&self, tmdb_id: i64, season_number: u32) -> Vec<ReferenceEpisode>;
}
