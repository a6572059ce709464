// src/integrations/mod.rs
//
// External Integrations Module
//
// HTTP clients for the two remote catalogs. These are INFRASTRUCTURE, not
// domain: they map remote payloads into the wire model and never decide
// anything. Failures are logged and degraded to None/empty; nothing here
// raises past the client boundary.

pub mod shoko;
pub mod tmdb;

pub use shoko::{ShokoClient, SourceCatalog};
pub use tmdb::{MetadataCache, ReferenceCatalog, RequestPacer, TmdbClient};
