// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file declares all domain modules and re-exports their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod reference;
pub mod source;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Source catalog (Shoko) wire model
pub use source::{
    AniDbInfo, EpisodeIdBlock, EpisodeIdRef, EpisodeKind, EpisodeRecord, FileLocation,
    InlineEpisode, InlineMovie, InlineTmdbData, SeriesCrossRef, SeriesIdRefs, SourceFileDetails,
    TmdbEpisodeRefs, TmdbShowRefs,
};

// Reference catalog (TMDb) wire model
pub use reference::{ReferenceEpisode, ReferenceMovie, ReferenceSeries, SeasonSummary};
