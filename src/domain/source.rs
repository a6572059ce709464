// src/domain/source.rs
//
// Shoko Server wire model
//
// These are serde mappings of the Shoko v3 API payloads this system consumes.
// Shoko is the source of truth for which files exist and how they cross-
// reference TMDb; everything here is read-only from our perspective.

use serde::Deserialize;

/// Detailed record for one file known to Shoko
/// (`/api/v3/File/{id}?include=MediaInfo,XRefs`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceFileDetails {
    #[serde(rename = "ID")]
    pub id: i64,

    #[serde(rename = "Locations", default)]
    pub locations: Vec<FileLocation>,

    /// Series cross-references; empty when Shoko has not linked the file.
    #[serde(rename = "SeriesIDs", default)]
    pub series_cross_refs: Vec<SeriesCrossRef>,
}

impl SourceFileDetails {
    /// Relative path as reported by Shoko (slash- or backslash-delimited).
    pub fn relative_path(&self) -> Option<&str> {
        self.locations.first().map(|l| l.relative_path.as_str())
    }

    /// Final path component of the first location.
    pub fn original_filename(&self) -> Option<&str> {
        self.relative_path()
            .map(|p| p.rsplit(['/', '\\']).next().unwrap_or(p))
    }

    /// TMDb show ID reachable through the first series link.
    pub fn tmdb_show_id(&self) -> Option<i64> {
        self.series_cross_refs
            .first()
            .and_then(|xref| xref.series_id.tmdb.show.first().copied())
    }

    /// Shoko episode ID from the first cross-reference of the first link.
    pub fn first_episode_id(&self) -> Option<i64> {
        self.series_cross_refs
            .first()
            .and_then(|xref| xref.episode_ids.first())
            .map(|e| e.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileLocation {
    #[serde(rename = "RelativePath")]
    pub relative_path: String,
}

/// One series link on a file, carrying the nested TMDb show IDs and the
/// per-file episode cross-references.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesCrossRef {
    #[serde(rename = "SeriesID", default)]
    pub series_id: SeriesIdRefs,

    #[serde(rename = "EpisodeIDs", default)]
    pub episode_ids: Vec<EpisodeIdRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesIdRefs {
    #[serde(rename = "TMDB", default)]
    pub tmdb: TmdbShowRefs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbShowRefs {
    #[serde(rename = "Show", default)]
    pub show: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeIdRef {
    #[serde(rename = "ID")]
    pub id: i64,
}

/// Resolved metadata for one Shoko episode entry
/// (`/api/v3/Episode/{id}?includeDataFrom=AniDB,TMDB`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeRecord {
    #[serde(rename = "Name")]
    pub name: Option<String>,

    #[serde(rename = "AniDB", default)]
    pub anidb: AniDbInfo,

    #[serde(rename = "IDs", default)]
    pub ids: EpisodeIdBlock,

    /// Full TMDb objects Shoko sometimes embeds inline, saving a fetch.
    #[serde(rename = "TMDB", default)]
    pub tmdb: InlineTmdbData,
}

impl EpisodeRecord {
    pub fn kind(&self) -> Option<EpisodeKind> {
        self.anidb.kind
    }

    /// First TMDb movie ID, if the episode is cross-referenced as a movie.
    pub fn first_movie_id(&self) -> Option<i64> {
        self.ids.tmdb.movie.first().copied()
    }

    /// First TMDb episode ID, if directly cross-referenced.
    pub fn first_tmdb_episode_id(&self) -> Option<i64> {
        self.ids.tmdb.episode.first().copied()
    }
}

/// AniDB's classification of the episode entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EpisodeKind {
    Normal,
    Special,
    Trailer,
    Credits,
    Parody,
    Movie,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AniDbInfo {
    #[serde(rename = "Type")]
    pub kind: Option<EpisodeKind>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeIdBlock {
    #[serde(rename = "TMDB", default)]
    pub tmdb: TmdbEpisodeRefs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbEpisodeRefs {
    #[serde(rename = "Movie", default)]
    pub movie: Vec<i64>,

    #[serde(rename = "Episode", default)]
    pub episode: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InlineTmdbData {
    #[serde(rename = "Movies", default)]
    pub movies: Vec<InlineMovie>,

    #[serde(rename = "Episodes", default)]
    pub episodes: Vec<InlineEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineMovie {
    #[serde(rename = "ID")]
    pub id: i64,

    #[serde(rename = "Title")]
    pub title: Option<String>,

    #[serde(rename = "ReleasedAt")]
    pub released_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineEpisode {
    #[serde(rename = "ID")]
    pub id: i64,

    #[serde(rename = "SeasonNumber")]
    pub season_number: u32,

    #[serde(rename = "EpisodeNumber")]
    pub episode_number: u32,

    #[serde(rename = "Title")]
    pub title: Option<String>,
}
