// src/services/resolution_service.rs
//
// Resolution Service
//
// Classifies one source file as a movie, a TV episode, or an extra, resolves
// its TMDb identity, and derives the destination folder and filename.
//
// CRITICAL RULES:
// - Pure decision logic over already-fetched source metadata
// - MAY query the reference catalog (cached, read-only)
// - MUST NOT touch the filesystem or the ledger
// - Expected data gaps (missing links, missing IDs, failed lookups) become
//   Unmatched with a human-readable reason, never an error
// - Deterministic: same input and reference data → same destination

use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::{
    EpisodeKind, EpisodeRecord, ReferenceEpisode, ReferenceMovie, ReferenceSeries,
    SourceFileDetails,
};
use crate::integrations::tmdb::ReferenceCatalog;

// ============================================================================
// RESOLUTION OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Destination folder plus final filename.
    Resolved { folder: PathBuf, filename: String },

    /// The file cannot be placed; the reason feeds the unmatched report.
    Unmatched { reason: String },
}

impl Resolution {
    fn unmatched(reason: impl Into<String>) -> Self {
        Resolution::Unmatched {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// RESOLUTION SERVICE
// ============================================================================

pub struct ResolutionService {
    reference: Arc<dyn ReferenceCatalog>,
    dest_shows: PathBuf,
    dest_movies: PathBuf,
    title_similarity_threshold: f64,
}

impl ResolutionService {
    pub fn new(
        reference: Arc<dyn ReferenceCatalog>,
        dest_shows: PathBuf,
        dest_movies: PathBuf,
        title_similarity_threshold: f64,
    ) -> Self {
        Self {
            reference,
            dest_shows,
            dest_movies,
            title_similarity_threshold,
        }
    }

    /// Resolve one source file to its destination.
    pub fn resolve(&self, file: &SourceFileDetails, episode: &EpisodeRecord) -> Resolution {
        let original_filename = match file.original_filename() {
            Some(name) => name,
            None => return Resolution::unmatched("File has no known location in Shoko."),
        };

        // A TMDb movie cross-reference wins over everything else.
        if let Some(movie_id) = episode.first_movie_id() {
            self.resolve_movie(episode, original_filename, movie_id)
        } else {
            self.resolve_show(file, episode, original_filename)
        }
    }

    // ========================================================================
    // MOVIE PATHING
    // ========================================================================

    fn resolve_movie(
        &self,
        episode: &EpisodeRecord,
        original_filename: &str,
        movie_id: i64,
    ) -> Resolution {
        debug!("  --- Processing as Movie ---");
        info!("    Identified as MOVIE via TMDb ID: {}", movie_id);

        let inline = episode
            .tmdb
            .movies
            .first()
            .filter(|m| m.id == movie_id)
            .map(|m| ReferenceMovie {
                title: m.title.clone(),
                release_date: m.released_at.clone(),
            });

        let movie = match inline {
            Some(movie) => {
                info!("      > Found full movie data directly from Shoko. Skipping TMDb API call.");
                movie
            }
            None => {
                info!("      > Shoko did not provide full data. Querying TMDb API as a fallback...");
                match self.reference.movie_details(movie_id) {
                    Some(movie) => movie,
                    None => {
                        warn!("  Failed to get TMDb details for Movie ID {}. Skipping.", movie_id);
                        return Resolution::unmatched(format!(
                            "Failed to get TMDb details for Movie ID {}.",
                            movie_id
                        ));
                    }
                }
            }
        };

        let folder_name = format!(
            "{} ({})",
            clean_filename(movie.title.as_deref()),
            movie.release_year()
        );
        let filename = format!("{}{}", folder_name, extension_of(original_filename));

        Resolution::Resolved {
            folder: self.dest_movies.join(&folder_name),
            filename,
        }
    }

    // ========================================================================
    // TV SHOW / EXTRA PATHING
    // ========================================================================

    fn resolve_show(
        &self,
        file: &SourceFileDetails,
        episode: &EpisodeRecord,
        original_filename: &str,
    ) -> Resolution {
        debug!("  --- Processing as TV Show / Extra ---");

        let show_id = match file.tmdb_show_id() {
            Some(id) => id,
            None => {
                warn!("  Could not find a TMDb Show ID link in the series cross-reference data. Skipping.");
                return Resolution::unmatched(
                    "No TMDb Show ID link in the series cross-reference data.",
                );
            }
        };

        debug!("    > Fetching series details for TMDb ID {}...", show_id);
        let series = match self.reference.series_details(show_id) {
            Some(series) => series,
            None => {
                warn!(
                    "  Cannot process because TMDb series data could not be fetched for show ID {}.",
                    show_id
                );
                return Resolution::unmatched(format!(
                    "TMDb series data could not be fetched for show ID {}.",
                    show_id
                ));
            }
        };

        let found = self.find_tv_episode(episode, show_id, &series);

        let show_folder = format!(
            "{} ({})",
            clean_filename(series.name.as_deref()),
            series.first_air_year()
        );

        if let Some(matched) = found {
            let season = format!("{:02}", matched.season_number);
            let number = format!("{:02}", matched.episode_number);
            let filename = format!(
                "{} - S{}E{} - {}{}",
                show_folder,
                season,
                number,
                clean_filename(matched.name.as_deref()),
                extension_of(original_filename)
            );

            return Resolution::Resolved {
                folder: self
                    .dest_shows
                    .join(&show_folder)
                    .join(format!("Season {}", season)),
                filename,
            };
        }

        // A Normal episode with no resolvable identity is an error, not an extra.
        if episode.kind() == Some(EpisodeKind::Normal) {
            return Resolution::unmatched(
                "Could not match a Normal episode to any TMDb episode by ID or title.",
            );
        }

        let kind = episode.kind();
        info!(
            "    File could not be matched to a TV episode. Treating as an EXTRA of type '{:?}'.",
            kind
        );

        let extra_folder = match kind {
            Some(EpisodeKind::Trailer) => "Trailers",
            Some(EpisodeKind::Special | EpisodeKind::Credits | EpisodeKind::Parody) => {
                "Featurettes"
            }
            _ => "Other",
        };

        let descriptive = match episode.name.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => clean_filename(Some(title)),
            None => clean_filename(Some(stem_of(original_filename))),
        };
        let filename = format!("{}{}", descriptive, extension_of(original_filename));

        Resolution::Resolved {
            folder: self.dest_shows.join(&show_folder).join(extra_folder),
            filename,
        }
    }

    /// Find the TMDb episode, by direct ID first, then by title similarity.
    fn find_tv_episode(
        &self,
        episode: &EpisodeRecord,
        show_id: i64,
        series: &ReferenceSeries,
    ) -> Option<ReferenceEpisode> {
        // --- Direct ID match ---
        if let Some(ep_id) = episode.first_tmdb_episode_id() {
            info!("    Identified as TV EPISODE via TMDb ID: {}", ep_id);

            if let Some(inline) = episode.tmdb.episodes.first() {
                if inline.id == ep_id {
                    info!("      > Found full episode data directly from Shoko. Skipping TMDb season search.");
                    return Some(ReferenceEpisode {
                        id: inline.id,
                        name: inline.title.clone(),
                        season_number: inline.season_number,
                        episode_number: inline.episode_number,
                    });
                }
            }

            info!("      > Shoko did not provide full data. Searching TMDb seasons as a fallback...");
            for season in &series.seasons {
                if season.season_number == 0 {
                    continue;
                }

                let episodes = self.reference.season_episodes(show_id, season.season_number);
                if let Some(found) = episodes.into_iter().find(|e| e.id == ep_id) {
                    debug!(
                        "        > Matched to S{}E{}",
                        found.season_number, found.episode_number
                    );
                    return Some(found);
                }
            }
        }

        // --- Title match fallback ---
        if episode.kind() == Some(EpisodeKind::Normal) {
            warn!("    No TMDb Episode ID link found for a 'Normal' episode. Attempting fallback match by title...");

            let source_title = match episode.name.as_deref().filter(|t| !t.is_empty()) {
                Some(title) => title.to_lowercase(),
                None => {
                    warn!("      > Fallback failed: Shoko episode title is missing.");
                    return None;
                }
            };

            let mut best_score = 0.0_f64;
            let mut best: Option<ReferenceEpisode> = None;

            let mut season_numbers: Vec<u32> = series
                .seasons
                .iter()
                .map(|s| s.season_number)
                .filter(|&n| n != 0)
                .collect();
            season_numbers.sort_unstable();

            for season_number in season_numbers {
                let mut episodes = self.reference.season_episodes(show_id, season_number);
                episodes.sort_by_key(|e| e.episode_number);

                for candidate in episodes {
                    let candidate_title =
                        candidate.name.clone().unwrap_or_default().to_lowercase();
                    let score = similarity_ratio(&source_title, &candidate_title);

                    // Strict > keeps the first-seen candidate on ties.
                    if score > best_score {
                        best_score = score;
                        best = Some(candidate);
                    }
                }
            }

            if best_score >= self.title_similarity_threshold {
                if let Some(found) = best {
                    info!(
                        "    SUCCESS (Fallback Match): Matched to S{}E{} with similarity {:.2}!",
                        found.season_number, found.episode_number, best_score
                    );
                    return Some(found);
                }
            }
        }

        None
    }
}

// ============================================================================
// NAMING HELPERS
// ============================================================================

/// Replace characters invalid on Windows and most filesystems with `-`.
/// An empty or missing name becomes "Untitled".
pub fn clean_filename(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => name
            .chars()
            .map(|c| match c {
                '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '-',
                other => other,
            })
            .collect(),
        _ => "Untitled".to_string(),
    }
}

/// Extension including the leading dot, empty when there is none.
/// A leading dot alone ("`.hidden`") does not count as an extension.
pub fn extension_of(filename: &str) -> &str {
    split_extension(filename).1
}

/// Filename without its extension.
pub fn stem_of(filename: &str) -> &str {
    split_extension(filename).0
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    }
}

// ============================================================================
// TITLE SIMILARITY (longest matching blocks)
// ============================================================================

/// Similarity ratio in 0.0..=1.0: twice the total length of the matching
/// blocks divided by the combined length, where blocks are found by
/// recursively taking the longest common substring.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_block_total(&a, &b);
    (2.0 * matched as f64) / total as f64
}

fn matching_block_total(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (a_start, b_start, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }

    len + matching_block_total(&a[..a_start], &b[..b_start])
        + matching_block_total(&a[a_start + len..], &b[b_start + len..])
}

/// Longest common substring of `a` and `b`; earliest start in `a` (then in
/// `b`) wins among equals.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];

    for i in 0..a.len() {
        let mut current = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                let run = prev[j] + 1;
                current[j + 1] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            }
        }
        prev = current;
    }

    best
}
