// src/config.rs
//
// Typed configuration loaded from config.json
//
// PRINCIPLES:
// - Explicit structs, serde defaults for optional knobs
// - A missing or unparseable file is a fatal setup error
// - No environment probing; every path comes from the file

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub shoko: ShokoConfig,
    pub tmdb: TmdbConfig,
    pub directories: DirectoryConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub path_mappings: Vec<PathMapping>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShokoConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Root under which Shoko's relative paths are resolved.
    pub source_root: PathBuf,

    /// Destination root for shows (and movies, when no movie root is set).
    pub destination: PathBuf,

    /// Optional separate destination root for movies.
    #[serde(default)]
    pub destination_movies: Option<PathBuf>,
}

impl DirectoryConfig {
    /// Movies land here; falls back to the shows destination.
    pub fn movies_destination(&self) -> &Path {
        self.destination_movies.as_deref().unwrap_or(&self.destination)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_db_path")]
    pub db: PathBuf,

    #[serde(default = "default_cache_path")]
    pub cache: PathBuf,

    #[serde(default = "default_report_path")]
    pub unmatched_report: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            db: default_db_path(),
            cache: default_cache_path(),
            unmatched_report: default_report_path(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("shokolink_state.db")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("shokolink_tmdb_cache.json")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("shokolink_unmatched_report.txt")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    pub link_type: LinkType,

    #[serde(default)]
    pub use_relative_symlinks: bool,

    /// Minimum similarity ratio a title-fallback match must reach.
    #[serde(default = "default_similarity_threshold")]
    pub title_similarity_threshold: f64,

    /// Minimum pause between TMDb requests, in milliseconds.
    #[serde(default = "default_tmdb_interval_ms")]
    pub tmdb_request_interval_ms: u64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            link_type: LinkType::default(),
            use_relative_symlinks: false,
            title_similarity_threshold: default_similarity_threshold(),
            tmdb_request_interval_ms: default_tmdb_interval_ms(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.8
}

fn default_tmdb_interval_ms() -> u64 {
    250
}

/// How destination files are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Symlink,
    Hardlink,
    Copy,
    Move,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Symlink => "symlink",
            LinkType::Hardlink => "hardlink",
            LinkType::Copy => "copy",
            LinkType::Move => "move",
        }
    }
}

/// Rewrites a source-path prefix so symlink targets point at the path the
/// media server sees rather than the path this process sees.
#[derive(Debug, Clone, Deserialize)]
pub struct PathMapping {
    pub source_prefix: String,
    pub target_prefix: String,
}

/// Load and parse the configuration file.
pub fn load_config(path: &Path) -> AppResult<Config> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!(
            "Configuration file not found or unreadable at {}: {}",
            path.display(),
            e
        ))
    })?;

    serde_json::from_str(&raw)
        .map_err(|e| AppError::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config_json() -> &'static str {
        r#"{
            "shoko": {"url": "http://localhost:8111", "api_key": "shoko-key"},
            "tmdb": {"api_key": "tmdb-key"},
            "directories": {
                "source_root": "/mnt/anime",
                "destination": "/mnt/library/shows"
            }
        }"#
    }

    #[test]
    fn test_minimal_config_applies_defaults() {
        let config: Config = serde_json::from_str(minimal_config_json()).unwrap();

        assert_eq!(config.options.link_type, LinkType::Symlink);
        assert!(!config.options.use_relative_symlinks);
        assert!((config.options.title_similarity_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.options.tmdb_request_interval_ms, 250);
        assert!(config.path_mappings.is_empty());
        assert_eq!(config.paths.db, PathBuf::from("shokolink_state.db"));
        assert_eq!(config.paths.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_movies_destination_falls_back_to_shows() {
        let config: Config = serde_json::from_str(minimal_config_json()).unwrap();
        assert_eq!(
            config.directories.movies_destination(),
            Path::new("/mnt/library/shows")
        );
    }

    #[test]
    fn test_explicit_options_parse() {
        let raw = r#"{
            "shoko": {"url": "http://localhost:8111", "api_key": "k"},
            "tmdb": {"api_key": "k"},
            "directories": {
                "source_root": "/src",
                "destination": "/shows",
                "destination_movies": "/movies"
            },
            "options": {
                "link_type": "hardlink",
                "use_relative_symlinks": true,
                "title_similarity_threshold": 0.65,
                "tmdb_request_interval_ms": 500
            },
            "path_mappings": [
                {"source_prefix": "/mnt/wsl", "target_prefix": "Z:/media"}
            ]
        }"#;

        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.options.link_type, LinkType::Hardlink);
        assert!(config.options.use_relative_symlinks);
        assert_eq!(config.directories.movies_destination(), Path::new("/movies"));
        assert_eq!(config.path_mappings.len(), 1);
        assert_eq!(config.path_mappings[0].target_prefix, "Z:/media");
    }

    #[test]
    fn test_unknown_link_type_is_rejected() {
        let raw = r#"{
            "shoko": {"url": "u", "api_key": "k"},
            "tmdb": {"api_key": "k"},
            "directories": {"source_root": "/s", "destination": "/d"},
            "options": {"link_type": "reflink"}
        }"#;

        assert!(serde_json::from_str::<Config>(raw).is_err());
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = load_config(Path::new("/nonexistent/shokolink-config.json")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
