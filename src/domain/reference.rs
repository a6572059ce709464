// src/domain/reference.rs
//
// TMDb wire model
//
// Fetched once, cached indefinitely; treated as immutable for the process
// lifetime and across runs. Serialize is derived so entries round-trip
// through the JSON cache file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSeries {
    pub name: Option<String>,

    /// `YYYY-MM-DD`, may be absent for unaired series.
    pub first_air_date: Option<String>,

    #[serde(default)]
    pub seasons: Vec<SeasonSummary>,
}

impl ReferenceSeries {
    /// First-air year as text, empty when unknown.
    pub fn first_air_year(&self) -> &str {
        year_of(self.first_air_date.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceMovie {
    pub title: Option<String>,

    pub release_date: Option<String>,
}

impl ReferenceMovie {
    pub fn release_year(&self) -> &str {
        year_of(self.release_date.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEpisode {
    pub id: i64,

    pub name: Option<String>,

    pub season_number: u32,

    pub episode_number: u32,
}

/// Text before the first dash of a `YYYY-MM-DD` date, empty when absent.
fn year_of(date: Option<&str>) -> &str {
    date.unwrap_or("").split('-').next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_extraction() {
        let movie = ReferenceMovie {
            title: Some("X".to_string()),
            release_date: Some("2024-05-01".to_string()),
        };
        assert_eq!(movie.release_year(), "2024");

        let undated = ReferenceMovie {
            title: Some("X".to_string()),
            release_date: None,
        };
        assert_eq!(undated.release_year(), "");
    }

    #[test]
    fn test_series_deserializes_from_tmdb_shape() {
        let raw = r#"{
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "seasons": [
                {"season_number": 0},
                {"season_number": 1},
                {"season_number": 2}
            ]
        }"#;

        let series: ReferenceSeries = serde_json::from_str(raw).unwrap();
        assert_eq!(series.first_air_year(), "2008");
        assert_eq!(series.seasons.len(), 3);
    }
}
