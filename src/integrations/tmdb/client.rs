// src/integrations/tmdb/client.rs
//
// TMDb API client
//
// Every lookup checks the injected cache first; cache misses wait on the
// pacer, hit the API with a timeout, and cache the result. Failures are
// logged and degrade to None (series/movie) or empty (season).

use log::{debug, error, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;

use super::{MetadataCache, ReferenceCatalog, RequestPacer};
use crate::domain::{ReferenceEpisode, ReferenceMovie, ReferenceSeries};
use crate::error::{AppError, AppResult};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TmdbClient {
    base_url: String,
    api_key: String,
    http: Client,
    cache: Mutex<MetadataCache>,
    pacer: Mutex<RequestPacer>,
}

/// Season payloads carry the episode list nested under `episodes`.
#[derive(Debug, Deserialize)]
struct SeasonResponse {
    #[serde(default)]
    episodes: Vec<ReferenceEpisode>,
}

impl TmdbClient {
    pub fn new(api_key: &str, cache: MetadataCache, pacer: RequestPacer) -> AppResult<Self> {
        let http = Client::builder().build().map_err(AppError::Http)?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            http,
            cache: Mutex::new(cache),
            pacer: Mutex::new(pacer),
        })
    }

    /// Write the cache back to disk. Called at shutdown on every exit path.
    pub fn persist_cache(&self) -> AppResult<()> {
        self.cache
            .lock()
            .map_err(|_| AppError::Other("TMDb cache lock poisoned".to_string()))?
            .persist()
    }

    fn fetch<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, reqwest::Error> {
        {
            let mut pacer = self.pacer.lock().unwrap();
            pacer.pause();
        }

        self.http
            .get(format!("{}/{}", self.base_url, path))
            .query(&[("api_key", self.api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<T>())
    }
}

impl ReferenceCatalog for TmdbClient {
    fn series_details(&self, tmdb_id: i64) -> Option<ReferenceSeries> {
        let cache_key = format!("series_{}", tmdb_id);
        if let Some(cached) = self.cache.lock().unwrap().get::<ReferenceSeries>(&cache_key) {
            debug!("    > TMDb Series ID {} found in cache.", tmdb_id);
            return Some(cached);
        }

        info!("    > Querying TMDb API for Series ID: {}", tmdb_id);
        match self.fetch::<ReferenceSeries>(&format!("tv/{}", tmdb_id)) {
            Ok(series) => {
                debug!("    > TMDb Series ID {} fetched and cached.", tmdb_id);
                self.cache.lock().unwrap().set(&cache_key, &series);
                Some(series)
            }
            Err(e) => {
                error!(
                    "    > FAILED to get TMDb series details for ID {}. Error: {}",
                    tmdb_id, e
                );
                None
            }
        }
    }

    fn movie_details(&self, tmdb_id: i64) -> Option<ReferenceMovie> {
        let cache_key = format!("movie_{}", tmdb_id);
        if let Some(cached) = self.cache.lock().unwrap().get::<ReferenceMovie>(&cache_key) {
            debug!("    > TMDb Movie ID {} found in cache.", tmdb_id);
            return Some(cached);
        }

        info!("    > Querying TMDb API for Movie ID: {}", tmdb_id);
        match self.fetch::<ReferenceMovie>(&format!("movie/{}", tmdb_id)) {
            Ok(movie) => {
                debug!("    > TMDb Movie ID {} fetched and cached.", tmdb_id);
                self.cache.lock().unwrap().set(&cache_key, &movie);
                Some(movie)
            }
            Err(e) => {
                error!(
                    "    > FAILED to get TMDb movie details for ID {}. Error: {}",
                    tmdb_id, e
                );
                None
            }
        }
    }

    fn season_episodes(&self, tmdb_id: i64, season_number: u32) -> Vec<ReferenceEpisode> {
        let cache_key = format!("season_{}_{}", tmdb_id, season_number);
        if let Some(cached) = self
            .cache
            .lock()
            .unwrap()
            .get::<Vec<ReferenceEpisode>>(&cache_key)
        {
            debug!(
                "    > TMDb Season {} for Series {} found in cache.",
                season_number, tmdb_id
            );
            return cached;
        }

        info!("    > Querying TMDb API for Season {} details...", season_number);
        match self.fetch::<SeasonResponse>(&format!("tv/{}/season/{}", tmdb_id, season_number)) {
            Ok(season) => {
                debug!(
                    "    > TMDb Season {} for Series {} fetched and cached.",
                    season_number, tmdb_id
                );
                self.cache.lock().unwrap().set(&cache_key, &season.episodes);
                season.episodes
            }
            Err(e) => {
                error!(
                    "    > FAILED to get TMDb season {} for ID {}. Error: {}",
                    season_number, tmdb_id, e
                );
                Vec::new()
            }
        }
    }
}
