// src/integrations/shoko/client.rs
//
// Shoko Server API client
//
// Thin blocking HTTP wrapper around the v3 endpoints this system consumes.
// Every call carries the apikey header and a per-endpoint timeout.

use log::{debug, error, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use super::SourceCatalog;
use crate::domain::{EpisodeRecord, SourceFileDetails};
use crate::error::{AppError, AppResult};

const API_KEY_HEADER: &str = "apikey";

pub struct ShokoClient {
    base_url: String,
    api_key: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(rename = "List", default)]
    list: Vec<FileListEntry>,
}

#[derive(Debug, Deserialize)]
struct FileListEntry {
    #[serde(rename = "ID")]
    id: i64,
}

impl ShokoClient {
    pub fn new(base_url: &str, api_key: &str) -> AppResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(AppError::Http)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }
}

impl SourceCatalog for ShokoClient {
    fn check_connection(&self) -> bool {
        info!("Checking connection to Shoko Server at {}...", self.base_url);
        let result = self
            .http
            .get(format!("{}/api/v3/Init/Version", self.base_url))
            .timeout(Duration::from_secs(10))
            .send()
            .and_then(|r| r.error_for_status());

        match result {
            Ok(_) => {
                info!("Shoko Server connection successful.");
                true
            }
            Err(e) => {
                error!("Could not connect to Shoko Server. Error: {}", e);
                false
            }
        }
    }

    fn list_all_file_ids(&self) -> Vec<i64> {
        info!("Fetching all recognized file IDs from Shoko...");
        let result = self
            .http
            .get(format!("{}/api/v3/File", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("pageSize", "0")])
            .timeout(Duration::from_secs(120))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<FileListResponse>());

        match result {
            Ok(response) => {
                info!("Found {} total recognized files in Shoko.", response.list.len());
                response.list.into_iter().map(|f| f.id).collect()
            }
            Err(e) => {
                error!("Could not fetch file list from Shoko. Error: {}", e);
                Vec::new()
            }
        }
    }

    fn file_details(&self, file_id: i64) -> Option<SourceFileDetails> {
        debug!("  Fetching file details for ID: {}", file_id);
        let result = self
            .http
            .get(format!("{}/api/v3/File/{}", self.base_url, file_id))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("include", "MediaInfo,XRefs")])
            .timeout(Duration::from_secs(20))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<SourceFileDetails>());

        match result {
            Ok(details) => Some(details),
            Err(e) => {
                error!("Could not fetch details for file ID {}. Error: {}", file_id, e);
                None
            }
        }
    }

    fn episode_details(&self, episode_id: i64) -> Option<EpisodeRecord> {
        debug!("  Fetching episode details for ID: {}", episode_id);
        let result = self
            .http
            .get(format!("{}/api/v3/Episode/{}", self.base_url, episode_id))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("includeDataFrom", "AniDB,TMDB")])
            .timeout(Duration::from_secs(10))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<EpisodeRecord>());

        match result {
            Ok(record) => Some(record),
            Err(e) => {
                error!(
                    "  Could not get Shoko Episode details for ID {}. Error: {}",
                    episode_id, e
                );
                None
            }
        }
    }
}
