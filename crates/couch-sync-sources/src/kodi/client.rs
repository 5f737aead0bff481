use async_trait::async_trait;
use couch_sync_config::LibraryConfig;
use couch_sync_models::{Movie, Show};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::convert::{self, EpisodesResponse, MoviesResponse, ShowsResponse};
use crate::error::SourceError;
use crate::traits::{MediaLibrary, ShowRatingUpdate};

const MOVIE_PROPERTIES: &[&str] = &[
    "title",
    "imdbnumber",
    "uniqueid",
    "year",
    "playcount",
    "lastplayed",
    "file",
    "dateadded",
    "runtime",
    "userrating",
];

const SHOW_PROPERTIES: &[&str] = &["title", "uniqueid", "year", "userrating"];

const EPISODE_PROPERTIES: &[&str] = &[
    "season",
    "episode",
    "playcount",
    "uniqueid",
    "lastplayed",
    "userrating",
];

/// JSON-RPC 2.0 client for a Kodi-style library over HTTP.
pub struct KodiClient {
    http: Client,
    url: String,
    username: Option<String>,
    password: Option<String>,
}

impl KodiClient {
    pub fn new(url: String, username: Option<String>, password: Option<String>) -> Self {
        Self {
            http: Client::new(),
            url,
            username,
            password,
        }
    }

    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(
            config.url.clone(),
            config.username.clone(),
            config.password.clone(),
        )
    }

    async fn post(&self, body: &Value) -> Result<Value, SourceError> {
        let mut request = self.http.post(&self.url).json(body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, SourceError> {
        debug!(method, "library rpc call");
        let body = json!({"jsonrpc": "2.0", "id": 0, "method": method, "params": params});
        let response = self.post(&body).await?;
        if let Some(error) = response.get("error") {
            return Err(SourceError::rejected(format!("{}: {}", method, error)));
        }
        response
            .get("result")
            .cloned()
            .ok_or_else(|| SourceError::decode(format!("{}: response has no result", method)))
    }

    /// Batched JSON-RPC request: one HTTP round trip, many method calls.
    async fn call_batch(&self, requests: Vec<Value>) -> Result<(), SourceError> {
        let response = self.post(&Value::Array(requests)).await?;
        if let Some(entries) = response.as_array() {
            for entry in entries {
                if let Some(error) = entry.get("error") {
                    return Err(SourceError::rejected(format!("batch entry failed: {}", error)));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MediaLibrary for KodiClient {
    async fn get_movies(&self) -> Result<Vec<Movie>, SourceError> {
        let result = self
            .call(
                "VideoLibrary.GetMovies",
                json!({"properties": MOVIE_PROPERTIES}),
            )
            .await?;
        let response: MoviesResponse =
            serde_json::from_value(result).map_err(|e| SourceError::decode(e.to_string()))?;
        if response.limits.total == 0 {
            debug!("library returned no movies");
            return Ok(Vec::new());
        }
        Ok(response
            .movies
            .into_iter()
            .map(convert::movie_from_record)
            .collect())
    }

    async fn get_shows(&self) -> Result<Vec<Show>, SourceError> {
        let result = self
            .call(
                "VideoLibrary.GetTVShows",
                json!({"properties": SHOW_PROPERTIES}),
            )
            .await?;
        let response: ShowsResponse =
            serde_json::from_value(result).map_err(|e| SourceError::decode(e.to_string()))?;
        if response.limits.total == 0 {
            debug!("library returned no shows");
            return Ok(Vec::new());
        }

        let mut shows = Vec::with_capacity(response.tvshows.len());
        for record in response.tvshows {
            let result = self
                .call(
                    "VideoLibrary.GetEpisodes",
                    json!({"tvshowid": record.tvshowid, "properties": EPISODE_PROPERTIES}),
                )
                .await?;
            let episodes: EpisodesResponse =
                serde_json::from_value(result).map_err(|e| SourceError::decode(e.to_string()))?;
            if episodes.episodes.is_empty() {
                debug!(title = %record.title, "show has no episodes in the library");
                continue;
            }
            shows.push(convert::show_from_records(record, episodes.episodes));
        }
        Ok(shows)
    }

    async fn set_show_ratings(&self, updates: &[ShowRatingUpdate]) -> Result<(), SourceError> {
        if updates.is_empty() {
            return Ok(());
        }
        let requests = updates
            .iter()
            .enumerate()
            .map(|(i, update)| {
                json!({
                    "jsonrpc": "2.0",
                    "id": i,
                    "method": "VideoLibrary.SetTVShowDetails",
                    "params": {"tvshowid": update.show_id, "userrating": update.rating},
                })
            })
            .collect();
        self.call_batch(requests).await
    }
}
