use async_trait::async_trait;
use couch_sync_config::TrackerConfig;
use couch_sync_models::{Movie, Show};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::api;
use crate::error::SourceError;
use crate::payload::{HistoryPayload, RatingsPayload};
use crate::traits::Tracker;

/// REST client for a Trakt-style tracking service. Authentication is a
/// pre-issued bearer token from the config; no OAuth flow lives here.
pub struct TraktClient {
    http: Client,
    api_url: String,
    client_id: String,
    access_token: String,
}

impl TraktClient {
    pub fn new(api_url: String, client_id: String, access_token: String) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            client_id,
            access_token,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(
            config.api_url.clone(),
            config.client_id.clone(),
            config.access_token.clone(),
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.api_url, path))
            .bearer_auth(&self.access_token)
            .header("trakt-api-version", "2")
            .header("trakt-api-key", &self.client_id)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        debug!(path, "tracker request");
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await?
            .error_for_status()?;
        response
            .json()
            .await
            .map_err(|e| SourceError::decode(format!("{}: {}", path, e)))
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), SourceError> {
        debug!(path, "tracker write");
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::rejected(format!("{}: {} {}", path, status, text)));
        }
        Ok(())
    }
}

#[async_trait]
impl Tracker for TraktClient {
    async fn get_movies_watched(&self) -> Result<Vec<Movie>, SourceError> {
        let items: Vec<api::WatchedMovieItem> = self.get_json("sync/watched/movies").await?;
        Ok(items.into_iter().map(api::watched_movie).collect())
    }

    async fn get_movies_rated(&self) -> Result<Vec<Movie>, SourceError> {
        let items: Vec<api::RatedMovieItem> = self.get_json("sync/ratings/movies").await?;
        Ok(items.into_iter().map(api::rated_movie).collect())
    }

    async fn get_shows_watched(&self) -> Result<Vec<Show>, SourceError> {
        let items: Vec<api::WatchedShowItem> = self.get_json("sync/watched/shows").await?;
        Ok(items.into_iter().map(api::watched_show).collect())
    }

    async fn get_shows_rated(&self) -> Result<Vec<Show>, SourceError> {
        let items: Vec<api::RatedShowItem> = self.get_json("sync/ratings/shows").await?;
        Ok(items.into_iter().map(api::rated_show).collect())
    }

    async fn get_episodes_rated(&self) -> Result<Vec<Show>, SourceError> {
        let items: Vec<api::RatedEpisodeItem> = self.get_json("sync/ratings/episodes").await?;
        Ok(api::rated_episodes(items))
    }

    async fn add_to_history(&self, payload: &HistoryPayload) -> Result<(), SourceError> {
        self.post_json("sync/history", payload).await
    }

    async fn add_ratings(&self, payload: &RatingsPayload) -> Result<(), SourceError> {
        self.post_json("sync/ratings", payload).await
    }
}
