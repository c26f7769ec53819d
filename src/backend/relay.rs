//! HTTP relay backend
//!
//! The relay holds the OAuth session and exposes simplified GET routes that
//! already return normalized rows. Every request carries the user's refresh
//! token in the `refresh_token` header.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::{BackendError, MusicBackend, is_spotify_uri};
use crate::model::{Device, NowPlaying, ResultRow, SearchMode};

const BACKEND: &str = "relay";
const REFRESH_TOKEN_HEADER: &str = "refresh_token";

pub struct RelayBackend {
    client: Client,
    base_url: String,
    refresh_token: String,
}

/// Join `base` and percent-encoded path segments.
pub(crate) fn route_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments {
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }
    url
}

pub(crate) fn check_status(status: StatusCode) -> Result<(), BackendError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Unauthorized),
        StatusCode::NOT_FOUND => Err(BackendError::NotFound(format!("relay returned {status}"))),
        _ => Err(BackendError::Unavailable(format!("relay returned {status}"))),
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::MalformedResponse(e.to_string()))
}

/// An empty body, a literal `null` or a 204 all mean nothing is playing.
pub(crate) fn decode_now_playing(
    status: StatusCode,
    body: &str,
) -> Result<Option<NowPlaying>, BackendError> {
    if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
        return Ok(None);
    }
    decode_body(body)
}

fn transport_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Unavailable("relay request timed out".to_string())
    } else {
        BackendError::Unavailable(error.to_string())
    }
}

impl RelayBackend {
    pub fn new(
        base_url: impl Into<String>,
        refresh_token: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build relay HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            refresh_token: refresh_token.into(),
        })
    }

    /// GET a route and return the status and body once the status is accepted.
    async fn get(
        &self,
        operation: &str,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<(StatusCode, String), BackendError> {
        let url = route_url(&self.base_url, segments);
        crate::log_backend_request!(BACKEND, operation, url = %url);

        let result = async {
            let response = self
                .client
                .get(&url)
                .header(REFRESH_TOKEN_HEADER, &self.refresh_token)
                .query(query)
                .send()
                .await
                .map_err(transport_error)?;

            let status = response.status();
            check_status(status)?;
            let body = response.text().await.map_err(transport_error)?;
            Ok::<_, BackendError>((status, body))
        }
        .await;
        crate::log_backend_result!(BACKEND, operation, result);
        result
    }
}

#[async_trait]
impl MusicBackend for RelayBackend {
    async fn search(
        &self,
        mode: SearchMode,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ResultRow>, BackendError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let (_, body) = self
            .get(
                "search",
                &["search", mode.as_str(), query],
                &[("limit", limit.to_string())],
            )
            .await?;
        decode_body(&body)
    }

    async fn play(&self, uri: &str, device_id: Option<String>) -> Result<(), BackendError> {
        if !is_spotify_uri(uri) {
            return Err(BackendError::NotFound(format!("not a playable uri: {uri}")));
        }
        let mut segments = vec!["play", uri];
        if let Some(device) = device_id.as_deref() {
            segments.push(device);
        }
        self.get("play", &segments, &[]).await.map(|_| ())
    }

    async fn skip(&self) -> Result<(), BackendError> {
        self.get("skip", &["skip"], &[]).await.map(|_| ())
    }

    async fn toggle_pause(&self) -> Result<(), BackendError> {
        self.get("toggle_pause", &["pause"], &[]).await.map(|_| ())
    }

    async fn previous(&self) -> Result<(), BackendError> {
        self.get("previous", &["previous"], &[]).await.map(|_| ())
    }

    async fn like(&self) -> Result<(), BackendError> {
        self.get("like", &["save"], &[]).await.map(|_| ())
    }

    async fn list_devices(&self) -> Result<Vec<Device>, BackendError> {
        let (_, body) = self.get("list_devices", &["devices"], &[]).await?;
        decode_body(&body)
    }

    async fn currently_playing(&self) -> Result<Option<NowPlaying>, BackendError> {
        let (status, body) = self
            .get("currently_playing", &["currently-playing"], &[])
            .await?;
        decode_now_playing(status, &body)
    }
}
