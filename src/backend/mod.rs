//! Music backends
//!
//! The controller talks to Spotify through a single [`MusicBackend`] trait
//! object chosen at startup:
//!
//! - `api`: Spotify Web API through rspotify, using a locally held token
//! - `cli`: the `spt` (spotify-tui) binary, parsing its delimited output
//! - `relay`: a small HTTP relay that owns the OAuth session

mod api;
mod cli;
mod relay;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Device, NowPlaying, ResultRow, SearchMode};

pub use api::ApiBackend;
pub use cli::{CliBackend, TokioCommandRunner};
pub use relay::RelayBackend;

/// Default number of rows requested per search
pub const SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("not authorized with Spotify")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("Spotify unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MusicBackend: Send + Sync {
    /// Search for `query`. A blank query yields no rows and makes no call.
    async fn search(
        &self,
        mode: SearchMode,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ResultRow>, BackendError>;

    /// Start playing `uri`, on `device_id` when given, otherwise wherever
    /// the service decides.
    async fn play(&self, uri: &str, device_id: Option<String>) -> Result<(), BackendError>;

    async fn skip(&self) -> Result<(), BackendError>;
    async fn toggle_pause(&self) -> Result<(), BackendError>;
    async fn previous(&self) -> Result<(), BackendError>;

    /// Save the current track to the user's library
    async fn like(&self) -> Result<(), BackendError>;

    async fn list_devices(&self) -> Result<Vec<Device>, BackendError>;

    /// `None` when nothing is playing or playback is paused
    async fn currently_playing(&self) -> Result<Option<NowPlaying>, BackendError>;

    async fn artist_albums(&self, _artist_id: &str) -> Result<Vec<ResultRow>, BackendError> {
        Err(BackendError::Unavailable(
            "this backend cannot browse artists".to_string(),
        ))
    }

    async fn album_tracks(&self, _album_id: &str) -> Result<Vec<ResultRow>, BackendError> {
        Err(BackendError::Unavailable(
            "this backend cannot browse albums".to_string(),
        ))
    }

    async fn playlist_tracks(&self, _playlist_id: &str) -> Result<Vec<ResultRow>, BackendError> {
        Err(BackendError::Unavailable(
            "this backend cannot browse playlists".to_string(),
        ))
    }
}

/// Run `operation`, failing with `Unavailable` once `limit` has elapsed.
pub(crate) async fn with_timeout<T, F>(
    limit: Duration,
    operation: &str,
    future: F,
) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Unavailable(format!(
            "{operation} timed out after {}s",
            limit.as_secs()
        ))),
    }
}

/// Last `:`-separated segment of a Spotify URI
pub(crate) fn id_from_uri(uri: &str) -> &str {
    uri.rsplit(':').next().unwrap_or(uri)
}

/// Shape check for `spotify:<kind>:<id>`
pub(crate) fn is_spotify_uri(uri: &str) -> bool {
    let parts: Vec<&str> = uri.split(':').collect();
    matches!(parts.as_slice(), ["spotify", kind, id] if !kind.is_empty() && !id.is_empty())
}

/// Map an error message carrying an HTTP status to a backend error.
pub(crate) fn classify_message(message: &str) -> BackendError {
    if message.contains("401") || message.contains("403") {
        BackendError::Unauthorized
    } else if message.contains("404") {
        BackendError::NotFound(message.to_string())
    } else {
        BackendError::Unavailable(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_helpers() {
        assert_eq!(id_from_uri("spotify:track:0DiWol3AO6WpXZgp0goxAV"), "0DiWol3AO6WpXZgp0goxAV");
        assert_eq!(id_from_uri("plain"), "plain");
        assert!(is_spotify_uri("spotify:album:2noRn2Aes5aoNVsU6iWThc"));
        assert!(!is_spotify_uri("spotify:album:"));
        assert!(!is_spotify_uri("https://open.spotify.com/track/x"));
    }

    #[test]
    fn status_messages_are_classified() {
        assert_eq!(
            classify_message("http error: status code 401 Unauthorized"),
            BackendError::Unauthorized
        );
        assert_eq!(classify_message("status code 403 Forbidden"), BackendError::Unauthorized);
        assert!(matches!(classify_message("status code 404 Not Found"), BackendError::NotFound(_)));
        assert!(matches!(classify_message("connection reset"), BackendError::Unavailable(_)));
    }

    #[tokio::test]
    async fn slow_calls_become_unavailable() {
        let result: Result<(), _> = with_timeout(Duration::from_millis(10), "search", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(BackendError::Unavailable(msg)) if msg.contains("search")));
    }
}
