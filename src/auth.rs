use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rspotify::Token;
use serde::Deserialize;

use crate::config::{BackendKind, Config};

const DEFAULT_EXPIRY_SECS: i64 = 3600;

/// Token cache written by spotify-tui
#[derive(Debug, Deserialize)]
struct CachedToken {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix seconds
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: String,
}

impl From<CachedToken> for Token {
    fn from(cached: CachedToken) -> Self {
        Token {
            access_token: cached.access_token,
            expires_in: chrono::Duration::seconds(cached.expires_in.unwrap_or(DEFAULT_EXPIRY_SECS)),
            expires_at: cached
                .expires_at
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            refresh_token: cached.refresh_token,
            scopes: cached
                .scope
                .split_whitespace()
                .map(|s| s.to_string())
                .collect::<HashSet<String>>(),
        }
    }
}

/// What a backend needs to reach Spotify
#[derive(Debug, Clone)]
pub enum BackendCredential {
    /// Access token for the Web API client
    OAuth(Token),
    /// Refresh token sent to the relay with every request
    Relay(String),
    /// The backend manages its own session
    Delegated,
}

pub fn read_token_cache(path: &Path) -> Result<Token> {
    let contents = fs::read_to_string(path)
        .context(format!("Failed to read token cache: {}", path.display()))?;
    let cached: CachedToken = serde_json::from_str(&contents)
        .context(format!("Failed to parse token cache: {}", path.display()))?;
    let token = Token::from(cached);

    if token.is_expired() {
        tracing::warn!(
            expires_at = ?token.expires_at,
            "Cached access token has expired, refresh it with spotify-tui"
        );
    }
    Ok(token)
}

pub fn load_credential(config: &Config) -> Result<BackendCredential> {
    match config.backend {
        BackendKind::Api => {
            let token = read_token_cache(&config.token_cache)?;
            tracing::info!(cache = %config.token_cache.display(), "Loaded cached Spotify token");
            Ok(BackendCredential::OAuth(token))
        }
        BackendKind::Relay => config
            .refresh_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .map(BackendCredential::Relay)
            .ok_or_else(|| {
                anyhow!(
                    "The relay backend needs a refresh token \
                     (--refresh-token or SPOTIFY_REFRESH_TOKEN)"
                )
            }),
        BackendKind::Cli => Ok(BackendCredential::Delegated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::config::{Args, FileConfig};

    fn config_for(args: &[&str]) -> Config {
        let mut argv = vec!["nvim-spotify"];
        argv.extend_from_slice(args);
        Config::merge(Args::parse_from(argv), FileConfig::default())
    }

    #[test]
    fn cached_token_converts() {
        let cached: CachedToken = serde_json::from_str(
            r#"{
                "access_token": "BQD-access",
                "token_type": "Bearer",
                "expires_in": 3600,
                "expires_at": 4102444800,
                "refresh_token": "AQB-refresh",
                "scope": "user-read-playback-state user-modify-playback-state"
            }"#,
        )
        .unwrap();
        let token = Token::from(cached);

        assert_eq!(token.access_token, "BQD-access");
        assert_eq!(token.refresh_token.as_deref(), Some("AQB-refresh"));
        assert_eq!(token.scopes.len(), 2);
        assert!(token.scopes.contains("user-modify-playback-state"));
        assert!(!token.is_expired());
    }

    #[test]
    fn cache_file_is_read() {
        let path = std::env::temp_dir()
            .join(format!("nvim-spotify-token-{}.json", std::process::id()));
        fs::write(&path, r#"{"access_token": "BQD-file", "scope": ""}"#).unwrap();

        let token = read_token_cache(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(token.access_token, "BQD-file");
        assert!(token.scopes.is_empty());
    }

    #[test]
    fn missing_cache_is_an_error() {
        let config = config_for(&["--token-cache", "/nonexistent/nvim-spotify/token.json"]);
        let err = load_credential(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to read token cache"));
    }

    #[test]
    fn relay_requires_a_refresh_token() {
        let config = config_for(&["--backend", "relay", "--refresh-token", "  "]);
        assert!(load_credential(&config).is_err());

        let config = config_for(&["--backend", "relay", "--refresh-token", "AQB-relay"]);
        match load_credential(&config).unwrap() {
            BackendCredential::Relay(token) => assert_eq!(token, "AQB-relay"),
            other => panic!("unexpected credential {other:?}"),
        }
    }

    #[test]
    fn cli_needs_nothing() {
        let config = config_for(&["--backend", "cli"]);
        assert!(matches!(load_credential(&config).unwrap(), BackendCredential::Delegated));
    }
}
