//! Command-line arguments and the optional TOML config file
//!
//! Arguments (and their environment variables) win over the file, the file
//! wins over built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_CLI_BINARY: &str = "spt";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const TOKEN_CACHE: &str = ".config/spotify-tui/.spotify_token_cache.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Spotify Web API with the spotify-tui token cache
    #[default]
    Api,
    /// The `spt` command-line client
    Cli,
    /// An HTTP relay holding the OAuth session
    Relay,
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "nvim-spotify",
    version,
    about = "Search and control Spotify from floating terminal windows"
)]
pub struct Args {
    /// Backend used to reach Spotify
    #[arg(short, long, value_enum, env = "NVIM_SPOTIFY_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Path to the config file
    #[arg(short, long, env = "NVIM_SPOTIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the relay
    #[arg(long, env = "NVIM_SPOTIFY_RELAY_URL")]
    pub relay_url: Option<String>,

    /// Refresh token sent to the relay
    #[arg(long, env = "SPOTIFY_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// spotify-tui binary name or path
    #[arg(long)]
    pub cli_binary: Option<String>,

    /// spotify-tui token cache read by the api backend
    #[arg(long)]
    pub token_cache: Option<PathBuf>,

    /// Per-call timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    backend: Option<BackendKind>,
    relay_url: Option<String>,
    refresh_token: Option<String>,
    cli_binary: Option<String>,
    token_cache: Option<String>,
    timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub relay_url: String,
    pub refresh_token: Option<String>,
    pub cli_binary: String,
    pub token_cache: PathBuf,
    pub timeout: Duration,
}

/// Expand a leading `~/` to the home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("nvim-spotify").join("config.toml"))
    }

    fn default_token_cache() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(TOKEN_CACHE))
            .unwrap_or_else(|| PathBuf::from(TOKEN_CACHE))
    }

    /// Merge arguments with the config file. An explicitly named file must
    /// exist; the default location is optional.
    pub fn load(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::from_file(path)?,
            None => match Self::config_path().filter(|path| path.exists()) {
                Some(path) => FileConfig::from_file(&path)?,
                None => FileConfig::default(),
            },
        };
        Ok(Self::merge(args, file))
    }

    pub fn merge(args: Args, file: FileConfig) -> Self {
        Self {
            backend: args.backend.or(file.backend).unwrap_or_default(),
            relay_url: args
                .relay_url
                .or(file.relay_url)
                .unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
            refresh_token: args.refresh_token.or(file.refresh_token),
            cli_binary: args
                .cli_binary
                .or(file.cli_binary)
                .unwrap_or_else(|| DEFAULT_CLI_BINARY.to_string()),
            token_cache: args
                .token_cache
                .or_else(|| file.token_cache.as_deref().map(expand_path))
                .unwrap_or_else(Self::default_token_cache),
            timeout: Duration::from_secs(
                args.timeout_secs
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::merge(Args::default(), FileConfig::default());
        assert_eq!(config.backend, BackendKind::Api);
        assert_eq!(config.relay_url, "http://127.0.0.1:3000");
        assert_eq!(config.cli_binary, "spt");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.refresh_token, None);
        assert!(config.token_cache.ends_with(".spotify_token_cache.json"));
    }

    #[test]
    fn file_values_are_used() {
        let file: FileConfig = toml::from_str(
            r#"
            backend = "relay"
            relay_url = "https://relay.example.com"
            refresh_token = "AQB-abc"
            timeout_secs = 3
            "#,
        )
        .unwrap();
        let config = Config::merge(Args::default(), file);
        assert_eq!(config.backend, BackendKind::Relay);
        assert_eq!(config.relay_url, "https://relay.example.com");
        assert_eq!(config.refresh_token.as_deref(), Some("AQB-abc"));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn arguments_override_the_file() {
        let file: FileConfig =
            toml::from_str("backend = \"relay\"\ncli_binary = \"/opt/spt\"").unwrap();
        let args = Args::parse_from(["nvim-spotify", "--backend", "cli", "--timeout-secs", "30"]);
        let config = Config::merge(args, file);
        assert_eq!(config.backend, BackendKind::Cli);
        assert_eq!(config.cli_binary, "/opt/spt");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn tilde_paths_expand() {
        let file: FileConfig = toml::from_str("token_cache = \"~/tokens/cache.json\"").unwrap();
        let config = Config::merge(Args::default(), file);
        assert!(config.token_cache.ends_with("tokens/cache.json"));
        assert!(!config.token_cache.starts_with("~"));
    }
}
