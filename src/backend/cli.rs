//! `spt` subprocess backend
//!
//! spotify-tui keeps its own OAuth session, so this backend carries no
//! credential. Output is requested in `primary||secondary||uri` form through
//! `--format` and parsed line by line. spt addresses devices by name, which
//! is why a device's id here is its name.

use std::time::Duration;

use async_trait::async_trait;

use super::{BackendError, MusicBackend, id_from_uri, is_spotify_uri, with_timeout};
use crate::model::{Device, NowPlaying, ResultRow, SearchMode};

const BACKEND: &str = "cli";
const FIELD_SEPARATOR: &str = "||";
const STATUS_FORMAT: &str = "%s||%t||%a";
const PAUSED_ICON: &str = "⏸";

/// Runs an external program and returns its stdout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, BackendError>;
}

pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, BackendError> {
        let path = which::which(program)
            .map_err(|_| BackendError::Unavailable(format!("{program} not found in PATH")))?;

        let output = with_timeout(self.timeout, program, async {
            tokio::process::Command::new(&path)
                .args(args)
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| BackendError::Unavailable(format!("failed to run {program}: {e}")))
        })
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(stderr.trim()));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| BackendError::MalformedResponse(format!("{program} output: {e}")))
    }
}

/// Map spt's stderr on a non-zero exit.
fn classify_failure(stderr: &str) -> BackendError {
    let lower = stderr.to_lowercase();
    if lower.contains("not found") || lower.contains("no device") {
        BackendError::NotFound(stderr.to_string())
    } else if lower.contains("token") || lower.contains("unauthori") {
        BackendError::Unauthorized
    } else {
        BackendError::Unavailable(stderr.to_string())
    }
}

fn search_flag(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Track => "--tracks",
        SearchMode::Artist => "--artists",
        SearchMode::Album => "--albums",
        SearchMode::Playlist => "--playlists",
        SearchMode::Show => "--shows",
    }
}

fn search_format(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Track => "%t||%a||%u",
        SearchMode::Artist => "%a||||%u",
        SearchMode::Album => "%b||%a||%u",
        SearchMode::Playlist => "%p||||%u",
        SearchMode::Show => "%h||||%u",
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn non_blank_lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.lines().map(str::trim_end).filter(|line| !line.trim().is_empty())
}

pub(crate) fn parse_rows(stdout: &str) -> Result<Vec<ResultRow>, BackendError> {
    non_blank_lines(stdout)
        .map(|line| {
            let mut fields = line.splitn(3, FIELD_SEPARATOR);
            let (Some(primary), Some(secondary), Some(uri)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(BackendError::MalformedResponse(format!(
                    "expected primary||secondary||uri, got {line:?}"
                )));
            };
            let uri = uri.trim();
            Ok(ResultRow {
                primary_text: primary.trim().to_string(),
                secondary_text: secondary.trim().to_string(),
                uri: uri.to_string(),
                id: id_from_uri(uri).to_string(),
            })
        })
        .collect()
}

/// Parse `spt list --devices` output: one `<index> <name>` per line.
pub(crate) fn parse_devices(stdout: &str) -> Result<Vec<Device>, BackendError> {
    non_blank_lines(stdout)
        .map(|line| {
            let name = line
                .trim_start()
                .split_once(' ')
                .map(|(_, name)| name.trim())
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    BackendError::MalformedResponse(format!(
                        "expected <index> <name>, got {line:?}"
                    ))
                })?;
            Ok(Device {
                name: name.to_string(),
                id: name.to_string(),
                is_active: false,
            })
        })
        .collect()
}

/// Parse `spt playback --status --format "%s||%t||%a"`.
pub(crate) fn parse_status(stdout: &str) -> Result<Option<NowPlaying>, BackendError> {
    let Some(line) = non_blank_lines(stdout).next() else {
        return Ok(None);
    };
    let fields: Vec<&str> = line.splitn(3, FIELD_SEPARATOR).collect();
    let [status, title, artists] = fields.as_slice() else {
        return Err(BackendError::MalformedResponse(format!(
            "expected status||title||artists, got {line:?}"
        )));
    };

    if status.contains(PAUSED_ICON) || title.trim().is_empty() {
        return Ok(None);
    }

    // spt joins artists with ", ", which names like "Tyler, The Creator" also
    // contain, so the field stays whole
    let artists = artists.trim();
    Ok(Some(NowPlaying {
        title: title.trim().to_string(),
        artist_names: if artists.is_empty() {
            Vec::new()
        } else {
            vec![artists.to_string()]
        },
    }))
}

pub struct CliBackend<R = TokioCommandRunner> {
    program: String,
    runner: R,
}

impl<R: CommandRunner> CliBackend<R> {
    pub fn new(program: impl Into<String>, runner: R) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    async fn spt(&self, operation: &str, args: Vec<String>) -> Result<String, BackendError> {
        crate::log_backend_request!(BACKEND, operation, args = ?args);
        let result = self.runner.run(&self.program, &args).await;
        crate::log_backend_result!(BACKEND, operation, result);
        result
    }
}

#[async_trait]
impl<R: CommandRunner> MusicBackend for CliBackend<R> {
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
        let limit = limit.to_string();
        let stdout = self
            .spt(
                "search",
                args(&[
                    "search",
                    query,
                    search_flag(mode),
                    "--limit",
                    limit.as_str(),
                    "--format",
                    search_format(mode),
                ]),
            )
            .await?;
        parse_rows(&stdout)
    }

    async fn play(&self, uri: &str, device_id: Option<String>) -> Result<(), BackendError> {
        if !is_spotify_uri(uri) {
            return Err(BackendError::NotFound(format!("not a playable uri: {uri}")));
        }
        let mut argv = args(&["play", "-u", uri]);
        if let Some(device) = device_id {
            argv.push("-d".to_string());
            argv.push(device);
        }
        self.spt("play", argv).await.map(|_| ())
    }

    async fn skip(&self) -> Result<(), BackendError> {
        self.spt("skip", args(&["playback", "--next"])).await.map(|_| ())
    }

    async fn toggle_pause(&self) -> Result<(), BackendError> {
        self.spt("toggle_pause", args(&["playback", "--toggle"]))
            .await
            .map(|_| ())
    }

    async fn previous(&self) -> Result<(), BackendError> {
        self.spt("previous", args(&["playback", "--previous"]))
            .await
            .map(|_| ())
    }

    async fn like(&self) -> Result<(), BackendError> {
        self.spt("like", args(&["playback", "--like"])).await.map(|_| ())
    }

    async fn list_devices(&self) -> Result<Vec<Device>, BackendError> {
        let stdout = self.spt("list_devices", args(&["list", "--devices"])).await?;
        parse_devices(&stdout)
    }

    async fn currently_playing(&self) -> Result<Option<NowPlaying>, BackendError> {
        match self
            .spt(
                "currently_playing",
                args(&["playback", "--status", "--format", STATUS_FORMAT]),
            )
            .await
        {
            Ok(stdout) => parse_status(&stdout),
            // spt exits non-zero when there is no playback context at all
            Err(BackendError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubRunner {
        stdout: Result<String, BackendError>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl StubRunner {
        fn replying(stdout: &str) -> Self {
            Self {
                stdout: Ok(stdout.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: BackendError) -> Self {
            Self {
                stdout: Err(error),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for StubRunner {
        async fn run(&self, program: &str, args: &[String]) -> Result<String, BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));
            self.stdout.clone()
        }
    }

    fn last_args(backend: &CliBackend<StubRunner>) -> Vec<String> {
        let calls = backend.runner.calls.lock().unwrap();
        calls.last().map(|(_, args)| args.clone()).unwrap_or_default()
    }

    #[test]
    fn rows_skip_trailing_blank_lines() {
        let out = "One More Time||Daft Punk||spotify:track:0DiWol3AO6WpXZgp0goxAV\n\
                   Around the World||Daft Punk||spotify:track:1pKYYY0dkg23sQQXi0Q5zN\n\n   \n";
        let rows = parse_rows(out).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].primary_text, "One More Time");
        assert_eq!(rows[0].secondary_text, "Daft Punk");
        assert_eq!(rows[1].id, "1pKYYY0dkg23sQQXi0Q5zN");
    }

    #[test]
    fn artist_rows_have_empty_secondary() {
        let rows = parse_rows("Daft Punk||||spotify:artist:4tZwfgrHOc3mvqYlEYSvVi\n").unwrap();
        assert_eq!(rows[0].secondary_text, "");
        assert_eq!(rows[0].uri, "spotify:artist:4tZwfgrHOc3mvqYlEYSvVi");
    }

    #[test]
    fn short_rows_are_malformed() {
        assert!(matches!(
            parse_rows("just a title\n"),
            Err(BackendError::MalformedResponse(_))
        ));
    }

    #[test]
    fn devices_use_name_as_id() {
        let devices = parse_devices("0 Kitchen\n1 Office Speaker\n\n").unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].name, "Office Speaker");
        assert_eq!(devices[1].id, "Office Speaker");
        assert!(parse_devices("lonely\n").is_err());
    }

    #[test]
    fn status_parsing() {
        let now = parse_status("▶||Digital Love||Daft Punk, Romanthony\n")
            .unwrap()
            .unwrap();
        assert_eq!(now.title, "Digital Love");
        assert_eq!(now.banner(), "Digital Love by Daft Punk, Romanthony");

        let now = parse_status("▶||EARFQUAKE||Tyler, The Creator\n")
            .unwrap()
            .unwrap();
        assert_eq!(now.artist_names, vec!["Tyler, The Creator"]);
        assert_eq!(now.banner(), "EARFQUAKE by Tyler, The Creator");

        let bare = parse_status("▶||Episode 12||").unwrap().unwrap();
        assert!(bare.artist_names.is_empty());

        assert_eq!(parse_status("⏸||Digital Love||Daft Punk").unwrap(), None);
        assert_eq!(parse_status("\n").unwrap(), None);
    }

    #[test]
    fn failures_are_classified() {
        assert!(matches!(
            classify_failure("Error: no device available"),
            BackendError::NotFound(_)
        ));
        assert_eq!(classify_failure("invalid token"), BackendError::Unauthorized);
        assert!(matches!(
            classify_failure("network down"),
            BackendError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn search_builds_spt_invocation() {
        let backend = CliBackend::new(
            "spt",
            StubRunner::replying("Homework||Daft Punk||spotify:album:5uRdvUR7xCnHmUW8n64n9y\n"),
        );
        let rows = backend.search(SearchMode::Album, "homework", 20).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            last_args(&backend),
            vec!["search", "homework", "--albums", "--limit", "20", "--format", "%b||%a||%u"]
        );
    }

    #[tokio::test]
    async fn blank_search_spawns_nothing() {
        let backend = CliBackend::new("spt", StubRunner::replying(""));
        assert!(backend.search(SearchMode::Track, "  ", 20).await.unwrap().is_empty());
        assert!(backend.runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn play_passes_device_only_when_given() {
        let backend = CliBackend::new("spt", StubRunner::replying(""));

        backend.play("spotify:track:abc", None).await.unwrap();
        assert_eq!(last_args(&backend), vec!["play", "-u", "spotify:track:abc"]);

        backend
            .play("spotify:track:abc", Some("Kitchen".to_string()))
            .await
            .unwrap();
        assert_eq!(
            last_args(&backend),
            vec!["play", "-u", "spotify:track:abc", "-d", "Kitchen"]
        );
    }

    #[tokio::test]
    async fn play_rejects_non_uris() {
        let backend = CliBackend::new("spt", StubRunner::replying(""));
        let result = backend.play("One More Time", None).await;
        assert!(matches!(result, Err(BackendError::NotFound(_))));
        assert!(backend.runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_playback_means_nothing_playing() {
        let backend = CliBackend::new(
            "spt",
            StubRunner::failing(BackendError::NotFound("no context".to_string())),
        );
        assert_eq!(backend.currently_playing().await.unwrap(), None);
    }

    #[tokio::test]
    async fn browsing_is_unavailable() {
        let backend = CliBackend::new("spt", StubRunner::replying(""));
        assert!(matches!(
            backend.artist_albums("4tZwfgrHOc3mvqYlEYSvVi").await,
            Err(BackendError::Unavailable(_))
        ));
    }
}
