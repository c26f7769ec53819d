//! Core type definitions shared by the controller, the backends and the host

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::view::format::join_artists;

/// Which kind of entity a search targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SearchMode {
    #[default]
    Track,
    Artist,
    Album,
    Playlist,
    Show,
}

impl SearchMode {
    /// Singular lowercase name, as used in relay routes
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Playlist => "playlist",
            Self::Show => "show",
        }
    }

    /// Plural title shown in the placeholder frame
    pub fn title(self) -> &'static str {
        match self {
            Self::Track => "Tracks",
            Self::Artist => "Artists",
            Self::Album => "Albums",
            Self::Playlist => "Playlists",
            Self::Show => "Shows",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized search or browse result, identical in shape for every mode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub primary_text: String,
    #[serde(default)]
    pub secondary_text: String,
    pub uri: String,
    #[serde(default)]
    pub id: String,
}

/// A Spotify Connect playback device
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub title: String,
    #[serde(default, alias = "artists")]
    pub artist_names: Vec<String>,
}

impl NowPlaying {
    /// "Title by A and B", or just the title when no artist is known
    pub fn banner(&self) -> String {
        if self.artist_names.is_empty() {
            self.title.clone()
        } else {
            format!("{} by {}", self.title, join_artists(&self.artist_names))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub fn delta(self) -> isize {
        match self {
            Self::Next => 1,
            Self::Previous => -1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackAction {
    Next,
    Pause,
    Prev,
}

/// Everything a key binding can trigger
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Open,
    ShowDevices,
    Close,
    Search(SearchMode),
    SelectDevice(Direction),
    Play(String),
    Playback(PlaybackAction),
    Save,
    MoveCursor(Direction),
    Activate,
}
