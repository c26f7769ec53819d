//! Surface host capability
//!
//! The controller never draws anything itself. It creates, fills, positions
//! and destroys floating text surfaces through [`SurfaceHost`], and binds keys
//! on them to [`Command`]s that the host hands back when pressed.
//!
//! - `terminal`: ratatui-backed host used by the binary

mod terminal;

use std::fmt;

use thiserror::Error;

use crate::model::Command;

pub use terminal::{HostEvent, PlacedSurface, StatusMessage, TerminalHost};

/// Opaque handle issued by the host when a surface is created
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("could not create surface: {0}")]
    CreationFailed(String),
    #[error("surface {0} does not exist")]
    NotFound(SurfaceId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyMode {
    Normal,
    Insert,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

/// Placement of a floating surface.
///
/// `row` and `col` are offsets from the anchor surface when one is given,
/// otherwise from the top-left corner of the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub row: i32,
    pub col: i32,
    pub width: u16,
    pub height: u16,
    pub z_index: u16,
    pub focusable: bool,
    /// Move focus into the surface once it is shown
    pub enter: bool,
}

pub trait SurfaceHost {
    fn create_surface(&mut self) -> Result<SurfaceId, SurfaceError>;
    fn destroy_surface(&mut self, id: SurfaceId) -> Result<(), SurfaceError>;
    fn write_lines(&mut self, id: SurfaceId, lines: &[String]) -> Result<(), SurfaceError>;
    /// Replace codepoint columns `col_start..col_end` of one line.
    fn write_region(
        &mut self,
        id: SurfaceId,
        row: usize,
        col_start: usize,
        col_end: usize,
        text: &str,
    ) -> Result<(), SurfaceError>;
    fn set_option(&mut self, id: SurfaceId, key: &str, value: OptionValue)
    -> Result<(), SurfaceError>;
    fn open_floating(
        &mut self,
        id: SurfaceId,
        anchor: Option<SurfaceId>,
        geometry: Geometry,
    ) -> Result<(), SurfaceError>;
    fn bind_key(
        &mut self,
        id: SurfaceId,
        mode: KeyMode,
        key: &str,
        command: Command,
    ) -> Result<(), SurfaceError>;
    /// Emit `command` when focus leaves the surface.
    fn bind_leave(&mut self, id: SurfaceId, command: Command) -> Result<(), SurfaceError>;
    fn read_line(&self, id: SurfaceId, row: usize) -> Result<String, SurfaceError>;
    fn run_host_command(&mut self, command: &str) -> Result<(), SurfaceError>;
    /// (columns, rows)
    fn screen_size(&self) -> (u16, u16);
    fn notify(&mut self, level: NotifyLevel, message: &str);
}

/// Write `text` over codepoint columns `col_start..col_end` of `lines[row]`,
/// growing the buffer with blanks when it is too short.
pub(crate) fn splice_region(
    lines: &mut Vec<String>,
    row: usize,
    col_start: usize,
    col_end: usize,
    text: &str,
) {
    if col_start > col_end {
        return;
    }
    if lines.len() <= row {
        lines.resize(row + 1, String::new());
    }
    let mut chars: Vec<char> = lines[row].chars().collect();
    if chars.len() < col_end {
        chars.resize(col_end, ' ');
    }
    chars.splice(col_start..col_end, text.chars());
    lines[row] = chars.into_iter().collect();
}
