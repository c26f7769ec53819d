//! Terminal surface host
//!
//! Keeps every surface in memory and lets `view` draw them with ratatui.
//! Key presses are resolved against the focused surface's bindings first;
//! whatever is left edits the input line in insert mode. With no surface
//! focused a couple of global keys open the session or quit.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use super::{
    Geometry, KeyMode, NotifyLevel, OptionValue, SurfaceError, SurfaceHost, SurfaceId,
    splice_region,
};
use crate::model::Command;

const STATUS_TTL_SECS: u64 = 5;
/// Guards against anchor cycles when resolving positions
const MAX_ANCHOR_DEPTH: u8 = 8;

/// What a key press turned into
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Command(Command),
    Quit,
}

#[derive(Clone, Copy, Debug)]
struct Placement {
    anchor: Option<SurfaceId>,
    geometry: Geometry,
}

#[derive(Debug, Default)]
struct Surface {
    lines: Vec<String>,
    options: HashMap<String, OptionValue>,
    placement: Option<Placement>,
    keymaps: HashMap<(KeyMode, String), Command>,
    on_leave: Option<Command>,
}

impl Surface {
    fn modifiable(&self) -> bool {
        !matches!(self.options.get("modifiable"), Some(OptionValue::Bool(false)))
    }
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub level: NotifyLevel,
    pub text: String,
    at: Instant,
}

/// A surface resolved to screen coordinates, ready to draw
#[derive(Debug)]
pub struct PlacedSurface<'a> {
    pub id: SurfaceId,
    pub area: Rect,
    pub lines: &'a [String],
    pub style_group: Option<&'a str>,
    pub selected_row: Option<usize>,
    pub z_index: u16,
}

pub struct TerminalHost {
    surfaces: BTreeMap<SurfaceId, Surface>,
    next_id: u64,
    focus: Option<SurfaceId>,
    mode: KeyMode,
    highlights: HashMap<String, Style>,
    status: Option<StatusMessage>,
    pending: VecDeque<Command>,
    screen: (u16, u16),
}

/// Vim-style notation for a key press: `q`, `<CR>`, `<C-T>`, `<S-Tab>`.
pub fn key_notation(key: &KeyEvent) -> Option<String> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let notation = match key.code {
        KeyCode::Char(' ') if ctrl => "<C-Space>".to_string(),
        KeyCode::Char(c) if ctrl => format!("<C-{}>", c.to_ascii_uppercase()),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "<CR>".to_string(),
        KeyCode::Esc => "<Esc>".to_string(),
        KeyCode::Tab => "<Tab>".to_string(),
        KeyCode::BackTab => "<S-Tab>".to_string(),
        KeyCode::Backspace => "<BS>".to_string(),
        KeyCode::Up => "<Up>".to_string(),
        KeyCode::Down => "<Down>".to_string(),
        KeyCode::Left => "<Left>".to_string(),
        KeyCode::Right => "<Right>".to_string(),
        _ => return None,
    };
    Some(notation)
}

fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Parse `hi Group guifg=#rrggbb guibg=#rrggbb`.
pub fn parse_highlight(command: &str) -> Option<(String, Style)> {
    let mut words = command.split_whitespace();
    if !matches!(words.next(), Some("hi" | "highlight")) {
        return None;
    }
    let group = words.next()?.to_string();

    let mut style = Style::default();
    for attribute in words {
        match attribute.split_once('=') {
            Some(("guifg", value)) => style = style.fg(parse_hex(value)?),
            Some(("guibg", value)) => style = style.bg(parse_hex(value)?),
            _ => tracing::debug!(attribute, "Ignoring highlight attribute"),
        }
    }
    Some((group, style))
}

impl TerminalHost {
    pub fn new(screen: (u16, u16)) -> Self {
        Self {
            surfaces: BTreeMap::new(),
            next_id: 0,
            focus: None,
            mode: KeyMode::Normal,
            highlights: HashMap::new(),
            status: None,
            pending: VecDeque::new(),
            screen,
        }
    }

    pub fn set_screen_size(&mut self, cols: u16, rows: u16) {
        self.screen = (cols, rows);
    }

    pub fn has_surfaces(&self) -> bool {
        !self.surfaces.is_empty()
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn highlight(&self, group: &str) -> Style {
        self.highlights.get(group).copied().unwrap_or_default()
    }

    /// Commands queued by focus changes, in the order they happened
    pub fn take_pending(&mut self) -> Option<Command> {
        self.pending.pop_front()
    }

    pub fn auto_clear_status(&mut self) {
        if self
            .status
            .as_ref()
            .is_some_and(|s| s.at.elapsed().as_secs() > STATUS_TTL_SECS)
        {
            self.status = None;
        }
    }

    /// Resolve a key press to a bound command, a local edit, or a global key.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<HostEvent> {
        let notation = key_notation(&key)?;
        let mode = self.mode;

        let Some(surface) = self.focus.and_then(|id| self.surfaces.get_mut(&id)) else {
            return match notation.as_str() {
                "s" => Some(HostEvent::Command(Command::Open)),
                "q" | "<Esc>" => Some(HostEvent::Quit),
                _ => None,
            };
        };

        if let Some(command) = surface.keymaps.get(&(mode, notation)) {
            return Some(HostEvent::Command(command.clone()));
        }

        match (mode, key.code) {
            (KeyMode::Insert, KeyCode::Esc) => self.mode = KeyMode::Normal,
            (KeyMode::Insert, KeyCode::Backspace) if surface.modifiable() => {
                if let Some(line) = surface.lines.first_mut() {
                    line.pop();
                }
            }
            (KeyMode::Insert, KeyCode::Char(c))
                if surface.modifiable() && !key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                match surface.lines.first_mut() {
                    Some(line) => line.push(c),
                    None => surface.lines.push(c.to_string()),
                }
            }
            (KeyMode::Normal, KeyCode::Char('i' | 'a')) => self.mode = KeyMode::Insert,
            _ => {}
        }
        None
    }

    fn origin(&self, id: SurfaceId, depth: u8) -> Option<(i32, i32)> {
        let placement = self.surfaces.get(&id)?.placement?;
        let (row, col) = match placement.anchor {
            Some(anchor) if depth < MAX_ANCHOR_DEPTH => self.origin(anchor, depth + 1)?,
            Some(_) => return None,
            None => (0, 0),
        };
        Some((row + placement.geometry.row, col + placement.geometry.col))
    }

    /// Placed surfaces in drawing order (lowest z first)
    pub fn placed_surfaces(&self) -> Vec<PlacedSurface<'_>> {
        let mut placed: Vec<_> = self
            .surfaces
            .iter()
            .filter_map(|(id, surface)| {
                let geometry = surface.placement?.geometry;
                let (row, col) = self.origin(*id, 0)?;
                let style_group = match surface.options.get("winhl") {
                    Some(OptionValue::Str(value)) => value.split_once(':').map(|(_, group)| group),
                    _ => None,
                };
                let selected_row = match surface.options.get("selection") {
                    Some(OptionValue::Int(row)) if *row >= 0 => Some(*row as usize),
                    _ => None,
                };
                Some(PlacedSurface {
                    id: *id,
                    area: Rect::new(
                        col.max(0) as u16,
                        row.max(0) as u16,
                        geometry.width,
                        geometry.height,
                    ),
                    lines: &surface.lines,
                    style_group,
                    selected_row,
                    z_index: geometry.z_index,
                })
            })
            .collect();
        placed.sort_by_key(|surface| (surface.z_index, surface.id));
        placed
    }

    /// Where the terminal cursor belongs while typing
    pub fn cursor_position(&self) -> Option<(u16, u16)> {
        if self.mode != KeyMode::Insert {
            return None;
        }
        let id = self.focus?;
        let (row, col) = self.origin(id, 0)?;
        let typed = self
            .surfaces
            .get(&id)?
            .lines
            .first()
            .map_or(0, |line| line.chars().count());
        Some(((col.max(0) as usize + typed) as u16, row.max(0) as u16))
    }

    fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut Surface, SurfaceError> {
        self.surfaces.get_mut(&id).ok_or(SurfaceError::NotFound(id))
    }

    fn focus(&mut self, id: SurfaceId) {
        if let Some(previous) = self.focus.filter(|previous| *previous != id) {
            if let Some(command) = self.surfaces.get(&previous).and_then(|s| s.on_leave.clone()) {
                self.pending.push_back(command);
            }
        }
        self.focus = Some(id);
    }
}

impl SurfaceHost for TerminalHost {
    fn create_surface(&mut self) -> Result<SurfaceId, SurfaceError> {
        self.next_id += 1;
        let id = SurfaceId(self.next_id);
        self.surfaces.insert(id, Surface::default());
        Ok(id)
    }

    fn destroy_surface(&mut self, id: SurfaceId) -> Result<(), SurfaceError> {
        self.surfaces.remove(&id).ok_or(SurfaceError::NotFound(id))?;
        if self.focus == Some(id) {
            self.focus = None;
            self.mode = KeyMode::Normal;
        }
        Ok(())
    }

    fn write_lines(&mut self, id: SurfaceId, lines: &[String]) -> Result<(), SurfaceError> {
        self.surface_mut(id)?.lines = lines.to_vec();
        Ok(())
    }

    fn write_region(
        &mut self,
        id: SurfaceId,
        row: usize,
        col_start: usize,
        col_end: usize,
        text: &str,
    ) -> Result<(), SurfaceError> {
        splice_region(&mut self.surface_mut(id)?.lines, row, col_start, col_end, text);
        Ok(())
    }

    fn set_option(
        &mut self,
        id: SurfaceId,
        key: &str,
        value: OptionValue,
    ) -> Result<(), SurfaceError> {
        self.surface_mut(id)?.options.insert(key.to_string(), value);
        Ok(())
    }

    fn open_floating(
        &mut self,
        id: SurfaceId,
        anchor: Option<SurfaceId>,
        geometry: Geometry,
    ) -> Result<(), SurfaceError> {
        if let Some(anchor) = anchor.filter(|a| !self.surfaces.contains_key(a)) {
            return Err(SurfaceError::NotFound(anchor));
        }
        self.surface_mut(id)?.placement = Some(Placement { anchor, geometry });
        if geometry.enter && geometry.focusable {
            self.focus(id);
        }
        Ok(())
    }

    fn bind_key(
        &mut self,
        id: SurfaceId,
        mode: KeyMode,
        key: &str,
        command: Command,
    ) -> Result<(), SurfaceError> {
        self.surface_mut(id)?
            .keymaps
            .insert((mode, key.to_string()), command);
        Ok(())
    }

    fn bind_leave(&mut self, id: SurfaceId, command: Command) -> Result<(), SurfaceError> {
        self.surface_mut(id)?.on_leave = Some(command);
        Ok(())
    }

    fn read_line(&self, id: SurfaceId, row: usize) -> Result<String, SurfaceError> {
        let surface = self.surfaces.get(&id).ok_or(SurfaceError::NotFound(id))?;
        Ok(surface.lines.get(row).cloned().unwrap_or_default())
    }

    fn run_host_command(&mut self, command: &str) -> Result<(), SurfaceError> {
        match command.trim() {
            "startinsert" | "startinsert!" => self.mode = KeyMode::Insert,
            "stopinsert" | "stopinsert!" => self.mode = KeyMode::Normal,
            other => match parse_highlight(other) {
                Some((group, style)) => {
                    self.highlights.insert(group, style);
                }
                None => tracing::debug!(command = other, "Ignoring unsupported host command"),
            },
        }
        Ok(())
    }

    fn screen_size(&self) -> (u16, u16) {
        self.screen
    }

    fn notify(&mut self, level: NotifyLevel, message: &str) {
        self.status = Some(StatusMessage {
            level,
            text: message.to_string(),
            at: Instant::now(),
        });
    }
}
