//! Surface lifecycle: opening and closing a session, and laying out its frames
//!
//! Every frame hangs off a 1x1 anchor centred on the screen. The placeholder
//! sits on the anchor, the now-playing banner above it, and the device list
//! and results stack below it.

use crate::host::{Geometry, KeyMode, OptionValue, SurfaceError, SurfaceHost, SurfaceId};
use crate::model::{
    Command, Direction, NowPlaying, PlaybackAction, SearchMode, Session, SurfaceKind,
};
use crate::view::frames::{self, HEIGHT, MARKER, MARKER_COLUMN, NO_MARKER, WIDTH};

use super::{SessionController, SessionError};

const FRAME_Z: u16 = 50;
const INPUT_Z: u16 = 51;
const FRAME_COL: i32 = -2;
const NOW_PLAYING_ROW: i32 = -3;
const LIST_ROW: i32 = 3;
const INPUT_ROW: i32 = 1;
const INPUT_COL: i32 = 3;

fn anchor_geometry((cols, rows): (u16, u16)) -> Geometry {
    Geometry {
        row: i32::from(rows) / 2 - HEIGHT as i32 / 2,
        col: i32::from(cols) / 2 - WIDTH as i32 / 2 + 1,
        width: 1,
        height: 1,
        z_index: 1,
        focusable: false,
        enter: false,
    }
}

fn frame_geometry(row: i32, height: usize) -> Geometry {
    Geometry {
        row,
        col: FRAME_COL,
        width: WIDTH as u16,
        height: height as u16,
        z_index: FRAME_Z,
        focusable: false,
        enter: false,
    }
}

fn input_geometry() -> Geometry {
    Geometry {
        row: INPUT_ROW,
        col: INPUT_COL,
        width: (WIDTH - 7) as u16,
        height: 1,
        z_index: INPUT_Z,
        focusable: true,
        enter: true,
    }
}

/// Create, fill and place one surface. The id is tracked before anything
/// else so a later failure still gets it torn down.
fn spawn<H: SurfaceHost>(
    host: &mut H,
    session: &mut Session,
    kind: SurfaceKind,
    lines: &[String],
    geometry: Geometry,
) -> Result<SurfaceId, SurfaceError> {
    let id = host.create_surface()?;
    session.track(id, kind);
    tracing::debug!(surface = %id, kind = ?kind, "Surface created");

    if !lines.is_empty() {
        host.write_lines(id, lines)?;
    }
    match kind {
        SurfaceKind::Anchor => {}
        SurfaceKind::Input => {
            host.set_option(id, "winhl", format!("Normal:{}", frames::TEXT_GROUP).into())?;
        }
        _ => {
            host.set_option(id, "modifiable", false.into())?;
            host.set_option(id, "winhl", format!("Normal:{}", frames::BORDER_GROUP).into())?;
        }
    }

    let anchor = match kind {
        SurfaceKind::Anchor => None,
        _ => session.anchor(),
    };
    host.open_floating(id, anchor, geometry)?;
    Ok(id)
}

fn dispose<H: SurfaceHost>(host: &mut H, session: &mut Session, id: SurfaceId) {
    if let Err(e) = host.destroy_surface(id) {
        tracing::warn!(surface = %id, error = %e, "Could not destroy surface");
    }
    session.forget(id);
}

/// Bindings installed on the input surface
pub(super) fn keymaps() -> Vec<(KeyMode, &'static str, Command)> {
    use Direction::{Next, Previous};

    let shared = [
        ("<Tab>", Command::SelectDevice(Next)),
        ("<C-N>", Command::SelectDevice(Next)),
        ("<S-Tab>", Command::SelectDevice(Previous)),
        ("<C-P>", Command::SelectDevice(Previous)),
        ("<C-T>", Command::Search(SearchMode::Track)),
        ("<C-R>", Command::Search(SearchMode::Artist)),
        ("<C-L>", Command::Search(SearchMode::Album)),
        ("<C-Y>", Command::Search(SearchMode::Playlist)),
        ("<C-O>", Command::Search(SearchMode::Show)),
        ("<Down>", Command::MoveCursor(Next)),
        ("<Up>", Command::MoveCursor(Previous)),
        ("<C-Space>", Command::Activate),
        ("<C-S>", Command::Save),
        ("<C-K>", Command::Playback(PlaybackAction::Next)),
        ("<C-B>", Command::Playback(PlaybackAction::Prev)),
        ("<C-G>", Command::Playback(PlaybackAction::Pause)),
    ];

    let mut maps: Vec<_> = shared
        .into_iter()
        .flat_map(|(key, command)| {
            [
                (KeyMode::Normal, key, command.clone()),
                (KeyMode::Insert, key, command),
            ]
        })
        .collect();

    maps.extend([
        (KeyMode::Normal, "<Esc>", Command::Close),
        (KeyMode::Normal, "q", Command::Close),
        (KeyMode::Normal, "<CR>", Command::Activate),
        (KeyMode::Insert, "<CR>", Command::Search(SearchMode::Track)),
    ]);
    maps
}

pub(super) fn render_now_playing<H: SurfaceHost>(
    host: &mut H,
    session: &mut Session,
    now: &NowPlaying,
) -> Result<(), SurfaceError> {
    let lines = frames::now_playing(now);
    match session.surface_of(SurfaceKind::NowPlaying) {
        Some(id) => host.write_lines(id, &lines),
        None => spawn(
            host,
            session,
            SurfaceKind::NowPlaying,
            &lines,
            frame_geometry(NOW_PLAYING_ROW, HEIGHT),
        )
        .map(|_| ()),
    }
}

fn devices_height(session: &Session) -> usize {
    match session.surface_of(SurfaceKind::Devices) {
        Some(_) => session.devices().len() + 2,
        None => 0,
    }
}

/// Redraw the device list. Its height changes with the list, so the results
/// frame below it is moved along.
pub(super) fn render_devices<H: SurfaceHost>(
    host: &mut H,
    session: &mut Session,
) -> Result<(), SurfaceError> {
    if let Some(id) = session.surface_of(SurfaceKind::Devices) {
        dispose(host, session, id);
    }

    if !session.devices().is_empty() {
        let lines = frames::devices(session.devices(), session.selected_device_index());
        let selected = session.selected_device_index();
        let id = spawn(
            host,
            session,
            SurfaceKind::Devices,
            &lines,
            frame_geometry(LIST_ROW, lines.len()),
        )?;
        set_selection(host, id, selected)?;
    }

    if session.surface_of(SurfaceKind::Results).is_some() {
        render_results(host, session)?;
    }
    Ok(())
}

pub(super) fn render_results<H: SurfaceHost>(
    host: &mut H,
    session: &mut Session,
) -> Result<(), SurfaceError> {
    if let Some(id) = session.surface_of(SurfaceKind::Results) {
        dispose(host, session, id);
    }

    let lines = frames::results(session.mode, session.results(), session.result_cursor());
    let cursor = session.result_cursor();
    let row = LIST_ROW + devices_height(session) as i32;
    let id = spawn(
        host,
        session,
        SurfaceKind::Results,
        &lines,
        frame_geometry(row, lines.len()),
    )?;
    set_selection(host, id, cursor)
}

/// Rewrite the placeholder's top border with the active mode.
pub(super) fn retitle<H: SurfaceHost>(host: &mut H, session: &Session) -> Result<(), SurfaceError> {
    match session.surface_of(SurfaceKind::Placeholder) {
        Some(id) => host.write_region(
            id,
            0,
            0,
            WIDTH,
            &frames::top_border(&frames::search_title(session.mode)),
        ),
        None => Ok(()),
    }
}

fn set_selection<H: SurfaceHost>(
    host: &mut H,
    id: SurfaceId,
    index: Option<usize>,
) -> Result<(), SurfaceError> {
    let line = index.map_or(-1, |i| frames::list_line(i) as i64);
    host.set_option(id, "selection", OptionValue::Int(line))
}

/// Move the `▶` marker of a list frame from one entry to another.
pub(super) fn move_marker<H: SurfaceHost>(
    host: &mut H,
    id: SurfaceId,
    from: Option<usize>,
    to: usize,
) -> Result<(), SurfaceError> {
    if let Some(old) = from {
        host.write_region(
            id,
            frames::list_line(old),
            MARKER_COLUMN,
            MARKER_COLUMN + 1,
            NO_MARKER,
        )?;
    }
    host.write_region(
        id,
        frames::list_line(to),
        MARKER_COLUMN,
        MARKER_COLUMN + 1,
        MARKER,
    )?;
    set_selection(host, id, Some(to))
}

impl<H: SurfaceHost> SessionController<H> {
    pub async fn open(&mut self) -> Result<(), SessionError> {
        if self.session.is_some() {
            tracing::debug!("Session already open");
            return Ok(());
        }
        tracing::info!("Opening session");

        let mut session = Session::new();
        match self.populate(&mut session).await {
            Ok(()) => {
                tracing::info!(
                    surfaces = session.surface_count(),
                    devices = session.devices().len(),
                    "Session ready"
                );
                self.session = Some(session);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    surfaces = session.surface_count(),
                    "Open failed, rolling back"
                );
                self.teardown(&mut session);
                Err(error)
            }
        }
    }

    async fn populate(&mut self, session: &mut Session) -> Result<(), SessionError> {
        for command in frames::highlight_commands() {
            if let Err(e) = self.host.run_host_command(&command) {
                tracing::warn!(command = %command, error = %e, "Could not define highlight");
            }
        }

        let screen = self.host.screen_size();
        spawn(&mut self.host, session, SurfaceKind::Anchor, &[], anchor_geometry(screen))?;
        let lines = frames::placeholder(session.mode);
        spawn(
            &mut self.host,
            session,
            SurfaceKind::Placeholder,
            &lines,
            frame_geometry(0, HEIGHT),
        )?;

        match self.backend.currently_playing().await {
            Ok(Some(now)) => {
                if let Err(e) = render_now_playing(&mut self.host, session, &now) {
                    tracing::warn!(error = %e, "Could not show currently playing track");
                }
            }
            Ok(None) => tracing::debug!("Nothing playing"),
            Err(e) => tracing::warn!(error = %e, "Could not load currently playing track"),
        }

        match self.backend.list_devices().await {
            Ok(devices) => {
                session.replace_devices(devices);
                if let Err(e) = render_devices(&mut self.host, session) {
                    tracing::warn!(error = %e, "Could not show devices");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not load devices"),
        }

        let input = spawn(&mut self.host, session, SurfaceKind::Input, &[], input_geometry())?;
        self.host.run_host_command("startinsert!")?;
        for (mode, key, command) in keymaps() {
            self.host.bind_key(input, mode, key, command)?;
        }
        self.host.bind_leave(input, Command::Close)?;
        Ok(())
    }

    /// Tear down every surface and forget the session. Safe to call repeatedly.
    pub fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            tracing::debug!("Close requested with no open session");
            return;
        };
        self.teardown(&mut session);
        tracing::info!("Session closed");
    }

    fn teardown(&mut self, session: &mut Session) {
        if let Err(e) = self.host.run_host_command("stopinsert") {
            tracing::warn!(error = %e, "Could not leave insert mode");
        }
        for id in session.teardown_order() {
            dispose(&mut self.host, session, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_is_bound_once_per_mode() {
        let maps = keymaps();
        for (mode, key, _) in &maps {
            let count = maps.iter().filter(|(m, k, _)| m == mode && k == key).count();
            assert_eq!(count, 1, "{key} bound {count} times in {mode:?}");
        }
    }

    #[test]
    fn enter_searches_tracks_while_typing() {
        let maps = keymaps();
        let enter = maps
            .iter()
            .find(|(mode, key, _)| *mode == KeyMode::Insert && *key == "<CR>")
            .map(|(_, _, command)| command.clone());
        assert_eq!(enter, Some(Command::Search(SearchMode::Track)));
    }

    #[test]
    fn anchor_is_centred() {
        let geometry = anchor_geometry((200, 50));
        assert_eq!(geometry.row, 24);
        assert_eq!(geometry.col, 66);
        assert_eq!((geometry.width, geometry.height), (1, 1));
    }
}
