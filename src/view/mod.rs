//! View module - drawing the terminal host with ratatui
//!
//! - `format`: text helpers (truncation, artist lists, padding)
//! - `frames`: fixed-width box frames for each surface kind
//! - `overlays`: status line and the idle hint

pub mod format;
pub mod frames;
mod overlays;

use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crate::host::TerminalHost;

pub struct HostView;

impl HostView {
    pub fn render(frame: &mut Frame, host: &TerminalHost) {
        let area = frame.area();

        if !host.has_surfaces() {
            overlays::render_hint(frame, area);
        }

        let selection = host.highlight(frames::SELECTION_GROUP);
        for surface in host.placed_surfaces() {
            let rect = surface.area.intersection(area);
            if rect.is_empty() || surface.lines.is_empty() {
                continue;
            }

            let base = surface
                .style_group
                .map(|group| host.highlight(group))
                .unwrap_or_default();
            let lines: Vec<Line> = surface
                .lines
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    let style = if surface.selected_row == Some(i) { selection } else { base };
                    Line::from(Span::styled(text.clone(), style))
                })
                .collect();

            frame.render_widget(Clear, rect);
            frame.render_widget(Paragraph::new(lines).style(base), rect);
        }

        if let Some((x, y)) = host.cursor_position() {
            if x < area.right() && y < area.bottom() {
                frame.set_cursor_position((x, y));
            }
        }

        if let Some(status) = host.status() {
            overlays::render_status(frame, area, status);
        }
    }
}
