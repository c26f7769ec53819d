//! Overlay rendering (status line, idle hint)

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crate::host::{NotifyLevel, StatusMessage};

const HINT: &str = "s  open Spotify search    q  quit";

/// One-line message along the bottom edge, coloured by severity
pub fn render_status(frame: &mut Frame, area: Rect, status: &StatusMessage) {
    if area.height == 0 {
        return;
    }
    let line_area = Rect {
        x: area.x,
        y: area.bottom() - 1,
        width: area.width,
        height: 1,
    };

    let color = match status.level {
        NotifyLevel::Info => Color::Green,
        NotifyLevel::Warn => Color::Yellow,
        NotifyLevel::Error => Color::Red,
    };

    frame.render_widget(Clear, line_area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", status.text),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))),
        line_area,
    );
}

pub fn render_hint(frame: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let hint_area = Rect {
        x: area.x,
        y: area.y + area.height / 2,
        width: area.width,
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(HINT)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        hint_area,
    );
}
