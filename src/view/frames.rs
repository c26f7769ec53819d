//! Fixed-width box frames for each surface kind
//!
//! Every frame is `WIDTH` codepoints wide and drawn with `╭─╮│╰╯`. List
//! frames put a selection marker at `MARKER_COLUMN` so the controller can
//! move it with a single region write instead of redrawing the list.

use super::format::{pad_to, truncate};
use crate::model::{Device, NowPlaying, ResultRow, SearchMode};

pub const WIDTH: usize = 70;
pub const HEIGHT: usize = 3;

/// Column of the `▶` marker in list rows (`│ ▶ ...`)
pub const MARKER_COLUMN: usize = 2;
pub const MARKER: &str = "▶";
pub const NO_MARKER: &str = " ";

pub const BORDER_GROUP: &str = "SpotifyBorder";
pub const TEXT_GROUP: &str = "SpotifyText";
pub const SELECTION_GROUP: &str = "SpotifySelection";

const PROMPT: &str = " ›";
const PLAYING_ICON: &str = "♫";
const ACTIVE_ICON: &str = "●";

pub fn top_border(title: &str) -> String {
    let inner = WIDTH - 2;
    let title = if title.chars().count() > inner {
        truncate(title, inner - 3)
    } else {
        title.to_string()
    };
    let free = inner - title.chars().count();
    let left = free / 2;
    format!("╭{}{}{}╮", "─".repeat(left), title, "─".repeat(free - left))
}

pub fn bottom_border() -> String {
    format!("╰{}╯", "─".repeat(WIDTH - 2))
}

fn row(content: &str) -> String {
    format!("│{}│", pad_to(content, WIDTH - 2))
}

fn marker(selected: bool) -> &'static str {
    if selected { MARKER } else { NO_MARKER }
}

pub fn search_title(mode: SearchMode) -> String {
    format!(" Spotify Search: {} ", mode.title())
}

pub fn placeholder(mode: SearchMode) -> Vec<String> {
    vec![top_border(&search_title(mode)), row(PROMPT), bottom_border()]
}

pub fn now_playing(now: &NowPlaying) -> Vec<String> {
    vec![
        top_border(" Currently Playing "),
        row(&format!(" {PLAYING_ICON}  {}", truncate(&now.banner(), WIDTH - 10))),
        bottom_border(),
    ]
}

pub fn devices(devices: &[Device], selected: Option<usize>) -> Vec<String> {
    let mut lines = vec![top_border(" Connect to a Device ")];
    lines.extend(devices.iter().enumerate().map(|(i, device)| {
        let active = if device.is_active {
            format!(" {ACTIVE_ICON}")
        } else {
            String::new()
        };
        row(&format!(
            " {} {}{}",
            marker(selected == Some(i)),
            truncate(&device.name, WIDTH - 12),
            active
        ))
    }));
    lines.push(bottom_border());
    lines
}

pub fn results(mode: SearchMode, rows: &[ResultRow], cursor: Option<usize>) -> Vec<String> {
    let mut lines = vec![top_border(&format!(" {} ({}) ", mode.title(), rows.len()))];
    if rows.is_empty() {
        lines.push(row("   Nothing found"));
    }
    lines.extend(rows.iter().enumerate().map(|(i, result)| {
        row(&format!(
            " {} {} {}",
            marker(cursor == Some(i)),
            pad_to(&truncate(&result.primary_text, 30), 33),
            truncate(&result.secondary_text, 25)
        ))
    }));
    lines.push(bottom_border());
    lines
}

/// Line index of list entry `index` inside a list frame
pub fn list_line(index: usize) -> usize {
    index + 1
}

/// Highlight group definitions issued when a session opens
pub fn highlight_commands() -> [String; 3] {
    [
        format!("hi {BORDER_GROUP} guifg=#1db954"),
        format!("hi {TEXT_GROUP} guifg=#1ed760"),
        format!("hi {SELECTION_GROUP} guifg=#191414 guibg=#1ed760"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widths(lines: &[String]) -> Vec<usize> {
        lines.iter().map(|l| l.chars().count()).collect()
    }

    #[test]
    fn placeholder_is_three_rows_of_full_width() {
        let lines = placeholder(SearchMode::Track);
        assert_eq!(lines.len(), HEIGHT);
        assert_eq!(widths(&lines), vec![WIDTH; HEIGHT]);
        assert!(lines[0].contains(" Spotify Search: Tracks "));
        assert!(lines[0].starts_with('╭') && lines[0].ends_with('╮'));
    }

    #[test]
    fn device_rows_mark_selection_at_marker_column() {
        let list = vec![
            Device { name: "Kitchen".into(), id: "k".into(), is_active: true },
            Device { name: "Office".into(), id: "o".into(), is_active: false },
        ];
        let lines = devices(&list, Some(1));
        assert_eq!(lines.len(), 4);
        assert!(widths(&lines).iter().all(|w| *w == WIDTH));

        let marker_at = |line: &str| line.chars().nth(MARKER_COLUMN).map(String::from);
        assert_eq!(marker_at(&lines[list_line(1)]), Some(MARKER.to_string()));
        assert_eq!(marker_at(&lines[list_line(0)]), Some(NO_MARKER.to_string()));
        assert!(lines[list_line(0)].contains(ACTIVE_ICON));
    }

    #[test]
    fn long_result_text_stays_inside_the_frame() {
        let rows = vec![ResultRow {
            primary_text: "x".repeat(200),
            secondary_text: "y".repeat(200),
            uri: "spotify:track:1".into(),
            id: "1".into(),
        }];
        let lines = results(SearchMode::Track, &rows, Some(0));
        assert!(widths(&lines).iter().all(|w| *w == WIDTH));
    }

    #[test]
    fn empty_results_say_so() {
        let lines = results(SearchMode::Artist, &[], None);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Nothing found"));
        assert!(lines[0].contains("Artists (0)"));
    }
}
