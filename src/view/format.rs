//! Text helpers shared by the frame builders and the backends
//!
//! All widths are counted in Unicode scalar values, never bytes.

pub const ELLIPSIS: &str = "...";

/// Cut `text` to `max_width` codepoints and append an ellipsis when it was longer.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() > max_width {
        let head: String = text.chars().take(max_width).collect();
        format!("{head}{ELLIPSIS}")
    } else {
        text.to_string()
    }
}

/// Human list of artist names: "A", "A and B", "A, B and C".
pub fn join_artists<S: AsRef<str>>(names: &[S]) -> String {
    match names {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{} and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Right-pad `text` with spaces up to `width` codepoints.
pub fn pad_to(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{text}{}", " ".repeat(width - len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_text_alone() {
        assert_eq!(truncate("Around the World", 16), "Around the World");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn truncate_is_bounded() {
        for n in 0..12 {
            let out = truncate("Harder, Better, Faster, Stronger", n);
            assert!(out.chars().count() <= n + ELLIPSIS.len());
            assert!(out.ends_with(ELLIPSIS));
        }
    }

    #[test]
    fn truncate_counts_codepoints() {
        assert_eq!(truncate("Björk Guðmundsdóttir", 5), "Björk...");
        assert_eq!(truncate("日本語の曲", 5), "日本語の曲");
    }

    #[test]
    fn join_artists_table() {
        let none: [&str; 0] = [];
        assert_eq!(join_artists(&none), "");
        assert_eq!(join_artists(&["A"]), "A");
        assert_eq!(join_artists(&["A", "B"]), "A and B");
        assert_eq!(join_artists(&["A", "B", "C"]), "A, B and C");
    }

    #[test]
    fn pad_to_fills_to_width() {
        assert_eq!(pad_to("ab", 4), "ab  ");
        assert_eq!(pad_to("abcdef", 4), "abcdef");
        assert_eq!(pad_to("▶", 3).chars().count(), 3);
    }
}
