use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.split('\t')
        .enumerate()
        .map(|(i, part)| {
            let w = UnicodeWidthStr::width(part);
            if i > 0 { w + 4 } else { w }
        })
        .sum()
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells <= 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1; // reserve 1 cell for '…'
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = display_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

/// Right-pad `s` with spaces to `cells` terminal cells.
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let w = display_width(s);
    if w >= cells {
        return s.to_string();
    }
    format!("{}{}", s, " ".repeat(cells - w))
}

/// Trim `s` and keep at most `max_chars` characters, never splitting a
/// grapheme cluster. Returns `None` when nothing is left after trimming.
pub fn clip_text(s: &str, max_chars: usize) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut count = 0;
    let mut out = String::new();
    for grapheme in trimmed.graphemes(true) {
        let n = grapheme.chars().count();
        if count + n > max_chars {
            break;
        }
        count += n;
        out.push_str(grapheme);
    }
    Some(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_width_ascii() {
        assert_eq!(display_width("hello"), 5);
    }

    #[test]
    fn test_display_width_cjk() {
        assert_eq!(display_width("한국어"), 6);
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("hello world", 8), "hello w\u{2026}");
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("한국어", 4), "한\u{2026}");
    }

    #[test]
    fn test_pad_to_width() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("한", 3), "한 ");
        assert_eq!(pad_to_width("abcdef", 3), "abcdef");
    }

    #[test]
    fn test_clip_text_trims_and_limits() {
        assert_eq!(clip_text("  hi  ", 30), Some("hi".to_string()));
        assert_eq!(clip_text("   ", 30), None);
        assert_eq!(clip_text("abcdef", 3), Some("abc".to_string()));
    }

    #[test]
    fn test_clip_text_keeps_graphemes_whole() {
        // "e" + combining acute is one grapheme of two chars
        let s = "ab\u{0065}\u{0301}";
        assert_eq!(clip_text(s, 3), Some("ab".to_string()));
        assert_eq!(clip_text(s, 4), Some(s.to_string()));
    }
}
