//! # Text Wrapping
//!
//! Greedy line filling over UAX#14 break opportunities.
//!
//! The wrapper never breaks inside a word: the atomic units are the segments
//! between break opportunities reported by `unicode-linebreak`. A single
//! segment wider than the limit is emitted as an over-wide line rather than
//! being chopped — the caller decides what to do with pathological input
//! (the page flow controller simply keeps paging).
//!
//! Width is measured by a caller-supplied function so the same wrapper
//! serves layout (mm via `FontContext`) and tests (fake metrics).

use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Break `text` into lines no wider than `max_width` under `measure`.
///
/// Embedded newlines are mandatory breaks and are always honored. Trailing
/// whitespace is trimmed from every produced line; blank lines from
/// consecutive newlines are preserved.
pub fn wrap<F: Fn(&str) -> f64>(text: &str, max_width: f64, measure: &F) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut prev = 0;

    for (offset, opportunity) in linebreaks(text) {
        let raw = &text[prev..offset];
        prev = offset;
        let segment = raw.trim_end_matches(['\n', '\r']);

        let candidate = if line.is_empty() {
            segment.trim_start().to_string()
        } else {
            format!("{line}{segment}")
        };

        if !line.is_empty() && measure(candidate.trim_end()) > max_width {
            lines.push(std::mem::take(&mut line).trim_end().to_string());
            line = segment.trim_start().to_string();
        } else {
            line = candidate;
        }

        if opportunity == BreakOpportunity::Mandatory {
            lines.push(std::mem::take(&mut line).trim_end().to_string());
        }
    }

    // linebreaks() always ends with a mandatory break at text.len(), but a
    // defensively non-empty remainder is still flushed.
    if !line.is_empty() {
        lines.push(line.trim_end().to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One char = one unit of width. Keeps expectations readable.
    fn by_chars(s: &str) -> f64 {
        s.chars().count() as f64
    }

    #[test]
    fn test_short_text_single_line() {
        let lines = wrap("hello world", 20.0, &by_chars);
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn test_wraps_at_word_boundary() {
        let lines = wrap("alpha beta gamma", 11.0, &by_chars);
        assert_eq!(lines, vec!["alpha beta", "gamma"]);
    }

    #[test]
    fn test_never_breaks_mid_word() {
        let lines = wrap("supercalifragilistic ok", 10.0, &by_chars);
        assert_eq!(lines, vec!["supercalifragilistic", "ok"]);
    }

    #[test]
    fn test_newlines_are_hard_breaks() {
        let lines = wrap("one two\nthree", 50.0, &by_chars);
        assert_eq!(lines, vec!["one two", "three"]);
    }

    #[test]
    fn test_blank_line_preserved() {
        let lines = wrap("a\n\nb", 50.0, &by_chars);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(wrap("", 10.0, &by_chars).is_empty());
    }

    #[test]
    fn test_idempotent_at_same_width() {
        let first = wrap("lorem ipsum dolor sit amet consectetur", 14.0, &by_chars);
        for line in &first {
            let again = wrap(line, 14.0, &by_chars);
            assert_eq!(again, vec![line.clone()], "re-wrapping a fitted line must be a no-op");
        }
    }

    #[test]
    fn test_no_line_exceeds_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 12.0, &by_chars);
        for line in &lines {
            assert!(by_chars(line) <= 12.0, "line {line:?} too wide");
        }
    }
}
