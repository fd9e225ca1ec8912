//! # Reference-Range Formatter
//!
//! Biological reference intervals arrive as free text: embedded newlines,
//! irregular spacing around colons, and demographic sub-ranges chained on a
//! single line ("Adult: 10-20, Child: 5-15"). This module normalizes that
//! text and folds it into display lines bounded by the reference column
//! width.
//!
//! Rules, in order:
//! 1. Explicit newlines are authoritative row breaks and are never merged.
//! 2. Within a line, whitespace runs collapse to single spaces and space
//!    before a colon is removed ("Adult : 10" -> "Adult: 10").
//! 3. A line that fits is emitted verbatim.
//! 4. An over-wide line is split into demographic segments (Adult, Child,
//!    Male, Female, New Born, Cord Blood, month/year spans). Short segments
//!    stay intact; segments past ~80% of the column width are further split
//!    at colon boundaries, and anything still over-wide is word-wrapped.
//!    The resulting units are packed greedily back into lines.
//!
//! Width measurement is injected so the formatter is font-agnostic.

use crate::text;

/// Fraction of the column width under which a demographic segment is kept
/// as a single packing unit.
const INTACT_FRACTION: f64 = 0.8;

/// Single-word demographic markers that open a new segment.
const SEGMENT_KEYWORDS: [&str; 6] = ["ADULT", "ADULTS", "CHILD", "CHILDREN", "MALE", "FEMALE"];

/// Two-word demographic markers.
const SEGMENT_PHRASES: [(&str, &str); 2] = [("NEW", "BORN"), ("CORD", "BLOOD")];

/// Age-span units: a number followed by one of these also opens a segment.
const AGE_UNITS: [&str; 6] = ["MONTH", "MONTHS", "YEAR", "YEARS", "YR", "YRS"];

/// Normalize and wrap reference-range text into lines no wider than
/// `max_width` under `measure`.
///
/// Empty or whitespace-only input yields an empty list; the caller
/// substitutes "N/A" where a visible value is expected.
pub fn format_reference_range<F: Fn(&str) -> f64>(
    text: &str,
    max_width: f64,
    measure: &F,
) -> Vec<String> {
    let mut out = Vec::new();

    for raw_line in text.split('\n') {
        let line = normalize_line(raw_line);
        if line.is_empty() {
            continue;
        }
        if measure(&line) <= max_width {
            out.push(line);
            continue;
        }
        pack_segments(&line, max_width, measure, &mut out);
    }

    out
}

/// Collapse whitespace runs and drop space before colons, keeping one
/// space after ("Adult : 10" and "Adult :10" both become "Adult: 10").
fn normalize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for token in line.split_whitespace() {
        if token.starts_with(':') && !out.is_empty() {
            let colons = token.chars().take_while(|&c| c == ':').count();
            let (head, value) = token.split_at(colons);
            out.push_str(head);
            if !value.is_empty() {
                out.push(' ');
                out.push_str(value);
            }
        } else {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(token);
        }
    }
    out
}

/// Split an over-wide line into packing units and greedily refill lines.
fn pack_segments<F: Fn(&str) -> f64>(
    line: &str,
    max_width: f64,
    measure: &F,
    out: &mut Vec<String>,
) {
    let mut units: Vec<String> = Vec::new();
    for segment in split_demographic_segments(line) {
        if measure(&segment) <= max_width * INTACT_FRACTION {
            units.push(segment);
            continue;
        }
        for part in split_at_colons(&segment) {
            if measure(&part) <= max_width {
                units.push(part);
            } else {
                units.extend(text::wrap(&part, max_width, measure));
            }
        }
    }

    let mut current = String::new();
    for unit in units {
        if current.is_empty() {
            current = unit;
            continue;
        }
        let candidate = format!("{current} {unit}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            out.push(std::mem::replace(&mut current, unit));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Split a normalized line into demographic segments, preserving word order
/// and spacing so the segments re-concatenate to the original line.
fn split_demographic_segments(line: &str) -> Vec<String> {
    let words: Vec<&str> = line.split(' ').collect();
    let mut segments = Vec::new();
    let mut start = 0;

    for i in 1..words.len() {
        if opens_segment(&words, i) {
            segments.push(words[start..i].join(" "));
            start = i;
        }
    }
    segments.push(words[start..].join(" "));
    segments
}

/// Does a new demographic segment begin at word index `i`?
fn opens_segment(words: &[&str], i: usize) -> bool {
    let head = bare(words[i]);

    if SEGMENT_KEYWORDS.contains(&head.as_str()) {
        return true;
    }
    if let Some(next) = words.get(i + 1) {
        let next = bare(next);
        if SEGMENT_PHRASES.iter().any(|(a, b)| head == *a && next == *b) {
            return true;
        }
        // "0-1 Month: ..." / "2 Years: ..." style age spans.
        if head.chars().next().is_some_and(|c| c.is_ascii_digit())
            && AGE_UNITS.contains(&next.as_str())
        {
            return true;
        }
    }
    false
}

/// Uppercase a word with trailing/leading punctuation stripped.
fn bare(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-')
        .to_ascii_uppercase()
}

/// Split a segment after each colon-terminated label, e.g.
/// "Adult: 10-20 mg" -> ["Adult:", "10-20 mg"].
fn split_at_colons(segment: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for word in segment.split(' ') {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
        if word.ends_with(':') {
            parts.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_chars(s: &str) -> f64 {
        s.chars().count() as f64
    }

    #[test]
    fn test_empty_input_empty_output() {
        assert!(format_reference_range("", 50.0, &by_chars).is_empty());
        assert!(format_reference_range("   \n  ", 50.0, &by_chars).is_empty());
    }

    #[test]
    fn test_newlines_kept_as_rows() {
        let lines = format_reference_range("Adult: 10-20\nChild: 5-15\nInfant: 2-8", 50.0, &by_chars);
        assert_eq!(lines, vec!["Adult: 10-20", "Child: 5-15", "Infant: 2-8"]);
    }

    #[test]
    fn test_colon_whitespace_normalized() {
        let lines = format_reference_range("Adult :  10-20", 50.0, &by_chars);
        assert_eq!(lines, vec!["Adult: 10-20"]);
    }

    #[test]
    fn test_colon_glued_value_regains_space() {
        let lines = format_reference_range("Adult :10-20", 50.0, &by_chars);
        assert_eq!(lines, vec!["Adult: 10-20"]);
    }

    #[test]
    fn test_demographic_segments_split() {
        let lines = format_reference_range("Male: 13.0-17.0 Female: 11.5-15.5", 20.0, &by_chars);
        assert_eq!(lines, vec!["Male: 13.0-17.0", "Female: 11.5-15.5"]);
    }

    #[test]
    fn test_segments_packed_when_they_fit() {
        let lines = format_reference_range("Male: 13-17 Female: 12-15", 40.0, &by_chars);
        assert_eq!(lines, vec!["Male: 13-17 Female: 12-15"]);
    }

    #[test]
    fn test_two_word_phrase_opens_segment() {
        let lines =
            format_reference_range("Adult: 0.5-1.0 New Born: 1.0-2.0 Cord Blood: 2.0-3.0", 22.0, &by_chars);
        assert_eq!(
            lines,
            vec!["Adult: 0.5-1.0", "New Born: 1.0-2.0", "Cord Blood: 2.0-3.0"]
        );
    }

    #[test]
    fn test_age_span_opens_segment() {
        let lines = format_reference_range("0-1 Month: 5-15 1-5 Years: 4-12", 18.0, &by_chars);
        assert_eq!(lines, vec!["0-1 Month: 5-15", "1-5 Years: 4-12"]);
    }

    #[test]
    fn test_no_content_lost() {
        let input = "Adult : 10-20,  Child: 5-15\nPregnancy:   see note";
        let lines = format_reference_range(input, 16.0, &by_chars);
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, "Adult: 10-20, Child: 5-15 Pregnancy: see note");
    }

    #[test]
    fn test_width_bound_holds() {
        let input = "Adult: 4000-11000 cells/cumm Child: 5000-14500 cells/cumm";
        for line in format_reference_range(input, 20.0, &by_chars) {
            for word in line.split(' ') {
                // Only an unbreakable word may exceed the bound.
                if by_chars(&line) > 20.0 {
                    assert_eq!(line, word, "over-wide line must be a single word");
                }
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let once = format_reference_range("Adult: 10-20 Child: 5-15 Infant: 2-8", 14.0, &by_chars);
        for line in &once {
            let again = format_reference_range(line, 14.0, &by_chars);
            assert_eq!(again, vec![line.clone()]);
        }
    }
}
