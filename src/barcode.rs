//! # SID Barcode (Code 39)
//!
//! Encodes the report's SID for the top-right header barcode. Code 39 is
//! self-checking and covers the uppercase alphanumeric SIDs the billing
//! system issues; anything outside the symbology maps to `-` so encoding
//! never fails.
//!
//! Each symbol is nine elements (five bars, four spaces) of which exactly
//! three are wide, separated by a narrow inter-character gap, with the `*`
//! symbol as start and stop. The encoder emits bar segments in narrow-module
//! units; the chrome renderer scales them to the target width in mm.

/// A single dark bar, measured in narrow-module units from the symbol start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSegment {
    pub offset: f64,
    pub width: f64,
}

/// An encoded barcode: bar segments plus the total width in module units.
#[derive(Debug, Clone)]
pub struct Barcode {
    pub bars: Vec<BarSegment>,
    pub total_modules: f64,
}

/// Wide elements are this many narrow modules.
const WIDE_RATIO: f64 = 2.5;

/// Code 39 patterns: 9 chars each, bar/space alternating starting with a
/// bar; '1' = wide, '0' = narrow. Every pattern has exactly three wide
/// elements.
#[rustfmt::skip]
const SYMBOLS: [(char, &str); 44] = [
    ('0', "000110100"), ('1', "100100001"), ('2', "001100001"), ('3', "101100000"),
    ('4', "000110001"), ('5', "100110000"), ('6', "001110000"), ('7', "000100101"),
    ('8', "100100100"), ('9', "001100100"),
    ('A', "100001001"), ('B', "001001001"), ('C', "101001000"), ('D', "000011001"),
    ('E', "100011000"), ('F', "001011000"), ('G', "000001101"), ('H', "100001100"),
    ('I', "001001100"), ('J', "000011100"), ('K', "100000011"), ('L', "001000011"),
    ('M', "101000010"), ('N', "000010011"), ('O', "100010010"), ('P', "001010010"),
    ('Q', "000000111"), ('R', "100000110"), ('S', "001000110"), ('T', "000010110"),
    ('U', "110000001"), ('V', "011000001"), ('W', "111000000"), ('X', "010010001"),
    ('Y', "110010000"), ('Z', "011010000"),
    ('-', "010000101"), ('.', "110000100"), (' ', "011000100"), ('$', "010101000"),
    ('/', "010100010"), ('+', "010001010"), ('%', "000101010"), ('*', "010010100"),
];

fn pattern_for(ch: char) -> &'static str {
    let upper = ch.to_ascii_uppercase();
    SYMBOLS
        .iter()
        .find(|(c, _)| *c == upper)
        .map(|(_, p)| *p)
        // Unsupported characters render as '-' rather than failing.
        .unwrap_or("010000101")
}

/// Encode `data` as Code 39, including start/stop symbols.
pub fn encode(data: &str) -> Barcode {
    let mut bars = Vec::new();
    let mut cursor = 0.0;

    let mut push_symbol = |cursor: &mut f64, pattern: &str| {
        for (i, flag) in pattern.chars().enumerate() {
            let width = if flag == '1' { WIDE_RATIO } else { 1.0 };
            if i % 2 == 0 {
                bars.push(BarSegment { offset: *cursor, width });
            }
            *cursor += width;
        }
        // Narrow inter-character gap.
        *cursor += 1.0;
    };

    push_symbol(&mut cursor, pattern_for('*'));
    for ch in data.chars() {
        push_symbol(&mut cursor, pattern_for(ch));
    }
    push_symbol(&mut cursor, pattern_for('*'));

    // Drop the trailing gap after the stop symbol.
    cursor -= 1.0;

    Barcode { bars, total_modules: cursor }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pattern_is_nine_elements_three_wide() {
        for (ch, pattern) in SYMBOLS {
            assert_eq!(pattern.len(), 9, "symbol {ch:?}");
            let wide = pattern.chars().filter(|&c| c == '1').count();
            assert_eq!(wide, 3, "symbol {ch:?} must have exactly 3 wide elements");
        }
    }

    #[test]
    fn test_symbols_are_unique() {
        for (i, (_, a)) in SYMBOLS.iter().enumerate() {
            for (_, b) in SYMBOLS.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_encode_bar_count() {
        // 5 bars per symbol, two framing '*' symbols.
        let code = encode("SID123");
        assert_eq!(code.bars.len(), 5 * (6 + 2));
    }

    #[test]
    fn test_encode_width() {
        // Per symbol: 6 narrow + 3 wide modules, plus a gap after all but
        // the last symbol.
        let code = encode("A");
        let per_symbol = 6.0 + 3.0 * 2.5;
        assert!((code.total_modules - (3.0 * per_symbol + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_lowercase_normalized() {
        let upper = encode("AB12");
        let lower = encode("ab12");
        assert_eq!(upper.bars, lower.bars);
    }

    #[test]
    fn test_unsupported_char_does_not_panic() {
        let code = encode("SID#42");
        assert!(!code.bars.is_empty());
    }

    #[test]
    fn test_bars_are_ordered_and_disjoint() {
        let code = encode("XYZ-789");
        for pair in code.bars.windows(2) {
            assert!(pair[0].offset + pair[0].width <= pair[1].offset + 1e-9);
        }
    }
}
