//! Large-number display formatting for HUD text.
//!
//! Display-edge code: values arrive as f64 (see the conversion helpers in
//! [`crate::fixed`]) and leave as strings. Not used anywhere sim-visible.

/// Magnitude suffixes, one per factor of 1000.
const SUFFIXES: [&str; 12] = [
    "", "K", "M", "B", "T", "Qd", "Qt", "Sx", "Sv", "O", "N", "D",
];

/// Format a point total for display.
///
/// Zero renders as `"0"`. Positive values below 1000 render with two
/// decimals. Larger values are divided by 1000 per magnitude step through
/// the suffix ladder and rendered with two decimals plus the suffix.
/// Negative values render plainly with no suffix logic.
pub fn format_points(value: f64) -> String {
    if value < 0.0 {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value < 1000.0 {
        return format!("{value:.2}");
    }

    let mut scaled = value;
    let mut magnitude = 0;
    while scaled >= 1000.0 && magnitude < SUFFIXES.len() - 1 {
        scaled /= 1000.0;
        magnitude += 1;
    }
    format!("{scaled:.2}{}", SUFFIXES[magnitude])
}

// ===========================================================================
// Tests
// ===========================================================================
