//! Length units accepted in rule documents and condition expressions.
//!
//! The canonical internal unit is the nanometer.

/// Nanometers per unit for every recognised suffix.
const UNITS: &[(&str, f64)] = &[
    ("nm", 1.0),
    ("um", 1_000.0),
    ("mm", 1_000_000.0),
    ("mil", 25_400.0),
    ("in", 25_400_000.0),
];

/// Scale factor for a unit suffix, or `None` if the suffix is unknown.
pub fn unit_scale(suffix: &str) -> Option<f64> {
    UNITS
        .iter()
        .find(|(name, _)| *name == suffix)
        .map(|(_, scale)| *scale)
}

/// Parse a length such as `0.2mm`, `10mil` or `150`.
///
/// A bare number is interpreted in `default_unit`.
pub fn parse_length(text: &str, default_unit: &str) -> Option<f64> {
    let split = text
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(text.len());
    let (number, suffix) = text.split_at(split);
    let value: f64 = number.parse().ok()?;
    let scale = if suffix.is_empty() {
        unit_scale(default_unit)?
    } else {
        unit_scale(suffix)?
    };
    Some(value * scale)
}

/// Render a canonical length in millimetres for messages.
pub fn format_mm(nm: f64) -> String {
    let mm = nm / 1_000_000.0;
    let text = format!("{mm:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} mm")
}
