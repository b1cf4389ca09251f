//! Built-in test providers.

pub mod clearance;
pub mod disallow;
pub mod min_area;
pub mod track_width;
pub mod via_diameter;

pub use clearance::ClearanceProvider;
pub use disallow::DisallowProvider;
pub use min_area::MinAreaProvider;
pub use track_width::TrackWidthProvider;
pub use via_diameter::ViaDiameterProvider;

use crate::provider::TestProvider;
use crate::rules::MinOptMax;
use crate::units::format_mm;

/// Every built-in provider, in the order the CLI registers them.
pub fn builtin() -> Vec<Box<dyn TestProvider>> {
    vec![
        Box::new(ClearanceProvider),
        Box::new(TrackWidthProvider),
        Box::new(ViaDiameterProvider),
        Box::new(MinAreaProvider),
        Box::new(DisallowProvider),
    ]
}

/// Describe how `actual` breaks `bound`, if it does.
pub(crate) fn bound_violation(what: &str, actual: f64, bound: &MinOptMax) -> Option<String> {
    if let Some(min) = bound.min.filter(|min| actual < *min) {
        return Some(format!(
            "{what} {} is below minimum {}",
            format_mm(actual),
            format_mm(min)
        ));
    }
    if let Some(max) = bound.max.filter(|max| actual > *max) {
        return Some(format!(
            "{what} {} exceeds maximum {}",
            format_mm(actual),
            format_mm(max)
        ));
    }
    None
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_violation_messages() {
        let bound = MinOptMax {
            min: Some(100_000.0),
            opt: None,
            max: Some(1_000_000.0),
        };
        assert_eq!(bound_violation("width", 500_000.0, &bound), None);
        assert_eq!(
            bound_violation("width", 50_000.0, &bound).as_deref(),
            Some("width 0.05 mm is below minimum 0.1 mm")
        );
        assert_eq!(
            bound_violation("width", 2_000_000.0, &bound).as_deref(),
            Some("width 2 mm exceeds maximum 1 mm")
        );
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let mut names: Vec<String> = builtin().iter().map(|p| p.name().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }
}
