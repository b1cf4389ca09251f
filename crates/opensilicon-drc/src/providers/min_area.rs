use opensilicon_core::GeomPrimitive;

use crate::error::DrcError;
use crate::provider::{RunContext, TestProvider};
use crate::rules::ConstraintType;

/// Minimum copper area for rectangles and polygons.
pub struct MinAreaProvider;

fn format_mm2(nm2: f64) -> String {
    let mm2 = nm2 / 1e12;
    let text = format!("{mm2:.6}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} mm²")
}

impl TestProvider for MinAreaProvider {
    fn name(&self) -> &str {
        "min_area"
    }

    fn required_constraints(&self) -> Vec<ConstraintType> {
        vec![ConstraintType::MinArea]
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<(), DrcError> {
        let items = ctx.items();
        for (i, item) in items.iter().enumerate() {
            if !ctx.checkpoint(i, items.len()) {
                break;
            }
            let (layer, area) = match &item.shape {
                GeomPrimitive::Rect(r) => (r.layer_id, r.area()),
                GeomPrimitive::Polygon(p) => (p.layer_id, p.area()),
                _ => continue,
            };
            let Some(hit) = ctx.resolve(ConstraintType::MinArea, item, None, Some(layer))? else {
                continue;
            };
            let Some(min) = hit.constraint.min() else { continue };
            if area >= min {
                continue;
            }
            let message = format!(
                "area {} is below minimum {}",
                format_mm2(area),
                format_mm2(min)
            );
            let mut violation = ctx
                .violation(&hit, message)
                .on_layer(layer)
                .with_items([item.id]);
            if let Some(bbox) = item.bbox() {
                violation = violation.at(bbox.to_array());
            }
            ctx.report(violation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::{design, run_one, F_CU};
    use opensilicon_core::{LayoutItem, Point, Polygon, Rect};

    #[test]
    fn test_small_shapes_are_reported() {
        let tiny_rect = LayoutItem::new(GeomPrimitive::Rect(Rect::new(
            F_CU, 0.0, 0.0, 500_000.0, 500_000.0,
        )));
        let big_rect = LayoutItem::new(GeomPrimitive::Rect(Rect::new(
            F_CU, 0.0, 0.0, 2_000_000.0, 2_000_000.0,
        )));
        let triangle = LayoutItem::new(GeomPrimitive::Polygon(Polygon::new(
            F_CU,
            vec![
                Point::new(0.0, 0.0),
                Point::new(1_000_000.0, 0.0),
                Point::new(0.0, 1_000_000.0),
            ],
        )));
        let db = design(vec![tiny_rect, big_rect, triangle]);
        let report = run_one(
            Box::new(MinAreaProvider),
            "(rule r (constraint min_area (min 1mm)))",
            &db,
        );
        assert_eq!(report.violations.len(), 2);
        assert_eq!(
            report.violations[0].message,
            "area 0.25 mm² is below minimum 1 mm²"
        );
        assert!(report.violations[1].message.starts_with("area 0.5 mm²"));
    }
}
