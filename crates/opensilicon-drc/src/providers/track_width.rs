use opensilicon_core::GeomPrimitive;

use super::bound_violation;
use crate::error::DrcError;
use crate::provider::{RunContext, TestProvider};
use crate::rules::ConstraintType;

/// Checks every track against the width bounds of its resolved rule.
pub struct TrackWidthProvider;

impl TestProvider for TrackWidthProvider {
    fn name(&self) -> &str {
        "track_width"
    }

    fn required_constraints(&self) -> Vec<ConstraintType> {
        vec![ConstraintType::TrackWidth]
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<(), DrcError> {
        let items = ctx.items();
        let mut checked = 0usize;

        for (i, item) in items.iter().enumerate() {
            if !ctx.checkpoint(i, items.len()) {
                break;
            }
            let GeomPrimitive::Path(track) = &item.shape else {
                continue;
            };
            checked += 1;
            let Some(hit) =
                ctx.resolve(ConstraintType::TrackWidth, item, None, Some(track.layer_id))?
            else {
                continue;
            };
            let Some(bound) = hit.constraint.bound() else { continue };
            if let Some(message) = bound_violation("track width", track.width, bound) {
                let mut violation = ctx
                    .violation(&hit, message)
                    .on_layer(track.layer_id)
                    .with_items([item.id]);
                if let Some(bbox) = item.bbox() {
                    violation = violation.at(bbox.to_array());
                }
                ctx.report(violation);
            }
        }

        ctx.report_aux(format!("track_width: {checked} track(s) checked"));
        Ok(())
    }
}
