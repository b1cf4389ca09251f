use opensilicon_core::GeomPrimitive;

use super::bound_violation;
use crate::error::DrcError;
use crate::provider::{RunContext, TestProvider};
use crate::rules::ConstraintType;

/// Checks via landing sizes. Vias span several layers, so they are resolved
/// without an active layer and only layer-unfiltered rules apply to them.
pub struct ViaDiameterProvider;

impl TestProvider for ViaDiameterProvider {
    fn name(&self) -> &str {
        "via_diameter"
    }

    fn required_constraints(&self) -> Vec<ConstraintType> {
        vec![ConstraintType::ViaDiameter]
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<(), DrcError> {
        let items = ctx.items();
        for (i, item) in items.iter().enumerate() {
            if !ctx.checkpoint(i, items.len()) {
                break;
            }
            let GeomPrimitive::Via(via) = &item.shape else {
                continue;
            };
            let Some(hit) = ctx.resolve(ConstraintType::ViaDiameter, item, None, None)? else {
                continue;
            };
            let Some(bound) = hit.constraint.bound() else { continue };
            if let Some(message) = bound_violation("via diameter", via.size(), bound) {
                ctx.report(
                    ctx.violation(&hit, message)
                        .at(via.bbox().to_array())
                        .with_items([item.id]),
                );
            }
        }
        Ok(())
    }
}
