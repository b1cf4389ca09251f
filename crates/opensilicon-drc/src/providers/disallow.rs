use crate::error::DrcError;
use crate::provider::{RunContext, TestProvider};
use crate::rules::ConstraintType;

/// Reports items whose kind is listed by a `disallow` constraint.
pub struct DisallowProvider;

impl TestProvider for DisallowProvider {
    fn name(&self) -> &str {
        "disallow"
    }

    fn required_constraints(&self) -> Vec<ConstraintType> {
        vec![ConstraintType::Disallow]
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<(), DrcError> {
        let items = ctx.items();
        for (i, item) in items.iter().enumerate() {
            if !ctx.checkpoint(i, items.len()) {
                break;
            }
            // Multi-layer items (vias) are resolved without an active layer.
            let layers = item.layers();
            let layer = match layers.as_slice() {
                [single] => Some(*single),
                _ => None,
            };
            let Some(hit) = ctx.resolve(ConstraintType::Disallow, item, None, layer)? else {
                continue;
            };
            let keyword = item.kind().keyword();
            if !hit.constraint.categories().iter().any(|c| c == keyword) {
                continue;
            }
            let location = layer
                .map(|l| format!(" on {}", ctx.layers().layer_name(l)))
                .unwrap_or_default();
            let mut violation = ctx
                .violation(&hit, format!("{} is not allowed{location}", item.kind()))
                .with_items([item.id]);
            if let Some(l) = layer {
                violation = violation.on_layer(l);
            }
            if let Some(bbox) = item.bbox() {
                violation = violation.at(bbox.to_array());
            }
            ctx.report(violation);
        }
        Ok(())
    }
}
