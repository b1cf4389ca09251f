use log::debug;
use opensilicon_core::SpatialIndex;

use crate::error::DrcError;
use crate::provider::{RunContext, TestProvider};
use crate::registry::WorstCase;
use crate::rules::ConstraintType;
use crate::units::format_mm;

/// Copper-to-copper spacing between items on different nets.
///
/// The largest minimum clearance of any rule bounds the neighbourhood
/// searched around each item; each candidate pair then resolves its own
/// clearance per shared layer.
pub struct ClearanceProvider;

impl TestProvider for ClearanceProvider {
    fn name(&self) -> &str {
        "clearance"
    }

    fn required_constraints(&self) -> Vec<ConstraintType> {
        vec![ConstraintType::Clearance]
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<(), DrcError> {
        let Some(reach) = ctx
            .worst(ConstraintType::Clearance, WorstCase::LargestMin)?
            .and_then(|w| w.constraint.min())
        else {
            ctx.report_aux("clearance: no rule declares a minimum; nothing to check");
            return Ok(());
        };

        let items = ctx.items();
        let index = SpatialIndex::from_items(items);
        let mut pairs = 0usize;

        for (i, a) in items.iter().enumerate() {
            if !ctx.checkpoint(i, items.len()) {
                break;
            }
            let Some(a_box) = a.bbox() else { continue };

            for entry in index.query_region(&a_box.inflate(reach)) {
                if entry.item_index <= i {
                    continue;
                }
                let b = &items[entry.item_index];
                if a.same_net(b) {
                    continue;
                }
                let gap = a_box.gap_to(&entry.bbox);

                let b_layers = b.layers();
                for layer in a.layers().into_iter().filter(|l| b_layers.contains(l)) {
                    pairs += 1;
                    let Some(hit) =
                        ctx.resolve(ConstraintType::Clearance, a, Some(b), Some(layer))?
                    else {
                        continue;
                    };
                    let Some(min) = hit.constraint.min() else { continue };
                    if gap >= min {
                        continue;
                    }
                    let message = format!(
                        "clearance {} between '{}' and '{}' on {} is below minimum {}",
                        format_mm(gap),
                        a.name,
                        b.name,
                        ctx.layers().layer_name(layer),
                        format_mm(min)
                    );
                    ctx.report(
                        ctx.violation(&hit, message)
                            .on_layer(layer)
                            .at(a_box.union(&entry.bbox).to_array())
                            .with_items([a.id, b.id]),
                    );
                    // One report per pair.
                    break;
                }
            }
        }

        debug!("clearance: {pairs} layer pair(s) resolved, search reach {reach} nm");
        ctx.report_aux(format!(
            "clearance: {} item(s), {pairs} pair check(s)",
            items.len()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::{design, run_one, B_CU, F_CU, VIA_CUT};
    use crate::violation::Severity;
    use opensilicon_core::{GeomPrimitive, LayoutItem, Point, Rect, Via};

    fn pad(layer: u32, x: f64, net: &str) -> LayoutItem {
        LayoutItem::new(GeomPrimitive::Rect(Rect::new(
            layer,
            x,
            0.0,
            x + 1_000_000.0,
            1_000_000.0,
        )))
        .with_name(&format!("pad@{x}"))
        .with_net(net)
    }

    const RULES: &str = r#"
        (rule hv (condition "A.NetClass == 'HV' || B.NetClass == 'HV'")
          (constraint clearance (min 2mm)) (severity warning))
        (rule default (constraint clearance (min 0.2mm)))
    "#;

    #[test]
    fn test_close_pads_on_different_nets() {
        // 0.1 mm gap
        let db = design(vec![pad(F_CU, 0.0, "A"), pad(F_CU, 1_100_000.0, "B")]);
        let report = run_one(Box::new(ClearanceProvider), RULES, &db);
        assert_eq!(report.violations.len(), 1);
        let v = &report.violations[0];
        assert_eq!(v.rule_name, "default");
        assert_eq!(v.layer_id, Some(F_CU));
        assert_eq!(v.items.len(), 2);
        assert!(v.message.contains("0.1 mm"));
    }

    #[test]
    fn test_same_net_and_other_layers_are_ignored() {
        let db = design(vec![
            pad(F_CU, 0.0, "A"),
            pad(F_CU, 1_100_000.0, "A"),
            pad(B_CU, 1_050_000.0, "C"),
        ]);
        let report = run_one(Box::new(ClearanceProvider), RULES, &db);
        assert!(report.violations.is_empty(), "{:?}", report.violations);
    }

    #[test]
    fn test_condition_selects_larger_clearance() {
        // 1 mm gap: fine for default, too small for HV
        let db = design(vec![
            pad(F_CU, 0.0, "A"),
            pad(F_CU, 2_000_000.0, "B").with_net_class("HV"),
        ]);
        let report = run_one(Box::new(ClearanceProvider), RULES, &db);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule_name, "hv");
        assert_eq!(report.violations[0].severity, Severity::Warning);
    }

    #[test]
    fn test_via_shares_layers_with_pads() {
        let via = LayoutItem::new(GeomPrimitive::Via(Via::new(
            F_CU,
            B_CU,
            VIA_CUT,
            Point::new(1_300_000.0, 500_000.0),
            400_000.0,
            400_000.0,
        )))
        .with_net("B");
        let db = design(vec![pad(F_CU, 0.0, "A"), via]);
        let report = run_one(Box::new(ClearanceProvider), RULES, &db);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].layer_id, Some(F_CU));
    }
}
