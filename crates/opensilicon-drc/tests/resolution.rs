//! End-to-end resolution behaviour: rule order, fail-closed conditions,
//! aggregate queries and provider negotiation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use opensilicon_core::{GeomPrimitive, Layer, LayerKind, LayerStack, LayoutItem, Path, Point, Rect};
use opensilicon_drc::expr::EvalContext;
use opensilicon_drc::{
    parse_rules, ConstraintRegistry, ConstraintType, DiagnosticLevel, DrcEngine, DrcError,
    NullReporter, ProviderState, Rule, RunContext, TestProvider, WorstCase,
};

const F_CU: u32 = 0;
const B_CU: u32 = 31;

fn layers() -> LayerStack {
    let mut stack = LayerStack::new();
    stack.add_layer(Layer::new(F_CU, "F.Cu", LayerKind::Conductor));
    stack.add_layer(Layer::new(B_CU, "B.Cu", LayerKind::Conductor));
    stack
}

fn registry(doc: &str) -> ConstraintRegistry {
    let parsed = parse_rules(doc);
    let rules: Vec<Arc<Rule>> = parsed.rules.into_iter().map(Arc::new).collect();
    ConstraintRegistry::build(&rules, ConstraintType::ALL)
}

fn track(net_class: &str, width: f64) -> LayoutItem {
    LayoutItem::new(GeomPrimitive::Path(Path::new(
        F_CU,
        vec![Point::new(0.0, 0.0), Point::new(1_000_000.0, 0.0)],
        width,
    )))
    .with_net_class(net_class)
}

fn resolved_min(reg: &ConstraintRegistry, ctx: &EvalContext<'_>) -> Option<f64> {
    reg.resolve(ConstraintType::Clearance, ctx)
        .unwrap()
        .and_then(|hit| hit.constraint.min())
}

#[test]
fn earlier_rule_wins_regardless_of_value() {
    let stack = layers();
    let a = track("Signal", 200_000.0);
    let b = track("Signal", 200_000.0);
    let ctx = EvalContext::new(&stack).with_first(&a).with_second(&b);

    let loose_first = registry(
        r#"(rule loose (condition "A.Width > 0") (constraint clearance (min 0.1mm)))
           (rule tight (condition "A.Width > 0") (constraint clearance (min 0.5mm)))"#,
    );
    let tight_first = registry(
        r#"(rule tight (condition "A.Width > 0") (constraint clearance (min 0.5mm)))
           (rule loose (condition "A.Width > 0") (constraint clearance (min 0.1mm)))"#,
    );
    assert_eq!(resolved_min(&loose_first, &ctx), Some(100_000.0));
    assert_eq!(resolved_min(&tight_first, &ctx), Some(500_000.0));
}

#[test]
fn unconditional_rule_shadows_more_specific_later_rule() {
    let stack = layers();
    let reg = registry(
        r#"(rule R1 (constraint clearance (min 100nm)))
           (rule R2 (condition "L == 'F.Cu'") (constraint clearance (min 200nm)))"#,
    );
    let a = track("Signal", 1.0);
    let b = track("Signal", 1.0);
    let ctx = EvalContext::new(&stack)
        .with_first(&a)
        .with_second(&b)
        .with_layer(F_CU);
    let hit = reg
        .resolve(ConstraintType::Clearance, &ctx)
        .unwrap()
        .unwrap();
    assert_eq!(hit.rule.name, "R1");
    assert_eq!(hit.constraint.min(), Some(100.0));
}

#[test]
fn later_rule_is_reachable_when_it_comes_first() {
    let stack = layers();
    let reg = registry(
        r#"(rule R2 (condition "L == 'F.Cu'") (constraint clearance (min 200nm)))
           (rule R1 (constraint clearance (min 100nm)))"#,
    );
    let a = track("Signal", 1.0);
    let on_top = EvalContext::new(&stack).with_first(&a).with_layer(F_CU);
    let on_bottom = EvalContext::new(&stack).with_first(&a).with_layer(B_CU);
    assert_eq!(resolved_min(&reg, &on_top), Some(200.0));
    assert_eq!(resolved_min(&reg, &on_bottom), Some(100.0));
}

#[test]
fn conditions_on_missing_fields_never_match() {
    let stack = layers();
    let reg = registry(
        r#"(rule vias (condition "A.Drill > 0 || A.TopLayer == 'F.Cu'") (constraint clearance (min 1mm)))
           (rule size (condition "A.VertexCount != 3") (constraint clearance (min 2mm)))
           (rule base (constraint clearance (min 0.1mm)))"#,
    );
    assert!(parse_rules("(rule x (condition \"A.Drill > 0\") (constraint clearance (min 1mm)))")
        .diagnostics
        .is_empty());

    let rect = LayoutItem::new(GeomPrimitive::Rect(Rect::new(F_CU, 0.0, 0.0, 1e6, 1e6)));
    let ctx = EvalContext::new(&stack).with_first(&rect);
    let hit = reg
        .resolve(ConstraintType::Clearance, &ctx)
        .unwrap()
        .unwrap();
    assert_eq!(hit.rule.name, "base");
}

#[test]
fn broken_condition_keeps_rule_but_never_matches() {
    let stack = layers();
    let parsed = parse_rules(
        r#"(rule broken (condition "A.Width >> 1") (constraint clearance (min 5mm)))
           (rule base (constraint clearance (min 0.1mm)))"#,
    );
    assert_eq!(parsed.rules.len(), 2);
    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(parsed.diagnostics[0].level, DiagnosticLevel::Warning);

    let rules: Vec<Arc<Rule>> = parsed.rules.into_iter().map(Arc::new).collect();
    let reg = ConstraintRegistry::build(&rules, [ConstraintType::Clearance]);
    let a = track("Signal", 1.0);
    let ctx = EvalContext::new(&stack).with_first(&a);
    assert_eq!(resolved_min(&reg, &ctx), Some(100_000.0));
    // Still visible to aggregate queries.
    let worst = reg
        .worst(ConstraintType::Clearance, WorstCase::LargestMin)
        .unwrap()
        .unwrap();
    assert_eq!(worst.rule.name, "broken");
}

#[test]
fn misspelled_clause_does_not_widen_a_rule() {
    let stack = layers();
    let reg = registry(
        r#"(rule hv (condtion "A.NetClass == 'HV'") (constraint clearance (min 5mm)))
           (rule base (constraint clearance (min 0.1mm)))"#,
    );
    let signal = LayoutItem::new(GeomPrimitive::Rect(Rect::new(F_CU, 0.0, 0.0, 1e6, 1e6)))
        .with_net("SIG");
    let ctx = EvalContext::new(&stack).with_first(&signal);
    let hit = reg
        .resolve(ConstraintType::Clearance, &ctx)
        .unwrap()
        .unwrap();
    assert_eq!(hit.rule.name, "base");
    assert_eq!(hit.constraint.min(), Some(100_000.0));
}

#[test]
fn unnamed_rule_keeps_its_slot_and_constraints() {
    let stack = layers();
    let parsed = parse_rules(
        r#"(rule (condition "A.Net == 'X'") (constraint clearance (min 5mm)))
           (rule base (constraint clearance (min 0.1mm)))"#,
    );
    assert_eq!(parsed.rules.len(), 2);
    assert_eq!(parsed.rules[1].priority, 1);

    let rules: Vec<Arc<Rule>> = parsed.rules.into_iter().map(Arc::new).collect();
    let reg = ConstraintRegistry::build(&rules, [ConstraintType::Clearance]);
    let x = track("Signal", 1.0).with_net("X");
    let ctx = EvalContext::new(&stack).with_first(&x);
    let hit = reg
        .resolve(ConstraintType::Clearance, &ctx)
        .unwrap()
        .unwrap();
    assert_eq!(hit.rule.name, "base");

    let worst = reg
        .worst(ConstraintType::Clearance, WorstCase::LargestMin)
        .unwrap()
        .unwrap();
    assert_eq!(worst.constraint.min(), Some(5_000_000.0));
    assert_eq!(worst.rule.priority, 0);
}

#[test]
fn nets_with_glob_characters_compare_literally() {
    let stack = layers();
    let reg = registry(
        r#"(rule same (condition "A.Net == B.Net") (constraint clearance (min 1mm)))
           (rule base (constraint clearance (min 0.1mm)))"#,
    );
    let a = track("Signal", 1.0).with_net("N?");
    let b = track("Signal", 1.0).with_net("N1");
    let ctx = EvalContext::new(&stack).with_first(&a).with_second(&b);
    assert_eq!(resolved_min(&reg, &ctx), Some(100_000.0));
    let twin = track("Signal", 1.0).with_net("N?");
    let ctx = EvalContext::new(&stack).with_first(&a).with_second(&twin);
    assert_eq!(resolved_min(&reg, &ctx), Some(1_000_000.0));
}

#[test]
fn build_is_idempotent() {
    let doc = r#"
        (rule hv (condition "A.NetClass == 'HV'") (constraint clearance (min 1mm)))
        (rule w (constraint track_width (min 0.1mm) (max 2mm)))
        (rule base (constraint clearance (min 0.2mm)))
    "#;
    let rules: Vec<Arc<Rule>> = parse_rules(doc).rules.into_iter().map(Arc::new).collect();
    let first = ConstraintRegistry::build(&rules, ConstraintType::ALL);
    let second = ConstraintRegistry::build(&rules, ConstraintType::ALL);

    let stack = layers();
    let items = [track("HV", 1.0), track("Signal", 1.0)];
    for a in &items {
        for b in &items {
            let ctx = EvalContext::new(&stack).with_first(a).with_second(b);
            for kind in ConstraintType::ALL {
                let x = first.resolve(kind, &ctx).unwrap().map(|h| h.constraint.clone());
                let y = second.resolve(kind, &ctx).unwrap().map(|h| h.constraint.clone());
                assert_eq!(x, y);
            }
        }
    }
    for kind in ConstraintType::ALL {
        for case in [
            WorstCase::LargestMin,
            WorstCase::SmallestMin,
            WorstCase::LargestMax,
            WorstCase::SmallestMax,
        ] {
            let x = first.worst(kind, case).unwrap().map(|h| h.constraint.clone());
            let y = second.worst(kind, case).unwrap().map(|h| h.constraint.clone());
            assert_eq!(x, y);
        }
    }
}

#[test]
fn largest_min_bounds_every_entry() {
    let reg = registry(
        r#"(rule a (condition "A.NetClass == 'HV'") (constraint clearance (min 1.2mm)))
           (rule b (layer "B.*") (constraint clearance (min 0.3mm)))
           (rule c (constraint clearance (min 0.2mm)))
           (rule d (disabled) (constraint clearance (min 9mm)))"#,
    );
    let worst = reg
        .worst(ConstraintType::Clearance, WorstCase::LargestMin)
        .unwrap()
        .and_then(|w| w.constraint.min())
        .unwrap();
    for entry in reg.entries(ConstraintType::Clearance).unwrap() {
        assert!(worst >= entry.constraint().min().unwrap());
    }
    assert_eq!(worst, 1_200_000.0);
}

#[test]
fn concurrent_queries_agree() {
    let stack = layers();
    let reg = registry(
        r#"(rule hv (condition "A.NetClass == 'HV' || B.NetClass == 'HV'") (constraint clearance (min 1mm)))
           (rule base (constraint clearance (min 0.2mm)))"#,
    );
    let hv = track("HV", 1.0);
    let signal = track("Signal", 1.0);

    std::thread::scope(|s| {
        for t in 0..4 {
            let (reg, stack, hv, signal) = (&reg, &stack, &hv, &signal);
            s.spawn(move || {
                for i in 0..500 {
                    let first = if (i + t) % 2 == 0 { hv } else { signal };
                    let ctx = EvalContext::new(stack).with_first(first).with_second(signal);
                    let expected = if std::ptr::eq(first, hv) { 1_000_000.0 } else { 200_000.0 };
                    assert_eq!(resolved_min(reg, &ctx), Some(expected));
                }
            });
        }
    });
}

struct AreaCheck {
    needs: Vec<ConstraintType>,
    runs: Arc<AtomicUsize>,
}

impl TestProvider for AreaCheck {
    fn name(&self) -> &str {
        "area_check"
    }

    fn required_constraints(&self) -> Vec<ConstraintType> {
        self.needs.clone()
    }

    fn run(&self, _ctx: &RunContext<'_>) -> Result<(), DrcError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn provider_without_backing_rules_is_never_run() {
    let mut engine = DrcEngine::default();
    engine.load_rules(
        r#"(rule r (constraint clearance (min 0.2mm)))
           (rule off (disabled) (constraint min_area (min 1mm)))"#,
    );
    let runs = Arc::new(AtomicUsize::new(0));
    let handle = engine.register_provider(Box::new(AreaCheck {
        needs: vec![ConstraintType::Clearance, ConstraintType::MinArea],
        runs: Arc::clone(&runs),
    }));

    let report = engine.run(&opensilicon_core::LayoutDatabase::new("empty"), &NullReporter);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(engine.provider_state(handle).unwrap(), ProviderState::Skipped);
    assert_eq!(report.providers_skipped, ["area_check"]);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.message.contains("area_check") && d.message.contains("min_area")));
}

#[test]
fn built_in_providers_end_to_end() {
    let json = r#"{
        "name": "demo",
        "layer_stack": { "layers": [
            { "id": 0, "name": "F.Cu", "kind": "Conductor" },
            { "id": 31, "name": "B.Cu", "kind": "Conductor" }
        ] },
        "items": [
            { "name": "p1", "net": "GND", "shape": { "Rect": {
                "layer_id": 0, "lower_left": { "x": 0, "y": 0 },
                "upper_right": { "x": 1000000, "y": 1000000 } } } },
            { "name": "p2", "net": "VCC", "shape": { "Rect": {
                "layer_id": 0, "lower_left": { "x": 1050000, "y": 0 },
                "upper_right": { "x": 2050000, "y": 1000000 } } } },
            { "name": "t1", "net": "VCC", "shape": { "Path": {
                "layer_id": 31, "points": [ { "x": 0, "y": 0 }, { "x": 5000000, "y": 0 } ],
                "width": 50000 } } }
        ]
    }"#;
    let design = opensilicon_core::LayoutDatabase::from_json(json).unwrap();

    let mut engine = DrcEngine::default();
    engine.load_rules(
        r#"(version 1)
           (rule default
             (constraint clearance (min 0.2mm))
             (constraint track_width (min 0.1mm)))"#,
    );
    for provider in opensilicon_drc::providers::builtin() {
        engine.register_provider(provider);
    }
    let report = engine.run(&design, &NullReporter);

    assert_eq!(report.providers_run, ["clearance", "track_width"]);
    assert_eq!(
        report.providers_skipped,
        ["via_diameter", "min_area", "disallow"]
    );
    let kinds: Vec<ConstraintType> = report.violations.iter().map(|v| v.constraint).collect();
    assert_eq!(kinds, [ConstraintType::Clearance, ConstraintType::TrackWidth]);
    assert!(report.has_errors());
    assert!(!report.cancelled);
}
