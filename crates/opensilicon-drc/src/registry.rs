//! Constraint registry: the per-type index of rule constraints that every
//! query runs against.
//!
//! The registry is built once per verification run from the parsed rules and
//! the constraint types the registered providers asked for. After that it is
//! read-only and can be shared between threads without locking.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::diagnostics::Diagnostic;
use crate::error::DrcError;
use crate::expr::{evaluate_condition, EvalContext};
use crate::rules::{Constraint, ConstraintType, Rule};

/// One (rule, constraint) pair in a type's priority list.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    rule: Arc<Rule>,
    index: usize,
}

impl RegistryEntry {
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn constraint(&self) -> &Constraint {
        &self.rule.constraints[self.index]
    }

    fn matches(&self, ctx: &EvalContext<'_>) -> bool {
        if !self.rule.applies_to_layer(ctx.layer, ctx.layers) {
            return false;
        }
        match &self.rule.condition {
            None => true,
            Some(code) => evaluate_condition(code, ctx),
        }
    }
}

/// The constraint that answered a query, together with the rule that declared it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedConstraint<'r> {
    pub rule: &'r Rule,
    pub constraint: &'r Constraint,
}

impl<'r> ResolvedConstraint<'r> {
    fn from_entry(entry: &'r RegistryEntry) -> Self {
        Self {
            rule: entry.rule(),
            constraint: entry.constraint(),
        }
    }
}

/// Aggregators for [`ConstraintRegistry::worst`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorstCase {
    LargestMin,
    SmallestMin,
    LargestMax,
    SmallestMax,
}

impl WorstCase {
    fn pick(self, constraint: &Constraint) -> Option<f64> {
        let bound = constraint.bound()?;
        match self {
            WorstCase::LargestMin | WorstCase::SmallestMin => bound.min,
            WorstCase::LargestMax | WorstCase::SmallestMax => bound.max,
        }
    }

    fn prefers(self, candidate: f64, best: f64) -> bool {
        match self {
            WorstCase::LargestMin | WorstCase::LargestMax => candidate > best,
            WorstCase::SmallestMin | WorstCase::SmallestMax => candidate < best,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    entries: BTreeMap<ConstraintType, Vec<RegistryEntry>>,
}

impl ConstraintRegistry {
    /// Index the enabled rules' constraints for each requested type, in rule order.
    ///
    /// A requested type with no matching constraint still gets an (empty)
    /// list, so it counts as registered.
    pub fn build(
        rules: &[Arc<Rule>],
        requested: impl IntoIterator<Item = ConstraintType>,
    ) -> Self {
        let mut entries = BTreeMap::new();
        for kind in requested {
            if entries.contains_key(&kind) {
                continue;
            }
            let list: Vec<RegistryEntry> = rules
                .iter()
                .filter(|rule| rule.enabled)
                .flat_map(|rule| {
                    rule.constraints_of(kind).map(move |(index, _)| RegistryEntry {
                        rule: Arc::clone(rule),
                        index,
                    })
                })
                .collect();
            debug!("registry: {} entr(ies) for {kind}", list.len());
            entries.insert(kind, list);
        }
        Self { entries }
    }

    pub fn is_registered(&self, kind: ConstraintType) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn requested_types(&self) -> impl Iterator<Item = ConstraintType> + '_ {
        self.entries.keys().copied()
    }

    pub fn entries(&self, kind: ConstraintType) -> Result<&[RegistryEntry], DrcError> {
        self.entries
            .get(&kind)
            .map(Vec::as_slice)
            .ok_or(DrcError::UnregisteredConstraint(kind))
    }

    /// Number of entries for `kind`; zero for types nobody requested.
    pub fn entry_count(&self, kind: ConstraintType) -> usize {
        self.entries.get(&kind).map_or(0, Vec::len)
    }

    /// First-match lookup. Entries are tried in rule order; the first whose
    /// layer filter and condition both accept `ctx` wins, however loose its
    /// value is compared to later entries.
    pub fn resolve(
        &self,
        kind: ConstraintType,
        ctx: &EvalContext<'_>,
    ) -> Result<Option<ResolvedConstraint<'_>>, DrcError> {
        Ok(self
            .entries(kind)?
            .iter()
            .find(|entry| entry.matches(ctx))
            .map(ResolvedConstraint::from_entry))
    }

    /// The most extreme bound across every entry of `kind`, ignoring conditions
    /// and layer filters. Ties go to the earlier rule.
    pub fn worst(
        &self,
        kind: ConstraintType,
        case: WorstCase,
    ) -> Result<Option<ResolvedConstraint<'_>>, DrcError> {
        let mut best: Option<(f64, &RegistryEntry)> = None;
        for entry in self.entries(kind)? {
            let Some(value) = case.pick(entry.constraint()) else {
                continue;
            };
            if best.map_or(true, |(current, _)| case.prefers(value, current)) {
                best = Some((value, entry));
            }
        }
        Ok(best.map(|(_, entry)| ResolvedConstraint::from_entry(entry)))
    }

    /// Info diagnostics for unconditional, unfiltered entries that hide every
    /// later entry of the same type from [`resolve`](Self::resolve).
    pub fn shadowing_diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for (kind, list) in &self.entries {
            let Some(pos) = list.iter().position(|e| e.rule().is_unconditional()) else {
                continue;
            };
            let hidden = list.len() - pos - 1;
            if hidden == 0 {
                continue;
            }
            let rule = list[pos].rule();
            out.push(
                Diagnostic::info(format!(
                    "unconditional {kind} constraint shadows {hidden} later {kind} entr(ies)"
                ))
                .at_line(rule.line)
                .in_rule(&rule.name),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::parse_rules;
    use opensilicon_core::{
        GeomPrimitive, Layer, LayerKind, LayerStack, LayoutItem, Path, Point, Rect,
    };

    fn layers() -> LayerStack {
        let mut stack = LayerStack::new();
        stack.add_layer(Layer::new(0, "F.Cu", LayerKind::Conductor));
        stack.add_layer(Layer::new(31, "B.Cu", LayerKind::Conductor));
        stack
    }

    fn registry(doc: &str, kinds: &[ConstraintType]) -> ConstraintRegistry {
        let rules: Vec<Arc<Rule>> = parse_rules(doc).rules.into_iter().map(Arc::new).collect();
        ConstraintRegistry::build(&rules, kinds.iter().copied())
    }

    fn track(net_class: &str) -> LayoutItem {
        LayoutItem::new(GeomPrimitive::Path(Path::new(
            0,
            vec![Point::new(0.0, 0.0), Point::new(1e6, 0.0)],
            2e5,
        )))
        .with_net_class(net_class)
    }

    const DOC: &str = r#"
        (rule hv
          (condition "A.NetClass == 'HV' || B.NetClass == 'HV'")
          (constraint clearance (min 1.5mm)))
        (rule outer (layer "F.*") (constraint clearance (min 0.3mm)))
        (rule off (disabled) (constraint clearance (min 9mm)))
        (rule default
          (constraint clearance (min 0.2mm))
          (constraint track_width (min 0.1mm) (max 3mm)))
    "#;

    #[test]
    fn test_build_skips_disabled_and_keeps_order() {
        let reg = registry(DOC, &[ConstraintType::Clearance, ConstraintType::MinArea]);
        let names: Vec<&str> = reg
            .entries(ConstraintType::Clearance)
            .unwrap()
            .iter()
            .map(|e| e.rule().name.as_str())
            .collect();
        assert_eq!(names, ["hv", "outer", "default"]);
        assert!(reg.is_registered(ConstraintType::MinArea));
        assert_eq!(reg.entry_count(ConstraintType::MinArea), 0);
        assert!(!reg.is_registered(ConstraintType::TrackWidth));
    }

    #[test]
    fn test_resolve_first_match() {
        let stack = layers();
        let reg = registry(DOC, &[ConstraintType::Clearance]);
        let (hv, plain) = (track("HV"), track("Signal"));

        let ctx = EvalContext::new(&stack).with_first(&plain).with_second(&hv);
        let hit = reg.resolve(ConstraintType::Clearance, &ctx).unwrap().unwrap();
        assert_eq!(hit.rule.name, "hv");

        let ctx = EvalContext::new(&stack)
            .with_first(&plain)
            .with_second(&plain)
            .with_layer(0);
        let hit = reg.resolve(ConstraintType::Clearance, &ctx).unwrap().unwrap();
        assert_eq!(hit.constraint.min(), Some(300_000.0));

        let ctx = ctx.with_layer(31);
        let hit = reg.resolve(ConstraintType::Clearance, &ctx).unwrap().unwrap();
        assert_eq!(hit.rule.name, "default");
    }

    #[test]
    fn test_no_match_is_none() {
        let stack = layers();
        let reg = registry(
            r#"(rule hv (condition "A.NetClass == 'HV'") (constraint clearance (min 1mm)))"#,
            &[ConstraintType::Clearance],
        );
        let item = track("Signal");
        let ctx = EvalContext::new(&stack).with_first(&item);
        assert!(reg.resolve(ConstraintType::Clearance, &ctx).unwrap().is_none());
    }

    #[test]
    fn test_unregistered_type_is_an_error() {
        let stack = layers();
        let reg = registry(DOC, &[ConstraintType::Clearance]);
        let ctx = EvalContext::new(&stack);
        assert!(matches!(
            reg.resolve(ConstraintType::TrackWidth, &ctx),
            Err(DrcError::UnregisteredConstraint(ConstraintType::TrackWidth))
        ));
        assert!(reg.worst(ConstraintType::Disallow, WorstCase::LargestMin).is_err());
    }

    #[test]
    fn test_worst_ignores_conditions() {
        let reg = registry(DOC, &[ConstraintType::Clearance, ConstraintType::TrackWidth]);
        let worst = reg
            .worst(ConstraintType::Clearance, WorstCase::LargestMin)
            .unwrap()
            .unwrap();
        assert_eq!(worst.rule.name, "hv");
        let least = reg
            .worst(ConstraintType::Clearance, WorstCase::SmallestMin)
            .unwrap()
            .unwrap();
        assert_eq!(least.constraint.min(), Some(200_000.0));
        assert!(reg
            .worst(ConstraintType::Clearance, WorstCase::LargestMax)
            .unwrap()
            .is_none());
        let max = reg
            .worst(ConstraintType::TrackWidth, WorstCase::SmallestMax)
            .unwrap()
            .unwrap();
        assert_eq!(max.constraint.bound().and_then(|b| b.max), Some(3_000_000.0));
    }

    #[test]
    fn test_worst_skips_categorical() {
        let reg = registry(
            "(rule r (constraint disallow via track))",
            &[ConstraintType::Disallow],
        );
        assert_eq!(reg.entry_count(ConstraintType::Disallow), 1);
        assert!(reg
            .worst(ConstraintType::Disallow, WorstCase::LargestMin)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_rect_on_unknown_field_falls_through() {
        let stack = layers();
        let reg = registry(
            r#"(rule long (condition "A.Length > 1mm") (constraint clearance (min 1mm)))
               (rule base (constraint clearance (min 0.1mm)))"#,
            &[ConstraintType::Clearance],
        );
        let rect = LayoutItem::new(GeomPrimitive::Rect(Rect::new(0, 0.0, 0.0, 5e6, 5e6)));
        let ctx = EvalContext::new(&stack).with_first(&rect);
        let hit = reg.resolve(ConstraintType::Clearance, &ctx).unwrap().unwrap();
        assert_eq!(hit.rule.name, "base");
    }

    #[test]
    fn test_shadowing_diagnostics() {
        let reg = registry(
            r#"(rule base (constraint clearance (min 0.1mm)))
               (rule hv (condition "A.NetClass == 'HV'") (constraint clearance (min 1mm)))"#,
            &[ConstraintType::Clearance],
        );
        let diags = reg.shadowing_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule.as_deref(), Some("base"));

        let reg = registry(DOC, &[ConstraintType::Clearance]);
        assert!(reg.shadowing_diagnostics().is_empty());
    }
}
