//! Rule document parser.
//!
//! ```text
//! (version 1)
//! (rule "HV clearance"
//!   (layer "F.*")
//!   (condition "A.NetClass == 'HV'")
//!   (constraint clearance (min 0.5mm))
//!   (severity warning))
//! ```
//!
//! Problems are localised to the clause or rule that caused them and
//! reported as diagnostics; parsing always continues with the next form.

use log::{debug, warn};
use opensilicon_core::Pattern;

use super::constraint::{Constraint, ConstraintType, ConstraintValue, MinOptMax};
use super::rule::Rule;
use super::sexpr::{read_document, SExpr};
use crate::diagnostics::Diagnostic;
use crate::expr::{compile, CompiledExpression, SlotTable};
use crate::units;
use crate::violation::Severity;

pub const SUPPORTED_VERSION: &str = "1";

/// Unit applied to constraint values written without a suffix.
pub const DEFAULT_VALUE_UNIT: &str = "mm";

/// Keywords accepted by categorical `disallow` constraints.
pub const DISALLOW_KEYWORDS: &[&str] = &["rect", "polygon", "track", "via"];

/// Output of [`parse_rules`]: rules in document order plus everything worth telling the user.
#[derive(Debug, Clone, Default)]
pub struct ParsedRules {
    pub rules: Vec<Rule>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a rule document, compiling conditions against the default slot names.
pub fn parse_rules(document: &str) -> ParsedRules {
    parse_rules_with_slots(document, &SlotTable::default())
}

pub fn parse_rules_with_slots(document: &str, slots: &SlotTable) -> ParsedRules {
    let (forms, mut diagnostics) = read_document(document);
    let mut rules = Vec::new();

    for form in &forms {
        match form.head() {
            Some("version") => {
                let version = form.args().first().and_then(SExpr::as_atom);
                if version != Some(SUPPORTED_VERSION) {
                    diagnostics.push(Diagnostic::warning(
                        form.line(),
                        format!(
                            "unsupported rule document version {}; reading as version {SUPPORTED_VERSION}",
                            version.unwrap_or("<missing>")
                        ),
                    ));
                }
            }
            Some("rule") => rules.push(parse_rule(form, rules.len(), slots, &mut diagnostics)),
            other => diagnostics.push(Diagnostic::warning(
                form.line(),
                format!("unknown top-level form '{}'", other.unwrap_or("<list>")),
            )),
        }
    }

    for d in &diagnostics {
        warn!("{d}");
    }
    debug!(
        "parsed {} rule(s) with {} diagnostic(s)",
        rules.len(),
        diagnostics.len()
    );
    ParsedRules { rules, diagnostics }
}

/// Parse one `(rule ...)` form.
///
/// The rule is always kept at its document position. A missing name, an
/// unknown or malformed clause, or a condition that does not compile leaves
/// it in place with an always-false condition, so `worst` still sees its
/// constraints but `resolve` never selects it.
fn parse_rule(
    form: &SExpr,
    priority: usize,
    slots: &SlotTable,
    diagnostics: &mut Vec<Diagnostic>,
) -> Rule {
    let args = form.args();
    let named = args.first().and_then(SExpr::as_atom);
    let name = named.map_or_else(|| format!("<unnamed rule {}>", priority + 1), str::to_string);
    let clauses = if named.is_some() { &args[1..] } else { args };

    let mut rule = Rule::new(&name, priority);
    rule.line = form.line();
    let mut seen_condition = false;
    let mut broken = named.is_none();
    if broken {
        diagnostics.push(
            Diagnostic::warning(form.line(), "rule has no name; it will never match")
                .in_rule(&name),
        );
    }

    for clause in clauses {
        let line = clause.line();
        let warn_here = |msg: String| Diagnostic::warning(line, msg).in_rule(&name);

        match clause.head() {
            Some("condition") => {
                if seen_condition {
                    diagnostics.push(warn_here("duplicate condition ignored".into()));
                    continue;
                }
                seen_condition = true;
                let Some(text) = clause.args().first().and_then(SExpr::as_atom) else {
                    diagnostics.push(warn_here(
                        "condition needs an expression string; rule will never match".into(),
                    ));
                    broken = true;
                    continue;
                };
                if text.trim().is_empty() {
                    continue;
                }
                match compile(text, slots) {
                    Ok(code) => rule.condition = Some(code),
                    Err(e) => {
                        diagnostics.push(warn_here(format!(
                            "condition \"{text}\" does not compile: {e}; rule will never match"
                        )));
                        rule.condition = Some(CompiledExpression::always_false(text));
                        broken = true;
                    }
                }
            }
            Some("constraint") => match parse_constraint(clause, &rule) {
                Ok(constraint) => rule.constraints.push(constraint),
                Err(msg) => diagnostics.push(warn_here(msg)),
            },
            Some("layer") => match clause.args().first().and_then(SExpr::as_atom) {
                Some(pattern) => rule.layer = Some(Pattern::new(pattern)),
                None => {
                    diagnostics.push(warn_here(
                        "layer needs a layer name or pattern; rule will never match".into(),
                    ));
                    broken = true;
                }
            },
            Some("severity") => {
                match clause
                    .args()
                    .first()
                    .and_then(SExpr::as_atom)
                    .map(str::parse::<Severity>)
                {
                    Some(Ok(severity)) => rule.severity = severity,
                    Some(Err(msg)) => diagnostics.push(warn_here(msg)),
                    None => diagnostics.push(warn_here("severity needs a value".into())),
                }
            }
            Some("disabled") => rule.enabled = false,
            Some(other) => {
                diagnostics.push(warn_here(format!(
                    "unknown clause '{other}'; rule will never match"
                )));
                broken = true;
            }
            None => {
                diagnostics.push(warn_here(format!(
                    "unexpected '{}' in rule body; rule will never match",
                    clause.as_atom().unwrap_or("(...)")
                )));
                broken = true;
            }
        }
    }

    if broken {
        let source = rule
            .condition
            .as_ref()
            .map_or("", |c| c.source())
            .to_string();
        rule.condition = Some(CompiledExpression::always_false(source));
    }
    if rule.constraints.is_empty() {
        diagnostics.push(
            Diagnostic::warning(rule.line, "rule declares no constraints").in_rule(&name),
        );
    }
    rule
}

fn parse_constraint(clause: &SExpr, rule: &Rule) -> Result<Constraint, String> {
    let args = clause.args();
    let type_name = args
        .first()
        .and_then(SExpr::as_atom)
        .ok_or("constraint needs a type")?;
    let kind: ConstraintType = type_name.parse()?;

    let value = if kind.is_categorical() {
        let mut categories = Vec::new();
        for arg in &args[1..] {
            let word = arg
                .as_atom()
                .ok_or_else(|| format!("{kind} expects keywords, not a list"))?;
            if !DISALLOW_KEYWORDS.contains(&word) {
                return Err(format!(
                    "unknown {kind} keyword '{word}' (expected one of {})",
                    DISALLOW_KEYWORDS.join(", ")
                ));
            }
            categories.push(word.to_string());
        }
        if categories.is_empty() {
            return Err(format!("{kind} constraint lists nothing"));
        }
        ConstraintValue::Categorical(categories)
    } else {
        let mut bound = MinOptMax::default();
        for arg in &args[1..] {
            let part = arg.head().ok_or_else(|| {
                format!("{kind} expects (min ...), (opt ...) or (max ...)")
            })?;
            let text = arg
                .args()
                .first()
                .and_then(SExpr::as_atom)
                .ok_or_else(|| format!("({part}) needs a value"))?;
            let value = parse_value(text, kind)?;
            match part {
                "min" => bound.min = Some(value),
                "opt" => bound.opt = Some(value),
                "max" => bound.max = Some(value),
                other => return Err(format!("unknown bound '{other}' in {kind}")),
            }
        }
        if bound.is_empty() {
            return Err(format!("{kind} constraint has no min, opt or max"));
        }
        ConstraintValue::Bound(bound)
    };

    Ok(Constraint {
        kind,
        value,
        rule_name: rule.name.clone(),
        rule_priority: rule.priority,
    })
}

fn parse_value(text: &str, kind: ConstraintType) -> Result<f64, String> {
    let value = units::parse_length(text, DEFAULT_VALUE_UNIT)
        .ok_or_else(|| format!("invalid value '{text}'"))?;
    if !kind.is_area() {
        return Ok(value);
    }
    // Square units: scale once more by the suffix.
    let suffix = text.trim_start_matches(|c: char| !c.is_ascii_alphabetic());
    let unit = if suffix.is_empty() { DEFAULT_VALUE_UNIT } else { suffix };
    let scale = units::unit_scale(unit).ok_or_else(|| format!("unknown unit '{unit}'"))?;
    Ok(value * scale)
}
