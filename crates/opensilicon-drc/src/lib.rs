//! # OpenSilicon DRC
//!
//! Design-constraint resolution engine.
//!
//! Rules are written in a small S-expression document. Each rule carries an
//! optional condition, compiled once into a flat stack-machine program, and
//! one or more typed constraints. A [`ConstraintRegistry`] indexes the
//! constraints per type in document order; providers ask it for the first
//! rule that matches a pair of objects, or for the worst bound of a type
//! across all rules.
//!
//! ```no_run
//! use opensilicon_core::LayoutDatabase;
//! use opensilicon_drc::{providers, DrcEngine, DrcSettings, LogReporter};
//!
//! let mut engine = DrcEngine::new(DrcSettings::default());
//! engine.load_rules("(rule default (constraint clearance (min 0.2mm)))");
//! for provider in providers::builtin() {
//!     engine.register_provider(provider);
//! }
//! let report = engine.run(&LayoutDatabase::new("board"), &LogReporter);
//! assert!(!report.has_errors());
//! ```

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod expr;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod report;
pub mod rules;
pub mod settings;
pub mod units;
pub mod value;
pub mod violation;

pub use diagnostics::{Diagnostic, DiagnosticLevel};
pub use engine::{CancelToken, DrcEngine};
pub use error::DrcError;
pub use provider::{ProviderHandle, ProviderState, RunContext, TestProvider};
pub use registry::{ConstraintRegistry, RegistryEntry, ResolvedConstraint, WorstCase};
pub use report::{LogReporter, NullReporter, ProgressReporter, VerificationReport, ViolationSink};
pub use rules::{parse_rules, Constraint, ConstraintType, ConstraintValue, MinOptMax, ParsedRules, Rule};
pub use settings::DrcSettings;
pub use value::Value;
pub use violation::{DrcViolation, Severity};
