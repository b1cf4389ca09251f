//! The test-provider plug-in contract.
//!
//! A provider declares the constraint types it consumes. Before anything
//! runs, the engine negotiates every provider against the compiled registry:
//! a provider whose requirements are not all backed by at least one rule is
//! skipped, the rest become runnable and are invoked in registration order.

use std::fmt;

use opensilicon_core::{LayerId, LayerStack, LayoutDatabase, LayoutItem};
use serde::{Deserialize, Serialize};

use crate::engine::CancelToken;
use crate::error::DrcError;
use crate::expr::EvalContext;
use crate::registry::{ConstraintRegistry, ResolvedConstraint, WorstCase};
use crate::report::{ProgressReporter, ViolationSink};
use crate::rules::ConstraintType;
use crate::settings::DrcSettings;
use crate::violation::DrcViolation;

/// A pluggable design check.
pub trait TestProvider: Send + Sync {
    fn name(&self) -> &str;

    fn required_constraints(&self) -> Vec<ConstraintType>;

    /// Walk the design and report violations through `ctx`.
    fn run(&self, ctx: &RunContext<'_>) -> Result<(), DrcError>;
}

/// Identifies a provider registered with an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderHandle(pub(crate) usize);

impl fmt::Display for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    Registered,
    Negotiating,
    Runnable,
    Skipped,
    Ran,
}

/// What a provider sees while it runs.
pub struct RunContext<'a> {
    provider: &'a str,
    registry: &'a ConstraintRegistry,
    design: &'a LayoutDatabase,
    sink: &'a ViolationSink<'a>,
    reporter: &'a dyn ProgressReporter,
    cancel: &'a CancelToken,
    settings: &'a DrcSettings,
}

impl<'a> RunContext<'a> {
    pub(crate) fn new(
        provider: &'a str,
        registry: &'a ConstraintRegistry,
        design: &'a LayoutDatabase,
        sink: &'a ViolationSink<'a>,
        reporter: &'a dyn ProgressReporter,
        cancel: &'a CancelToken,
        settings: &'a DrcSettings,
    ) -> Self {
        Self {
            provider,
            registry,
            design,
            sink,
            reporter,
            cancel,
            settings,
        }
    }

    pub fn provider(&self) -> &str {
        self.provider
    }

    pub fn design(&self) -> &'a LayoutDatabase {
        self.design
    }

    pub fn items(&self) -> &'a [LayoutItem] {
        self.design.items()
    }

    pub fn layers(&self) -> &'a LayerStack {
        &self.design.layer_stack
    }

    pub fn registry(&self) -> &'a ConstraintRegistry {
        self.registry
    }

    /// First-match lookup for a single item (`b == None`) or a pair.
    pub fn resolve(
        &self,
        kind: ConstraintType,
        a: &'a LayoutItem,
        b: Option<&'a LayoutItem>,
        layer: Option<LayerId>,
    ) -> Result<Option<ResolvedConstraint<'a>>, DrcError> {
        let mut ctx = EvalContext::new(self.layers()).with_first(a);
        if let Some(b) = b {
            ctx = ctx.with_second(b);
        }
        if let Some(layer) = layer {
            ctx = ctx.with_layer(layer);
        }
        self.registry.resolve(kind, &ctx)
    }

    pub fn worst(
        &self,
        kind: ConstraintType,
        case: WorstCase,
    ) -> Result<Option<ResolvedConstraint<'a>>, DrcError> {
        self.registry.worst(kind, case)
    }

    /// Start a violation attributed to this provider and the winning rule.
    pub fn violation(
        &self,
        resolved: &ResolvedConstraint<'_>,
        message: impl Into<String>,
    ) -> DrcViolation {
        DrcViolation::new(
            self.provider,
            resolved.constraint.kind,
            &resolved.rule.name,
            message,
        )
        .with_severity(resolved.rule.severity)
    }

    pub fn report(&self, violation: DrcViolation) -> bool {
        self.sink.report(violation)
    }

    pub fn report_aux(&self, message: impl Into<String>) {
        self.sink.report_aux(message);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Progress checkpoint for item `done` of `total`. Reports progress every
    /// `progress_interval` items and returns `false` once the provider should
    /// stop: the run was cancelled or the report is full.
    pub fn checkpoint(&self, done: usize, total: usize) -> bool {
        let interval = self.settings.progress_interval.max(1);
        if done % interval != 0 {
            return true;
        }
        if total > 0 {
            self.reporter.report_progress(done as f64 / total as f64);
        }
        !self.cancel.is_cancelled() && !self.sink.is_full()
    }
}
