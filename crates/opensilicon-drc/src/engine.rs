//! Verification driver.
//!
//! A run goes through three phases, strictly in order:
//!
//! 1. **Load**: parse the rule document. Problems become diagnostics.
//! 2. **Compile**: build the [`ConstraintRegistry`] for the constraint types
//!    the registered providers need, then negotiate every provider against it.
//! 3. **Run**: invoke each runnable provider in registration order. The
//!    registry is frozen for the whole phase.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use opensilicon_core::LayoutDatabase;

use crate::diagnostics::{Diagnostic, DiagnosticLevel};
use crate::error::DrcError;
use crate::provider::{ProviderHandle, ProviderState, RunContext, TestProvider};
use crate::registry::ConstraintRegistry;
use crate::report::{ProgressReporter, VerificationReport, ViolationSink};
use crate::rules::{parse_rules, ConstraintType, Rule};
use crate::settings::DrcSettings;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

struct RegisteredProvider {
    provider: Box<dyn TestProvider>,
    state: ProviderState,
}

pub struct DrcEngine {
    settings: DrcSettings,
    rules: Vec<Arc<Rule>>,
    /// Diagnostics from loading the rule document.
    load_diagnostics: Vec<Diagnostic>,
    /// Diagnostics from the last compile.
    compile_diagnostics: Vec<Diagnostic>,
    providers: Vec<RegisteredProvider>,
    registry: Option<ConstraintRegistry>,
    cancel: CancelToken,
}

impl DrcEngine {
    pub fn new(settings: DrcSettings) -> Self {
        Self {
            settings,
            rules: Vec::new(),
            load_diagnostics: Vec::new(),
            compile_diagnostics: Vec::new(),
            providers: Vec::new(),
            registry: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn settings(&self) -> &DrcSettings {
        &self.settings
    }

    /// Replace the rule set with the rules in `document`.
    pub fn load_rules(&mut self, document: &str) {
        let parsed = parse_rules(document);
        info!(
            "Loaded {} rule(s), {} diagnostic(s)",
            parsed.rules.len(),
            parsed.diagnostics.len()
        );
        self.rules = parsed.rules.into_iter().map(Arc::new).collect();
        self.load_diagnostics = parsed.diagnostics;
        self.invalidate();
    }

    pub fn load_rules_file(&mut self, path: &Path) -> Result<(), DrcError> {
        let document = std::fs::read_to_string(path)?;
        self.load_rules(&document);
        Ok(())
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Load diagnostics followed by those of the last compile.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.load_diagnostics.iter().chain(&self.compile_diagnostics)
    }

    pub fn register_provider(&mut self, provider: Box<dyn TestProvider>) -> ProviderHandle {
        let handle = ProviderHandle(self.providers.len());
        info!(
            "Registered provider '{}' {handle} requiring {:?}",
            provider.name(),
            provider.required_constraints()
        );
        self.providers.push(RegisteredProvider {
            provider,
            state: ProviderState::Registered,
        });
        self.invalidate();
        handle
    }

    pub fn provider_state(&self, handle: ProviderHandle) -> Result<ProviderState, DrcError> {
        self.providers
            .get(handle.0)
            .map(|p| p.state)
            .ok_or(DrcError::UnknownProvider(handle.0))
    }

    pub fn registry(&self) -> Option<&ConstraintRegistry> {
        self.registry.as_ref()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn invalidate(&mut self) {
        self.registry = None;
        self.compile_diagnostics.clear();
        for p in &mut self.providers {
            p.state = ProviderState::Registered;
        }
    }

    /// Build the registry and decide, for every provider, whether it will run.
    ///
    /// All providers are negotiated here, before any of them runs.
    pub fn compile(&mut self) -> &ConstraintRegistry {
        // Every provider enters negotiation before any verdict is given.
        for p in &mut self.providers {
            p.state = ProviderState::Negotiating;
        }
        debug!("Negotiating {} provider(s)", self.providers.len());

        let requested: BTreeSet<ConstraintType> = self
            .providers
            .iter()
            .flat_map(|p| p.provider.required_constraints())
            .collect();
        let registry = ConstraintRegistry::build(&self.rules, requested);
        self.compile_diagnostics.clear();

        for p in &mut self.providers {
            let missing: Vec<String> = p
                .provider
                .required_constraints()
                .into_iter()
                .filter(|kind| registry.entry_count(*kind) == 0)
                .map(|kind| kind.to_string())
                .collect();
            if missing.is_empty() {
                p.state = ProviderState::Runnable;
            } else {
                p.state = ProviderState::Skipped;
                let message = format!(
                    "provider '{}' skipped: no enabled rule declares {}",
                    p.provider.name(),
                    missing.join(", ")
                );
                warn!("{message}");
                self.compile_diagnostics.push(Diagnostic::info(message));
            }
        }

        if self.settings.warn_on_shadowed_rules {
            self.compile_diagnostics
                .extend(registry.shadowing_diagnostics());
        }

        self.registry.insert(registry)
    }

    /// Run every runnable provider against `design`.
    ///
    /// Provider failures are logged and recorded as error diagnostics; the
    /// remaining providers still run. A cancelled run returns what was
    /// collected so far with `cancelled` set.
    pub fn run(
        &mut self,
        design: &LayoutDatabase,
        reporter: &dyn ProgressReporter,
    ) -> VerificationReport {
        if self.registry.is_none() {
            self.compile();
        }
        let Some(registry) = self.registry.as_ref() else {
            return VerificationReport::default();
        };

        let sink = ViolationSink::new(reporter, self.settings.max_violations);
        let total = self.providers.len();
        let mut ran = Vec::new();
        let skipped: Vec<String> = self
            .providers
            .iter()
            .filter(|p| p.state == ProviderState::Skipped)
            .map(|p| p.provider.name().to_string())
            .collect();
        let mut failures = Vec::new();
        let mut cancelled = false;

        for (index, p) in self.providers.iter().enumerate() {
            let name = p.provider.name();
            if p.state == ProviderState::Skipped {
                continue;
            }
            if self.cancel.is_cancelled() {
                info!("Run cancelled before provider '{name}'");
                cancelled = true;
                break;
            }
            reporter.report_stage(name, index, total);
            let ctx = RunContext::new(
                name,
                registry,
                design,
                &sink,
                reporter,
                &self.cancel,
                &self.settings,
            );
            if let Err(e) = p.provider.run(&ctx) {
                let failure = DrcError::Provider {
                    provider: name.to_string(),
                    message: e.to_string(),
                };
                error!("{failure}");
                failures.push(
                    Diagnostic::new(DiagnosticLevel::Error, failure.to_string()).in_rule(name),
                );
            }
            ran.push(index);
            reporter.report_progress((index + 1) as f64 / total as f64);
        }
        cancelled |= self.cancel.is_cancelled();

        for &index in &ran {
            self.providers[index].state = ProviderState::Ran;
        }

        let diagnostics = self.diagnostics().cloned().chain(failures).collect();
        let providers_run = ran
            .iter()
            .map(|&i| self.providers[i].provider.name().to_string())
            .collect();
        sink.update(|report| {
            report.diagnostics = diagnostics;
            report.providers_run = providers_run;
            report.providers_skipped = skipped;
            report.cancelled = cancelled;
        });
        let report = sink.into_report();
        info!(
            "Verification finished: {} violation(s) from {} provider(s){}",
            report.violations.len(),
            report.providers_run.len(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        report
    }
}

impl Default for DrcEngine {
    fn default() -> Self {
        Self::new(DrcSettings::default())
    }
}
