//! Verification results and the progress/reporting channel.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::violation::{DrcViolation, Severity};

/// Everything a verification run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Violations in discovery order.
    pub violations: Vec<DrcViolation>,
    pub aux_messages: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub providers_run: Vec<String>,
    pub providers_skipped: Vec<String>,
    pub cancelled: bool,
    /// Set when violations were dropped because of `max_violations`.
    #[serde(default)]
    pub truncated: bool,
}

impl VerificationReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Progress and result collector owned by the surrounding application.
///
/// Every method has a no-op default, so implementors override only what they display.
pub trait ProgressReporter: Send + Sync {
    fn report_violation(&self, _violation: &DrcViolation) {}

    fn report_aux(&self, _message: &str) {}

    /// Fraction of the current stage completed, in `0.0..=1.0`.
    fn report_progress(&self, _fraction: f64) {}

    fn report_stage(&self, _name: &str, _index: usize, _total: usize) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {}

/// Forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report_violation(&self, violation: &DrcViolation) {
        warn!("{violation}");
    }

    fn report_aux(&self, message: &str) {
        info!("{message}");
    }

    fn report_progress(&self, fraction: f64) {
        debug!("progress {:.0}%", fraction * 100.0);
    }

    fn report_stage(&self, name: &str, index: usize, total: usize) {
        info!("[{}/{}] {name}", index + 1, total);
    }
}

/// Shared, lock-protected write side of a [`VerificationReport`].
///
/// Providers may report from several threads; writes are serialised.
pub struct ViolationSink<'r> {
    report: Mutex<VerificationReport>,
    reporter: &'r dyn ProgressReporter,
    max_violations: Option<usize>,
}

impl<'r> ViolationSink<'r> {
    pub fn new(reporter: &'r dyn ProgressReporter, max_violations: Option<usize>) -> Self {
        Self {
            report: Mutex::new(VerificationReport::default()),
            reporter,
            max_violations,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VerificationReport> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a violation. Returns `false` when it was dropped, either because
    /// its severity is `ignore` or because the report is full.
    pub fn report(&self, violation: DrcViolation) -> bool {
        if violation.severity == Severity::Ignore {
            return false;
        }
        {
            let mut report = self.lock();
            if self
                .max_violations
                .is_some_and(|max| report.violations.len() >= max)
            {
                report.truncated = true;
                return false;
            }
            report.violations.push(violation.clone());
        }
        self.reporter.report_violation(&violation);
        true
    }

    pub fn report_aux(&self, message: impl Into<String>) {
        let message = message.into();
        self.reporter.report_aux(&message);
        self.lock().aux_messages.push(message);
    }

    pub fn is_full(&self) -> bool {
        let report = self.lock();
        self.max_violations
            .is_some_and(|max| report.violations.len() >= max)
    }

    pub fn violation_count(&self) -> usize {
        self.lock().violations.len()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut VerificationReport)) {
        f(&mut self.lock());
    }

    pub fn into_report(self) -> VerificationReport {
        self.report
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ConstraintType;

    fn violation(severity: Severity) -> DrcViolation {
        DrcViolation::new("test", ConstraintType::Clearance, "r", "too close")
            .with_severity(severity)
    }

    #[test]
    fn test_ignore_severity_is_dropped() {
        let sink = ViolationSink::new(&NullReporter, None);
        assert!(sink.report(violation(Severity::Warning)));
        assert!(!sink.report(violation(Severity::Ignore)));
        let report = sink.into_report();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.count(Severity::Warning), 1);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_max_violations_truncates() {
        let sink = ViolationSink::new(&NullReporter, Some(2));
        for _ in 0..5 {
            sink.report(violation(Severity::Error));
        }
        assert!(sink.is_full());
        let report = sink.into_report();
        assert_eq!(report.violations.len(), 2);
        assert!(report.truncated);
        assert!(report.has_errors());
    }

    #[test]
    fn test_concurrent_reports() {
        let sink = ViolationSink::new(&NullReporter, None);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..25 {
                        sink.report(violation(Severity::Error));
                    }
                });
            }
        });
        assert_eq!(sink.violation_count(), 100);
    }

    #[test]
    fn test_report_serialises() {
        let sink = ViolationSink::new(&LogReporter, None);
        sink.report(violation(Severity::Error));
        sink.report_aux("clearance: 4 items checked");
        let json = sink.into_report().to_json().unwrap();
        let back: VerificationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.violations[0].rule_name, "r");
        assert_eq!(back.aux_messages, ["clearance: 4 items checked"]);
    }
}
