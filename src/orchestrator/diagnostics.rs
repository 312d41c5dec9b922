//! Structured diagnostics.
//!
//! Module failures, async job failures, and misuse warnings never abort the
//! frame loop (spec §7) — they are recorded here instead. A [`DiagnosticSink`]
//! routes them to `log`, an in-memory buffer for tests, or both.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::orchestrator::phase::Phase;

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

/// A structured diagnostic record: `(severity, code, message, related_modules)`.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub phase: Option<Phase>,
    pub related_modules: Vec<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(severity: Severity, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            phase: None,
            related_modules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    #[must_use]
    pub fn with_module(mut self, name: impl Into<String>) -> Self {
        self.related_modules.push(name.into());
        self
    }

    /// Convenience constructor for the common "module failed in phase" case.
    #[must_use]
    pub fn module_failure(phase: Phase, module: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, "module-failure", message.into())
            .with_phase(phase)
            .with_module(module)
    }
}

/// Destination for diagnostic records.
///
/// Implementations must be cheap to call from the orchestrator's hot path —
/// the manager calls `record` on every module failure.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to the `log` facade at a level derived from its
/// [`Severity`]. This is the default sink for production use.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, diagnostic: Diagnostic) {
        let Diagnostic {
            severity,
            code,
            message,
            phase,
            related_modules,
        } = diagnostic;
        match severity {
            Severity::Info => log::info!(target: "myth_orchestrator", "[{code}] {message} (phase={phase:?}, modules={related_modules:?})"),
            Severity::Warning => log::warn!(target: "myth_orchestrator", "[{code}] {message} (phase={phase:?}, modules={related_modules:?})"),
            Severity::Error | Severity::Fatal => log::error!(target: "myth_orchestrator", "[{code}] {message} (phase={phase:?}, modules={related_modules:?})"),
        }
    }
}

/// Collects every diagnostic into an in-memory, mutex-protected buffer.
///
/// Intended for tests (scenario C asserts on the recorded diagnostics) and
/// for telemetry forwarding.
#[derive(Clone, Default)]
pub struct CollectingSink {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.records.lock().clone()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn record(&self, diagnostic: Diagnostic) {
        self.records.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_records_in_order() {
        let sink = CollectingSink::new();
        sink.record(Diagnostic::new(Severity::Info, "a", "first"));
        sink.record(Diagnostic::new(Severity::Warning, "b", "second"));
        let snap = sink.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].code, "a");
        assert_eq!(snap[1].code, "b");
    }

    #[test]
    fn module_failure_sets_phase_and_module() {
        let diag = Diagnostic::module_failure(Phase::Gameplay, "B", "boom");
        assert_eq!(diag.phase, Some(Phase::Gameplay));
        assert_eq!(diag.related_modules, vec!["B".to_string()]);
    }
}
