//! Recoverable problems found while converting a playbook.
//!
//! Every diagnostic is logged through `tracing` when it is recorded and kept
//! so callers can inspect what was skipped.

use std::fmt;

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Info,
}

/// Diagnostic codes for categorizing issues
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticCode {
    /// A module file was found but could not be loaded; the task stays a task.
    UnresolvedModule,
    /// A module references itself further up the same branch.
    ModuleCycle,
    /// Activity type has no BPMN element of its own; lowered as a plain task.
    UnknownActivityType,
    /// `goto` list on something other than an exclusive gateway.
    GotoListOnNonGateway,
    /// Gateway branch without a condition or target.
    IncompleteBranch,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub activity: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.code, self.activity, self.message)
    }
}

/// Collector threaded through the pipeline stages.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, code: DiagnosticCode, activity: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(activity, ?code, "{}", message);
        self.push(Severity::Warning, code, activity, message);
    }

    pub fn info(&mut self, code: DiagnosticCode, activity: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(activity, ?code, "{}", message);
        self.push(Severity::Info, code, activity, message);
    }

    fn push(&mut self, severity: Severity, code: DiagnosticCode, activity: &str, message: String) {
        self.items.push(Diagnostic {
            severity,
            code,
            activity: activity.to_string(),
            message,
        });
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.code == code)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_order_with_severity() {
        let mut diags = Diagnostics::new();
        diags.warn(DiagnosticCode::UnknownActivityType, "a_1", "type 'foo'");
        diags.info(DiagnosticCode::UnknownActivityType, "b_2", "type 'serv'");
        diags.warn(DiagnosticCode::IncompleteBranch, "gw_3", "missing 'then'");

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.with_code(DiagnosticCode::UnknownActivityType).count(), 2);
        let all = diags.into_vec();
        assert_eq!(all[1].severity, Severity::Info);
        assert_eq!(all[2].to_string(), "[IncompleteBranch] gw_3: missing 'then'");
    }
}
