//! Outcome of export and import runs.
//!
//! Each exported variant or imported manifest is one unit. Failures are
//! captured per unit so one bad input never stops the batch; the caller gets
//! a [`RunSummary`] with success, skip and failure counts.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ErrorKind, SheetError};
use crate::progress::ProgressEvent;

/// Status of a single unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// Unit processed
    Success,
    /// Unit had nothing to do
    Skipped(String),
    /// Unit aborted
    Failed { kind: ErrorKind, message: String },
}

impl UnitStatus {
    /// Build a failed status from an error.
    pub fn failed(err: &SheetError) -> Self {
        UnitStatus::Failed { kind: err.kind(), message: err.to_string() }
    }

    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, UnitStatus::Success | UnitStatus::Skipped(_))
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, UnitStatus::Failed { .. })
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitStatus::Success => write!(f, "success"),
            UnitStatus::Skipped(reason) => write!(f, "skipped: {}", reason),
            UnitStatus::Failed { kind, message } => write!(f, "failed ({}): {}", kind, message),
        }
    }
}

/// Result of processing one unit.
#[derive(Debug, Clone)]
pub struct UnitResult {
    /// Unit identifier, e.g. `Torso/Leather` or a manifest path
    pub unit: String,
    pub status: UnitStatus,
    /// Files written
    pub outputs: Vec<PathBuf>,
    pub duration: Duration,
    /// Non-fatal problems, such as skipped animations
    pub warnings: Vec<String>,
}

impl UnitResult {
    /// Create a successful result.
    pub fn success(unit: impl Into<String>, outputs: Vec<PathBuf>, duration: Duration) -> Self {
        Self { unit: unit.into(), status: UnitStatus::Success, outputs, duration, warnings: vec![] }
    }

    /// Create a skipped result.
    pub fn skipped(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            status: UnitStatus::Skipped(reason.into()),
            outputs: vec![],
            duration: Duration::ZERO,
            warnings: vec![],
        }
    }

    /// Create a failed result.
    pub fn failed(unit: impl Into<String>, err: &SheetError, duration: Duration) -> Self {
        Self {
            unit: unit.into(),
            status: UnitStatus::failed(err),
            outputs: vec![],
            duration,
            warnings: vec![],
        }
    }

    /// Attach warnings.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Progress event announcing this result.
    pub fn completed_event(&self) -> ProgressEvent {
        ProgressEvent::UnitCompleted {
            unit: self.unit.clone(),
            status: self.status.clone(),
            duration_ms: self.duration.as_millis() as u64,
        }
    }
}

/// Result of a complete export or import run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub units: Vec<UnitResult>,
    pub total_duration: Duration,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: UnitResult) {
        self.units.push(result);
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    pub fn success_count(&self) -> usize {
        self.units.iter().filter(|r| r.status == UnitStatus::Success).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.units.iter().filter(|r| matches!(r.status, UnitStatus::Skipped(_))).count()
    }

    pub fn failed_count(&self) -> usize {
        self.units.iter().filter(|r| r.status.is_failure()).count()
    }

    /// No unit failed.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.units.iter().flat_map(|r| r.outputs.iter()).collect()
    }

    pub fn all_warnings(&self) -> Vec<&String> {
        self.units.iter().flat_map(|r| r.warnings.iter()).collect()
    }

    pub fn failures(&self) -> Vec<&UnitResult> {
        self.units.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Final progress event for this run.
    pub fn completed_event(&self) -> ProgressEvent {
        ProgressEvent::RunCompleted {
            success: self.is_success(),
            duration_ms: self.total_duration.as_millis() as u64,
            succeeded: self.success_count(),
            skipped: self.skipped_count(),
            failed: self.failed_count(),
        }
    }

    /// Human-readable multi-line summary.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let skipped = self.skipped_count();
        let failed = self.failed_count();
        let total = self.units.len();

        if failed > 0 {
            lines.push(format!(
                "{} succeeded, {} skipped, {} failed ({} total)",
                success, skipped, failed, total
            ));
            for unit in self.failures() {
                lines.push(format!("  - {}: {}", unit.unit, unit.status));
            }
        } else {
            lines.push(format!(
                "{} succeeded, {} skipped ({} total) in {:?}",
                success, skipped, total, self.total_duration
            ));
        }

        let warnings = self.all_warnings();
        if !warnings.is_empty() {
            lines.push(format!("Warnings ({}):", warnings.len()));
            for warning in warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if warnings.len() > 5 {
                lines.push(format!("  ... and {} more", warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}
