use crate::catalog::CatalogEntry;
use crate::error::InstallError;
use std::fmt;

/// Progress reporter trait for installer operations.
/// Implementations forward updates to the console or record them in tests.
pub trait ProgressReporter: Send + Sync {
    /// A target entered a new pipeline stage
    fn start_step(&self, target: &str, stage: InstallStage);

    /// Update bytes transferred for download progress
    fn update_bytes(&self, target: &str, transferred: u64, total: Option<u64>);

    /// Set a short status message
    fn set_message(&self, target: &str, message: &str);

    /// A target reached its final state
    fn done(&self, result: &InstallResult);
}

/// A progress reporter that does nothing (silent).
/// Useful for background runs or tests.
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start_step(&self, _target: &str, _stage: InstallStage) {}
    fn update_bytes(&self, _target: &str, _transferred: u64, _total: Option<u64>) {}
    fn set_message(&self, _target: &str, _message: &str) {}
    fn done(&self, _result: &InstallResult) {}
}

/// States of the per-target install state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStage {
    Pending,
    Checking,
    Skipped,
    Downloading,
    Extracting,
    Locating,
    Placing,
    Done,
    Failed,
}

impl InstallStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallStage::Pending => "pending",
            InstallStage::Checking => "checking",
            InstallStage::Skipped => "skipped",
            InstallStage::Downloading => "downloading",
            InstallStage::Extracting => "extracting",
            InstallStage::Locating => "locating",
            InstallStage::Placing => "placing",
            InstallStage::Done => "done",
            InstallStage::Failed => "failed",
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub id: u64,
    pub name: String,
    pub archive_url: String,
}

impl From<CatalogEntry> for InstallTarget {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            archive_url: entry.archive_url,
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub name: String,
    pub success: bool,
    pub skipped: bool,
    pub error: Option<InstallError>,
}

impl InstallResult {
    pub fn installed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            skipped: false,
            error: None,
        }
    }

    /// Already present at the destination; counts as success
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            skipped: true,
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: InstallError) -> Self {
        Self {
            name: name.into(),
            success: false,
            skipped: false,
            error: Some(error),
        }
    }

    pub fn stage(&self) -> InstallStage {
        match (&self.error, self.skipped) {
            (Some(_), _) => InstallStage::Failed,
            (None, true) => InstallStage::Skipped,
            (None, false) => InstallStage::Done,
        }
    }
}

/// Aggregate counts over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub total: usize,
    pub installed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl InstallSummary {
    pub fn from_results(results: &[InstallResult]) -> Self {
        let total = results.len();
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total,
            installed: results.iter().filter(|r| r.success && !r.skipped).count(),
            skipped: results.iter().filter(|r| r.skipped).count(),
            failed: total - succeeded,
        }
    }
}

impl fmt::Display for InstallSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} installed, {} skipped, {} failed",
            self.installed, self.skipped, self.failed
        )
    }
}

/// How the orchestrator schedules pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Sequential,
    /// `concurrency: None` starts every target at once
    Parallel { concurrency: Option<usize> },
}
