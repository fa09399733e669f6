pub mod core;
pub mod orchestrator;
pub mod pipeline;
pub mod types;

pub use orchestrator::Orchestrator;
pub use pipeline::{Capabilities, InstallPipeline};
pub use types::{
    InstallResult, InstallStage, InstallSummary, InstallTarget, ProgressReporter, RunMode,
    SilentProgressReporter,
};
