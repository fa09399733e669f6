pub mod catalog;
pub mod config;
pub mod error;
pub mod installer;

// Re-export commonly used types
pub use catalog::{
    resolve, resolve_all, CacheRecord, CacheStore, CatalogClient, CatalogDocument, CatalogEntry,
    CatalogIndex, CatalogSource, HttpCatalogSource,
};
pub use config::InstallerConfig;
pub use error::{CatalogError, InstallError, ResolutionError};
pub use installer::{
    Capabilities, InstallPipeline, InstallResult, InstallStage, InstallSummary, InstallTarget,
    Orchestrator, ProgressReporter, RunMode, SilentProgressReporter,
};
