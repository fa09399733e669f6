use crate::installer::types::InstallStage;

/// Fatal for a run: nothing can be resolved without a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Per-token resolution failure. Never stops the remaining tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("No application with id {0}")]
    IdNotFound(String),

    #[error("No application named \"{0}\"")]
    NameNotFound(String),

    #[error("\"{0}\" is not a numeric id (use --name to install by name)")]
    AmbiguousToken(String),
}

impl ResolutionError {
    /// The user-supplied token that failed to resolve
    pub fn token(&self) -> &str {
        match self {
            ResolutionError::IdNotFound(t)
            | ResolutionError::NameNotFound(t)
            | ResolutionError::AmbiguousToken(t) => t,
        }
    }
}

/// Per-target install failure, captured on that target's result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstallError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Extraction failed: {0}")]
    ExtractFailed(String),

    #[error("No bundle found: {0}")]
    BundleNotFound(String),

    #[error("Placement failed: {0}")]
    PlacementFailed(String),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl InstallError {
    /// Pipeline stage the error was raised in
    pub fn stage(&self) -> InstallStage {
        match self {
            InstallError::DownloadFailed(_) => InstallStage::Downloading,
            InstallError::ExtractFailed(_) => InstallStage::Extracting,
            InstallError::BundleNotFound(_) => InstallStage::Locating,
            InstallError::PlacementFailed(_) => InstallStage::Placing,
            InstallError::Unexpected(_) => InstallStage::Failed,
        }
    }
}
