use super::core::{
    ArchiveDownloader, ArchiveExtractor, HttpDownloader, LocalFs, PrivilegedFs, SudoFs,
    TempWorkspace, ZipExtractor,
};
use super::types::{InstallResult, InstallStage, InstallTarget, ProgressReporter};
use crate::config::InstallerConfig;
use crate::error::InstallError;
use anyhow::Result;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// External capabilities the pipeline drives
#[derive(Clone)]
pub struct Capabilities {
    pub downloader: Arc<dyn ArchiveDownloader>,
    pub extractor: Arc<dyn ArchiveExtractor>,
    pub fs: Arc<dyn PrivilegedFs>,
}

impl Capabilities {
    /// HTTP downloads, zip extraction, and destination writes through `sudo`
    /// (or as the current user when `use_sudo` is false).
    pub fn system(config: &InstallerConfig, use_sudo: bool) -> Result<Self> {
        let fs: Arc<dyn PrivilegedFs> = if use_sudo {
            Arc::new(SudoFs)
        } else {
            Arc::new(LocalFs)
        };
        Ok(Self {
            downloader: Arc::new(HttpDownloader::new(config.download_idle_timeout)?),
            extractor: Arc::new(ZipExtractor),
            fs,
        })
    }
}

/// Per-target install state machine:
///
/// `Checking → (Skipped | Downloading → Extracting → Locating → Placing → Done)`,
/// with any stage able to end in `Failed`. Every outcome is returned as an
/// [`InstallResult`]; nothing here aborts other targets.
pub struct InstallPipeline {
    destination: PathBuf,
    temp_dir: PathBuf,
    bundle_suffix: String,
    caps: Capabilities,
    reporter: Arc<dyn ProgressReporter>,
}

impl InstallPipeline {
    pub fn new(
        config: &InstallerConfig,
        caps: Capabilities,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            destination: config.destination.clone(),
            temp_dir: config.temp_dir.clone(),
            bundle_suffix: config.bundle_suffix.clone(),
            caps,
            reporter,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn reporter(&self) -> &dyn ProgressReporter {
        &*self.reporter
    }

    /// Run one target to completion. `show_progress` forwards byte-level
    /// download progress to the reporter.
    pub async fn install(&self, target: &InstallTarget, show_progress: bool) -> InstallResult {
        log::info!("Installing {} ({})", target.name, target.id);

        self.reporter.start_step(&target.name, InstallStage::Checking);
        if let Some(existing) = self.find_installed(&target.name).await {
            log::info!(
                "{} is already installed as {:?}, skipping",
                target.name,
                self.destination.join(&existing)
            );
            self.reporter
                .set_message(&target.name, &format!("already installed as {}", existing));
            return self.finish(InstallResult::skipped(&target.name));
        }

        let workspace = TempWorkspace::new(&self.temp_dir, target.id);
        // Scratch files are removed even if a capability panics; the panic
        // then carries on to the orchestrator.
        let outcome = AssertUnwindSafe(self.run_stages(target, &workspace, show_progress))
            .catch_unwind()
            .await;
        self.cleanup(&workspace).await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(payload) => std::panic::resume_unwind(payload),
        };

        let result = match outcome {
            Ok(placed) => {
                log::info!("Installed {} ({} bundle(s) placed)", target.name, placed);
                InstallResult::installed(&target.name)
            }
            Err(e) => {
                log::error!("Failed to install {}: {}", target.name, e);
                InstallResult::failed(&target.name, e)
            }
        };
        self.finish(result)
    }

    fn finish(&self, result: InstallResult) -> InstallResult {
        self.reporter.done(&result);
        result
    }

    /// First destination entry whose name starts with `name`
    async fn find_installed(&self, name: &str) -> Option<String> {
        match self.caps.fs.list_dir(&self.destination).await {
            Ok(entries) => entries.into_iter().find(|entry| entry.starts_with(name)),
            Err(e) => {
                log::warn!("Could not inspect {:?}: {:#}", self.destination, e);
                None
            }
        }
    }

    async fn run_stages(
        &self,
        target: &InstallTarget,
        workspace: &TempWorkspace,
        show_progress: bool,
    ) -> Result<usize, InstallError> {
        let name = target.name.as_str();

        self.reporter.start_step(name, InstallStage::Downloading);
        let reporter = &self.reporter;
        let on_bytes = move |transferred: u64, total: Option<u64>| {
            if show_progress {
                reporter.update_bytes(name, transferred, total);
            }
        };
        self.caps
            .downloader
            .download(&target.archive_url, &workspace.archive, &on_bytes)
            .await
            .map_err(|e| InstallError::DownloadFailed(format!("{:#}", e)))?;

        self.reporter.start_step(name, InstallStage::Extracting);
        self.caps
            .extractor
            .extract(&workspace.archive, &workspace.extract_dir)
            .await
            .map_err(|e| InstallError::ExtractFailed(format!("{:#}", e)))?;

        self.reporter.start_step(name, InstallStage::Locating);
        let bundles = self.locate_bundles(&workspace.extract_dir).await?;

        self.reporter.start_step(name, InstallStage::Placing);
        self.caps
            .fs
            .create_dir_all(&self.destination)
            .await
            .map_err(|e| InstallError::PlacementFailed(format!("{:#}", e)))?;

        let mut placed = 0;
        for bundle in &bundles {
            // Re-checked per bundle: another installer may have placed it
            // since the Checking stage.
            let present = self
                .caps
                .fs
                .list_dir(&self.destination)
                .await
                .map_err(|e| InstallError::PlacementFailed(format!("{:#}", e)))?;
            if present.contains(bundle) {
                log::warn!(
                    "{} already exists in {:?}, leaving it untouched",
                    bundle,
                    self.destination
                );
                self.reporter
                    .set_message(name, &format!("{} already present, not replaced", bundle));
                continue;
            }

            let dest = self.destination.join(bundle);
            self.caps
                .fs
                .move_path(&workspace.extract_dir.join(bundle), &dest)
                .await
                .map_err(|e| InstallError::PlacementFailed(format!("{}: {:#}", bundle, e)))?;
            log::debug!("Placed {:?}", dest);
            placed += 1;
        }

        Ok(placed)
    }

    /// Bundles directly inside the extraction directory. An archive may ship
    /// more than one.
    async fn locate_bundles(&self, extract_dir: &Path) -> Result<Vec<String>, InstallError> {
        let entries = self.caps.fs.list_dir(extract_dir).await.map_err(|e| {
            InstallError::BundleNotFound(format!("cannot read {:?}: {:#}", extract_dir, e))
        })?;

        let bundles: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.ends_with(&self.bundle_suffix))
            .collect();

        if bundles.is_empty() {
            return Err(InstallError::BundleNotFound(format!(
                "archive contains no {} bundle",
                self.bundle_suffix
            )));
        }
        log::debug!("Located bundles: {:?}", bundles);
        Ok(bundles)
    }

    /// Best effort: a failed removal is logged and never replaces the
    /// pipeline's own outcome.
    async fn cleanup(&self, workspace: &TempWorkspace) {
        for path in [&workspace.archive, &workspace.extract_dir] {
            if let Err(e) = self.caps.fs.remove_path(path).await {
                log::warn!("Failed to clean up {:?}: {:#}", path, e);
            }
        }
    }
}
