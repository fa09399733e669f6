use super::traits::{ArchiveExtractor, BoxFuture};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Unpacks zip archives
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract<'a>(&'a self, archive: &'a Path, dest_dir: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(extract_zip(archive.to_path_buf(), dest_dir.to_path_buf()))
    }
}

/// Extract a zip archive to a directory.
///
/// Runs on the blocking pool. Entries whose paths would escape `dest_dir`
/// are rejected by the archive reader; symlinks (common inside app bundles)
/// and unix modes are preserved.
pub async fn extract_zip(archive: PathBuf, dest_dir: PathBuf) -> Result<()> {
    log::debug!("Extracting {:?} to {:?}", archive, dest_dir);

    tokio::task::spawn_blocking(move || -> Result<()> {
        std::fs::create_dir_all(&dest_dir)
            .with_context(|| format!("Failed to create {:?}", dest_dir))?;

        let file = std::fs::File::open(&archive)
            .with_context(|| format!("Failed to open archive {:?}", archive))?;
        let mut zip = zip::ZipArchive::new(file)
            .with_context(|| format!("Failed to read archive {:?}", archive))?;

        zip.extract(&dest_dir)
            .with_context(|| format!("Failed to unpack {:?}", archive))?;

        log::debug!("Extracted {} entries from {:?}", zip.len(), archive);
        Ok(())
    })
    .await
    .context("Extraction task panicked")?
}
