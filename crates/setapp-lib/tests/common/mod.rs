#![allow(dead_code)]

use anyhow::Result;
use setapp_lib::catalog::{CatalogDocument, CatalogHeaders, CatalogSource, FetchedCatalog};
use setapp_lib::installer::core::{
    ArchiveDownloader, ArchiveExtractor, BoxFuture, ByteProgress, LocalFs,
};
use setapp_lib::{
    Capabilities, InstallPipeline, InstallResult, InstallStage, InstallTarget, InstallerConfig,
    ProgressReporter,
};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------
// MockDownloader – serves in-memory archives keyed by URL
// ---------------------------------------------------------------------
#[derive(Default)]
pub struct MockDownloader {
    archives: HashMap<String, Vec<u8>>,
    panics: HashSet<String>,
    calls: AtomicUsize,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.archives.insert(url.to_string(), body.into());
        self
    }

    pub fn panic_on(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArchiveDownloader for MockDownloader {
    fn download<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
        progress: ByteProgress<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panics.contains(url) {
                // Leave a partial archive behind, as a real mid-transfer crash would
                tokio::fs::write(dest, b"partial").await?;
                panic!("downloader exploded on {}", url);
            }
            let body = self
                .archives
                .get(url)
                .ok_or_else(|| anyhow::anyhow!("HTTP error 404 Not Found: {}", url))?;
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(dest, body).await?;
            progress(body.len() as u64, Some(body.len() as u64));
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------
// ListingExtractor – treats an "archive" as a newline separated list of
// top-level entries to create; `CORRUPT` makes extraction fail.
// ---------------------------------------------------------------------
pub struct ListingExtractor;

pub fn listing(entries: &[&str]) -> Vec<u8> {
    entries.join("\n").into_bytes()
}

impl ArchiveExtractor for ListingExtractor {
    fn extract<'a>(&'a self, archive: &'a Path, dest_dir: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let contents = tokio::fs::read_to_string(archive).await?;
            if contents.trim() == "CORRUPT" {
                anyhow::bail!("invalid Zip archive: Could not find EOCD");
            }
            tokio::fs::create_dir_all(dest_dir).await?;
            for entry in contents.lines().filter(|l| !l.is_empty()) {
                let path = dest_dir.join(entry);
                if entry.ends_with(".app") {
                    tokio::fs::create_dir_all(path.join("Contents")).await?;
                    tokio::fs::write(path.join("Contents").join("Info.plist"), entry).await?;
                } else {
                    tokio::fs::write(path, entry).await?;
                }
            }
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------
// RecordingReporter – an in-memory ProgressReporter
// ---------------------------------------------------------------------
#[derive(Default)]
pub struct RecordingReporter {
    pub steps: Mutex<Vec<(String, InstallStage)>>,
    pub messages: Mutex<Vec<(String, String)>>,
    pub byte_updates: AtomicUsize,
    pub finished: Mutex<Vec<InstallResult>>,
}

impl RecordingReporter {
    pub fn stages_for(&self, target: &str) -> Vec<InstallStage> {
        self.steps
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, s)| *s)
            .collect()
    }

    pub fn byte_updates(&self) -> usize {
        self.byte_updates.load(Ordering::SeqCst)
    }
}

impl ProgressReporter for RecordingReporter {
    fn start_step(&self, target: &str, stage: InstallStage) {
        self.steps.lock().unwrap().push((target.to_string(), stage));
    }
    fn update_bytes(&self, _target: &str, _transferred: u64, _total: Option<u64>) {
        self.byte_updates.fetch_add(1, Ordering::SeqCst);
    }
    fn set_message(&self, target: &str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((target.to_string(), message.to_string()));
    }
    fn done(&self, result: &InstallResult) {
        self.finished.lock().unwrap().push(result.clone());
    }
}

// ---------------------------------------------------------------------
// StaticSource – a CatalogSource serving a fixed document
// ---------------------------------------------------------------------
pub struct StaticSource {
    pub document: CatalogDocument,
    pub headers: CatalogHeaders,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(document: CatalogDocument) -> Arc<Self> {
        Arc::new(Self {
            document,
            headers: CatalogHeaders::default(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CatalogSource for StaticSource {
    fn fetch(&self) -> BoxFuture<'_, Result<FetchedCatalog>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedCatalog {
                document: self.document.clone(),
                headers: self.headers.clone(),
            })
        })
    }
}

// ---------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------
pub struct Sandbox {
    _root: tempfile::TempDir,
    pub destination: PathBuf,
    pub temp: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let destination = root.path().join("Applications").join("Setapp");
        let temp = root.path().join("tmp");
        std::fs::create_dir_all(&temp).unwrap();
        Self {
            _root: root,
            destination,
            temp,
        }
    }

    pub fn config(&self) -> InstallerConfig {
        InstallerConfig {
            destination: self.destination.clone(),
            temp_dir: self.temp.clone(),
            ..InstallerConfig::default()
        }
    }

    pub fn pipeline(
        &self,
        downloader: Arc<MockDownloader>,
        extractor: Arc<dyn ArchiveExtractor>,
        reporter: Arc<RecordingReporter>,
    ) -> InstallPipeline {
        let caps = Capabilities {
            downloader,
            extractor,
            fs: Arc::new(LocalFs),
        };
        InstallPipeline::new(&self.config(), caps, reporter)
    }

    pub fn temp_is_empty(&self) -> bool {
        std::fs::read_dir(&self.temp).unwrap().next().is_none()
    }

    pub fn preinstall(&self, bundle: &str, marker: &str) {
        let path = self.destination.join(bundle);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("marker"), marker).unwrap();
    }
}

pub fn target(id: u64, name: &str, url: &str) -> InstallTarget {
    InstallTarget {
        id,
        name: name.to_string(),
        archive_url: url.to_string(),
    }
}

/// A real zip archive containing the given files
pub fn zip_archive(files: &[(&str, &str)]) -> Vec<u8> {
    use zip::write::FileOptions;

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, body) in files {
        zip.start_file::<&str, ()>(*name, FileOptions::default())
            .unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
