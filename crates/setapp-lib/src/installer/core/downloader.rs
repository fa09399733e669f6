use super::traits::{ArchiveDownloader, BoxFuture, ByteProgress};
use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::{create_dir_all, File};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

/// Streams archives over HTTP.
///
/// There is no limit on the transfer as a whole: archives can take minutes.
/// Instead the connection, the response headers and every body chunk must
/// each arrive within `idle_timeout`.
pub struct HttpDownloader {
    client: Client,
    idle_timeout: Duration,
}

impl HttpDownloader {
    pub fn new(idle_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(idle_timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            idle_timeout,
        })
    }
}

impl ArchiveDownloader for HttpDownloader {
    fn download<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
        progress: ByteProgress<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(download_to_path(
            &self.client,
            url,
            dest,
            self.idle_timeout,
            progress,
        ))
    }
}

/// Download `url` to `path`, reporting bytes as they arrive.
///
/// Bytes land in `<path>.part` and are renamed into place once complete, so a
/// failed transfer never leaves a truncated archive at `path`.
pub async fn download_to_path(
    client: &Client,
    url: &str,
    path: &Path,
    idle_timeout: Duration,
    progress: ByteProgress<'_>,
) -> Result<()> {
    log::debug!("Downloading: {} -> {:?}", url, path);

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }

    let tmp_name = format!(
        "{}.part",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("download")
    );
    let tmp_path = path.with_file_name(tmp_name);

    let result = stream_to_file(client, url, &tmp_path, idle_timeout, progress).await;
    match result {
        Ok(()) => {
            tokio::fs::rename(&tmp_path, path)
                .await
                .with_context(|| format!("Failed to move download into {:?}", path))?;
            Ok(())
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            Err(e)
        }
    }
}

async fn stream_to_file(
    client: &Client,
    url: &str,
    tmp_path: &Path,
    idle_timeout: Duration,
    progress: ByteProgress<'_>,
) -> Result<()> {
    let start = Instant::now();
    let response = timeout(idle_timeout, client.get(url).send())
        .await
        .map_err(|_| anyhow::anyhow!("No response from {} within {:?}", url, idle_timeout))?
        .with_context(|| format!("Failed to GET {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP error {}: {}", response.status(), url);
    }

    let total_size = response.content_length();
    log::debug!("Download size: {:?} bytes", total_size);

    let mut file = File::create(tmp_path)
        .await
        .with_context(|| format!("Failed to create {:?}", tmp_path))?;
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    loop {
        let next = timeout(idle_timeout, stream.next()).await.map_err(|_| {
            anyhow::anyhow!(
                "Download of {} stalled: no data for {:?} after {} bytes",
                url,
                idle_timeout,
                downloaded
            )
        })?;
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.with_context(|| format!("Connection lost while reading {}", url))?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        downloaded += chunk.len() as u64;
        progress(downloaded, total_size);
    }
    file.flush().await?;
    // Ensure data is flushed to disk
    file.sync_all().await?;
    drop(file);

    let secs = start.elapsed().as_secs_f64();
    log::info!(
        "Download stats: url={}, size={} bytes, time={:.2}s, throughput={:.2} MB/s",
        url,
        downloaded,
        secs,
        (downloaded as f64 / 1024.0 / 1024.0) / secs.max(0.001)
    );

    Ok(())
}
