// file: src/network/download.rs
// version: 2.0.0
// guid: 1ba17b93-9948-477d-962a-d6d201739572

//! Network download utilities

use crate::error::HardenError;
use crate::Result;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

/// Network downloader with progress tracking
pub struct NetworkDownloader {
    client: reqwest::Client,
}

impl NetworkDownloader {
    /// Create a new network downloader
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .https_only(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Reject anything that is not an absolute https URL
    pub fn require_https(url: &str) -> Result<Url> {
        let parsed = Url::parse(url)
            .map_err(|e| HardenError::network(format!("Invalid URL {}: {}", url, e)))?;
        if parsed.scheme() != "https" {
            return Err(HardenError::network(format!(
                "Refusing non-HTTPS download: {}",
                url
            )));
        }
        Ok(parsed)
    }

    /// Download file with progress bar
    pub async fn download_with_progress<P: AsRef<Path>>(&self, url: &str, dest: P) -> Result<()> {
        let url = Self::require_https(url)?;
        info!("Downloading: {}", url);

        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(HardenError::network(format!(
                "Download failed with status: {}",
                response.status()
            )));
        }

        let total_size = response.content_length().unwrap_or(0);

        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut file = File::create(&dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        file.flush().await?;
        pb.finish_and_clear();

        debug!("Downloaded {} bytes to {}", downloaded, dest.as_ref().display());
        Ok(())
    }
}

impl Default for NetworkDownloader {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase hex SHA-256 of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compare `data` against a pinned digest
pub fn verify_sha256(data: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(data);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(HardenError::network(format!(
            "Checksum mismatch: expected {}, got {}",
            expected, actual
        )))
    }
}
