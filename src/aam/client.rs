use crate::aam::{UpdateDetails, UpdateSource};
use crate::error::{AamError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, Response};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const FEED_PATH: &str = "webfeed/oobe/aam20/mac/updaterfeed.xml";
const UPDATE_PATH_PREFIX: &str = "updates/oobe/aam20/mac";
const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
const METADATA_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// HTTP client for Adobe's AAM 2.0 update servers
pub struct AamClient {
    client: Client,
    feed_base: String,
    updates_base: String,
}

impl AamClient {
    pub fn new(feed_base: &str, updates_base: &str) -> Result<Self> {
        Ok(Self {
            client: Self::build_client()?,
            feed_base: feed_base.trim_end_matches('/').to_string(),
            updates_base: updates_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn feed_url(&self) -> String {
        format!("{}/{}", self.feed_base, FEED_PATH)
    }

    pub fn details_url(&self, product: &str, version: &str) -> String {
        format!("{}/{}.xml", self.update_dir(product, version), version)
    }

    fn update_dir(&self, product: &str, version: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.updates_base, UPDATE_PATH_PREFIX, product, version
        )
    }

    fn build_client() -> Result<Client> {
        Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("aamporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AamError::Http(format!("Failed to build HTTP client: {}", e)))
    }

    fn get(&self, url: &str, timeout: Duration) -> Result<Response> {
        if std::env::var("AAMPORTER_VERBOSE").is_ok() {
            eprintln!("[VERBOSE] Fetching: {}", url);
        }

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| AamError::Http(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AamError::Http(format!("HTTP {}: {}", response.status(), url)));
        }

        Ok(response)
    }

    fn get_document(&self, url: &str) -> Result<String> {
        let response = self.get(url, METADATA_TIMEOUT)?;

        if let Some(length) = response.content_length() {
            if length as usize > MAX_DOCUMENT_BYTES {
                return Err(AamError::Http(format!(
                    "Response from {} exceeded 10MB limit",
                    url
                )));
            }
        }

        let body = read_capped(response, MAX_DOCUMENT_BYTES)
            .map_err(|e| AamError::Http(format!("Failed to read {}: {}", url, e)))?
            .ok_or_else(|| {
                AamError::Http(format!("Response from {} exceeded 10MB limit", url))
            })?;

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn progress_bar(total: u64, label: &str) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:40}] {bytes}/{total_bytes} {bytes_per_sec} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        pb.set_message(label.to_string());
        pb
    }
}

impl UpdateSource for AamClient {
    fn fetch_feed(&self) -> Result<String> {
        self.get_document(&self.feed_url())
            .map_err(|e| AamError::Feed(format!("Could not retrieve updater feed: {}", e)))
    }

    fn fetch_details(&self, product: &str, version: &str) -> Result<UpdateDetails> {
        let url = self.details_url(product, version);
        let xml = self.get_document(&url)?;
        UpdateDetails::parse(&xml)
    }

    fn installer_url(&self, product: &str, version: &str, file_name: &str) -> String {
        format!("{}/{}", self.update_dir(product, version), file_name)
    }

    fn download(&self, url: &str, dest: &Path, expected_size: u64) -> Result<u64> {
        let mut response = self.get(url, DOWNLOAD_TIMEOUT)?;
        let total = response.content_length().unwrap_or(expected_size);

        let label = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pb = Self::progress_bar(total, &label);

        let partial = partial_path(dest);
        let file = File::create(&partial)?;
        let mut writer = pb.wrap_write(BufWriter::new(file));

        let copied = io::copy(&mut response, &mut writer).and_then(|n| writer.flush().map(|_| n));
        drop(writer);

        let written = match copied {
            Ok(n) => n,
            Err(e) => {
                pb.abandon();
                let _ = fs::remove_file(&partial);
                return Err(AamError::Http(format!("Download of {} failed: {}", url, e)));
            }
        };

        pb.finish_and_clear();
        fs::rename(&partial, dest)?;

        Ok(written)
    }
}

/// Read at most `limit` bytes; `None` when the body is longer
fn read_capped<R: Read>(reader: R, limit: usize) -> io::Result<Option<Vec<u8>>> {
    let mut body = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut body)?;
    if body.len() > limit {
        return Ok(None);
    }
    Ok(Some(body))
}

/// Sibling path used while a download is in flight
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Read a saved copy of the updater feed instead of fetching it
pub fn load_feed_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| {
        AamError::Feed(format!(
            "Could not read feed file '{}': {}",
            path.display(),
            e
        ))
    })
}
