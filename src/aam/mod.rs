pub mod client;
pub mod details;

pub use client::AamClient;
pub use details::UpdateDetails;

use crate::error::Result;
use std::path::Path;

/// Where update metadata and payloads come from
pub trait UpdateSource {
    fn fetch_feed(&self) -> Result<String>;

    fn fetch_details(&self, product: &str, version: &str) -> Result<UpdateDetails>;

    fn installer_url(&self, product: &str, version: &str, file_name: &str) -> String;

    /// Download a payload to `dest`, returning the number of bytes written
    fn download(&self, url: &str, dest: &Path, expected_size: u64) -> Result<u64>;
}
