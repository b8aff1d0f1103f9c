use crate::error::{AamError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "aamporter.toml";

const DEFAULT_WEBFEED_BASEURL: &str = "http://swupmf.adobe.com";
const DEFAULT_UPDATES_BASEURL: &str = "http://swupdl.adobe.com";
const DEFAULT_CACHE_DIR: &str = "aamcache";
const DEFAULT_MUNKI_DIR: &str = "/usr/local/munki";

/// A managed base product and the AAM channels its updates are published on
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<String>,
}

/// Contents of `aamporter.toml`
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Internal mirror serving both the feed and the update payloads
    pub aam_server_baseurl: Option<String>,
    pub local_cache_path: Option<PathBuf>,
    #[serde(default)]
    pub pkginfo_name_suffix: String,
    #[serde(default)]
    pub munkiimport_options: Vec<String>,
    #[serde(default = "default_munki_dir")]
    pub munki_dir: PathBuf,
    pub munki_repo_path: Option<PathBuf>,
    #[serde(default = "default_cc_munkiimport_options")]
    pub cc_munkiimport_options: Vec<String>,
    #[serde(default)]
    pub products: Vec<Product>,

    /// Directory the config was loaded from, used to anchor relative paths
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_munki_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MUNKI_DIR)
}

pub fn default_cc_munkiimport_options() -> Vec<String> {
    [
        "--subdirectory",
        "apps/Adobe/CC/2014",
        "--developer",
        "Adobe",
        "--category",
        "Creativity",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Read and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AamError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = Self::from_toml(&content)?;
        config.base_dir = base_dir;
        Ok(config)
    }

    /// Configuration used when no file is present; only suitable for `import-cc`
    pub fn fallback() -> Self {
        Self {
            aam_server_baseurl: None,
            local_cache_path: None,
            pkginfo_name_suffix: String::new(),
            munkiimport_options: Vec::new(),
            munki_dir: default_munki_dir(),
            munki_repo_path: None,
            cc_munkiimport_options: default_cc_munkiimport_options(),
            products: Vec::new(),
            base_dir: PathBuf::from("."),
        }
    }

    /// Parse configuration text; relative paths resolve against the current directory
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.base_dir = PathBuf::from(".");
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(AamError::Config("Product name must not be empty".to_string()));
            }
            if product.channels.is_empty() && std::env::var("AAMPORTER_VERBOSE").is_ok() {
                eprintln!("[VERBOSE] Product '{}' lists no channels", product.name);
            }
        }

        if let Some(url) = &self.aam_server_baseurl {
            validate_base_url(url)?;
        }

        Ok(())
    }

    /// Feed based commands have nothing to do without products
    pub fn ensure_products(&self) -> Result<()> {
        if self.products.is_empty() {
            return Err(AamError::Config(
                "No products configured. Add at least one [[products]] table".to_string(),
            ));
        }
        Ok(())
    }

    pub fn feed_base_url(&self) -> &str {
        self.aam_server_baseurl
            .as_deref()
            .unwrap_or(DEFAULT_WEBFEED_BASEURL)
    }

    pub fn updates_base_url(&self) -> &str {
        self.aam_server_baseurl
            .as_deref()
            .unwrap_or(DEFAULT_UPDATES_BASEURL)
    }

    /// Download directory, anchored at the config file's directory when relative
    pub fn cache_dir(&self) -> PathBuf {
        match &self.local_cache_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.base_dir.join(path),
            None => self.base_dir.join(DEFAULT_CACHE_DIR),
        }
    }

    pub fn base_products_for_channel(&self, channel: &str) -> Vec<String> {
        base_products_for_channel(&self.products, channel)
    }
}

/// Names of every product subscribed to a channel, in configuration order
pub fn base_products_for_channel(products: &[Product], channel: &str) -> Vec<String> {
    products
        .iter()
        .filter(|product| product.channels.iter().any(|c| c == channel))
        .map(|product| product.name.clone())
        .collect()
}

fn validate_base_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|_| AamError::Config(format!("Invalid AAM server URL: {url}")))?;

    match parsed.scheme() {
        "https" | "http" => Ok(()),
        scheme => Err(AamError::Config(format!(
            "Unsupported AAM server scheme: {scheme}"
        ))),
    }
}
