pub mod cc;
pub mod plist;

pub use cc::{find_cc_packages, CcPackage};

use crate::error::{AamError, Result};
use plist::PlistValue;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_PKG_SUBDIR: &str = "apps/Adobe/CS_Updates";
const MUNKIIMPORT_PREFS: &str = "Library/Preferences/com.googlecode.munki.munkiimport.plist";

/// Everything munkiimport needs to know about one update payload
#[derive(Debug, Clone)]
pub struct ImportRequest<'a> {
    pub item_name: &'a str,
    pub display_name: &'a str,
    pub description: Option<&'a str>,
    pub update_for: &'a [String],
    pub installer: &'a Path,
}

/// A pkginfo already present in the repo's `all` catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub name: String,
    pub version: Option<String>,
    pub installer_item_hash: Option<String>,
}

/// Wrapper around the Munki command line tools
#[derive(Debug)]
pub struct MunkiTools {
    munki_dir: PathBuf,
    repo_path: Option<PathBuf>,
}

impl MunkiTools {
    /// Check that Munki is installed and munkiimport has been configured.
    ///
    /// The repo path comes from `repo_override` when given, otherwise from the
    /// munkiimport preferences.
    pub fn locate(munki_dir: &Path, repo_override: Option<&Path>) -> Result<Self> {
        if !munki_dir.is_dir() {
            return Err(AamError::Munki(format!(
                "No Munki installation could be found at '{}'. Get it at https://www.munki.org",
                munki_dir.display()
            )));
        }

        let prefs = dirs::home_dir()
            .map(|home| home.join(MUNKIIMPORT_PREFS))
            .filter(|path| path.exists())
            .ok_or_else(|| {
                AamError::Munki(
                    "Your Munki repo seems to not be configured. Run munkiimport --configure first."
                        .to_string(),
                )
            })?;

        let repo_path = match repo_override {
            Some(path) => Some(path.to_path_buf()),
            None => match read_repo_path(&prefs) {
                Ok(path) => path,
                Err(e) => {
                    if std::env::var("AAMPORTER_VERBOSE").is_ok() {
                        eprintln!("[VERBOSE] Could not read munkiimport preferences: {}", e);
                    }
                    None
                }
            },
        };

        Ok(Self::new(munki_dir, repo_path))
    }

    pub fn new(munki_dir: &Path, repo_path: Option<PathBuf>) -> Self {
        Self {
            munki_dir: munki_dir.to_path_buf(),
            repo_path,
        }
    }

    pub fn repo_path(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }

    /// Look for a pkginfo with the same name whose installer hash matches the payload
    pub fn find_matching_item(
        &self,
        item_name: &str,
        installer: &Path,
    ) -> Result<Option<CatalogItem>> {
        let Some(repo) = &self.repo_path else {
            return Ok(None);
        };

        let catalog_path = repo.join("catalogs").join("all");
        if !catalog_path.exists() {
            return Ok(None);
        }

        let items = read_catalog(&catalog_path)?;
        let hash = sha256_file(installer)?;

        Ok(items.into_iter().find(|item| {
            item.name == item_name && item.installer_item_hash.as_deref() == Some(hash.as_str())
        }))
    }

    /// Run munkiimport; returns whether it exited successfully
    pub fn import(&self, args: &[String]) -> Result<bool> {
        self.run_tool("munkiimport", args)
    }

    /// Rebuild the repo catalogs so later imports see freshly added items
    pub fn make_catalogs(&self) -> Result<bool> {
        let args: Vec<String> = self
            .repo_path
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        self.run_tool("makecatalogs", &args)
    }

    fn run_tool(&self, tool: &str, args: &[String]) -> Result<bool> {
        let program = self.munki_dir.join(tool);
        if std::env::var("AAMPORTER_VERBOSE").is_ok() {
            eprintln!("[VERBOSE] Executing: {} {}", program.display(), args.join(" "));
        }

        let status = Command::new(&program).args(args).status().map_err(|e| {
            AamError::Munki(format!("Failed to execute '{}': {}", program.display(), e))
        })?;

        Ok(status.success())
    }
}

/// Munki item name for an update: dashes become underscores, then the suffix
pub fn item_name(product: &str, suffix: &str) -> String {
    format!("{}{}", product.replace('-', "_"), suffix)
}

/// Assemble the munkiimport command line for an update payload
pub fn build_import_args(options: &[String], request: &ImportRequest<'_>) -> Vec<String> {
    let mut args = vec!["--nointeractive".to_string()];
    args.extend(options.iter().cloned());

    if !options.iter().any(|opt| opt == "--subdirectory") {
        args.push("--subdirectory".to_string());
        args.push(DEFAULT_PKG_SUBDIR.to_string());
    }

    for base in request.update_for {
        args.push("--update_for".to_string());
        args.push(base.clone());
    }

    args.push("--name".to_string());
    args.push(request.item_name.to_string());
    args.push("--displayname".to_string());
    args.push(request.display_name.to_string());
    if let Some(description) = request.description {
        args.push("--description".to_string());
        args.push(description.to_string());
    }

    args.push(request.installer.to_string_lossy().into_owned());
    args
}

fn read_repo_path(prefs: &Path) -> Result<Option<PathBuf>> {
    let content = fs::read_to_string(prefs)?;
    match plist::parse(&content)? {
        PlistValue::Dict(dict) => Ok(dict.get_str("repo_path").map(PathBuf::from)),
        _ => Ok(None),
    }
}

/// Read every item of a catalog plist
pub fn read_catalog(path: &Path) -> Result<Vec<CatalogItem>> {
    let content = fs::read_to_string(path)?;
    let PlistValue::Array(array) = plist::parse(&content)? else {
        return Err(AamError::Munki(format!(
            "Catalog '{}' is not an array",
            path.display()
        )));
    };

    Ok(array
        .dicts()
        .filter_map(|dict| {
            Some(CatalogItem {
                name: dict.get_str("name")?.to_string(),
                version: dict.get_str("version").map(str::to_string),
                installer_item_hash: dict.get_str("installer_item_hash").map(str::to_string),
            })
        })
        .collect())
}

/// Hex encoded SHA-256, the format Munki stores in `installer_item_hash`
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
