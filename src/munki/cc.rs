use crate::error::{AamError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const BUILD_DIR: &str = "Build";
const INSTALL_SUFFIX: &str = "Install.pkg";
const UNINSTALL_SUFFIX: &str = "Uninstall.pkg";

/// A Creative Cloud Packager build output: installer plus matching uninstaller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcPackage {
    pub product: String,
    pub installer: PathBuf,
    pub uninstaller: Option<PathBuf>,
}

impl CcPackage {
    /// munkiimport arguments importing the installer with its uninstaller attached
    pub fn import_args(&self, options: &[String]) -> Vec<String> {
        let mut args = vec!["--nointeractive".to_string()];
        args.extend(options.iter().cloned());
        if let Some(uninstaller) = &self.uninstaller {
            args.push("--uninstallerpkg".to_string());
            args.push(uninstaller.to_string_lossy().into_owned());
        }
        args.push(self.installer.to_string_lossy().into_owned());
        args
    }
}

/// Scan a folder of CCP builds (`<Product>/Build/*_Install.pkg`).
///
/// Product folders without an installer package are skipped.
pub fn find_cc_packages(dir: &Path) -> Result<Vec<CcPackage>> {
    if !dir.is_dir() {
        return Err(AamError::Munki(format!(
            "'{}' is not a directory of CCP builds",
            dir.display()
        )));
    }

    let mut products: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    products.sort();

    let mut packages = Vec::new();
    for product_dir in products {
        let product = product_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let build_dir = product_dir.join(BUILD_DIR);
        let installer = find_with_suffix(&build_dir, INSTALL_SUFFIX)?;
        let Some(installer) = installer else {
            if std::env::var("AAMPORTER_VERBOSE").is_ok() {
                eprintln!("[VERBOSE] No *{} in {}", INSTALL_SUFFIX, build_dir.display());
            }
            continue;
        };

        packages.push(CcPackage {
            product,
            installer,
            uninstaller: find_with_suffix(&build_dir, UNINSTALL_SUFFIX)?,
        });
    }

    Ok(packages)
}

fn find_with_suffix(dir: &Path, suffix: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut matches: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().ends_with(suffix))
                .unwrap_or(false)
        })
        .collect();
    matches.sort();
    Ok(matches.into_iter().next())
}
