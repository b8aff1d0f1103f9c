use crate::error::{AamError, Result};
use quick_xml::de::from_str;
use serde::Deserialize;

/// Metadata published alongside each update payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDetails {
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// First file listed under `InstallFiles`, absent for metadata-only updates
    pub installer: Option<InstallerFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerFile {
    pub name: String,
    pub size: u64,
}

impl UpdateDetails {
    /// Parse an update details document (`<product>/<version>/<version>.xml`)
    pub fn parse(xml: &str) -> Result<Self> {
        let document: DetailsDocument = from_str(xml).map_err(|e| {
            AamError::XmlParsing(format!("Failed to parse update details: {}", e))
        })?;

        let installer = match document
            .install_files
            .and_then(|files| files.files.into_iter().next())
        {
            Some(file) => Some(installer_from(file)?),
            None => None,
        };

        Ok(Self {
            display_name: document.display_name.and_then(|l| l.en_us),
            description: document.description.and_then(|l| l.en_us),
            installer,
        })
    }
}

fn installer_from(file: FileElement) -> Result<InstallerFile> {
    let name = file
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AamError::XmlParsing("Install file has no Name".to_string()))?;
    let size = file
        .size
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| AamError::XmlParsing(format!("Install file '{name}' has no Size")))?
        .parse::<u64>()
        .map_err(|e| AamError::XmlParsing(format!("Invalid size for '{name}': {e}")))?;

    Ok(InstallerFile {
        name: name.trim().to_string(),
        size,
    })
}

#[derive(Debug, Deserialize)]
struct DetailsDocument {
    #[serde(rename = "DisplayName")]
    display_name: Option<Localized>,
    #[serde(rename = "Description")]
    description: Option<Localized>,
    #[serde(rename = "InstallFiles")]
    install_files: Option<InstallFiles>,
}

#[derive(Debug, Deserialize)]
struct Localized {
    #[serde(rename = "en_US")]
    en_us: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstallFiles {
    #[serde(rename = "File", default)]
    files: Vec<FileElement>,
}

#[derive(Debug, Deserialize)]
struct FileElement {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Size")]
    size: Option<String>,
}
