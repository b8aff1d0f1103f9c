use crate::error::{AamError, Result};
use quick_xml::de::from_str;
use serde::Deserialize;

/// Minimal XML property list model, enough to read Munki catalogs and preferences
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlistValue {
    Dict(PlistDict),
    Array(PlistArray),
    Key(String),
    String(String),
    Integer(String),
    Real(String),
    Date(String),
    Data(String),
    True,
    False,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlistDict {
    #[serde(rename = "$value", default)]
    items: Vec<PlistValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlistArray {
    #[serde(rename = "$value", default)]
    items: Vec<PlistValue>,
}

#[derive(Debug, Deserialize)]
struct PlistDocument {
    #[serde(rename = "$value")]
    root: PlistValue,
}

impl PlistDict {
    /// Value stored under `key`; dict children alternate `<key>` and value elements
    pub fn get(&self, key: &str) -> Option<&PlistValue> {
        self.items.chunks(2).find_map(|pair| match pair {
            [PlistValue::Key(k), value] if k == key => Some(value),
            _ => None,
        })
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(PlistValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl PlistArray {
    pub fn dicts(&self) -> impl Iterator<Item = &PlistDict> {
        self.items.iter().filter_map(|value| match value {
            PlistValue::Dict(dict) => Some(dict),
            _ => None,
        })
    }
}

/// Parse an XML plist document. Binary plists are rejected.
pub fn parse(xml: &str) -> Result<PlistValue> {
    if xml.starts_with("bplist") {
        return Err(AamError::XmlParsing(
            "Binary property lists are not supported; convert with `plutil -convert xml1`"
                .to_string(),
        ));
    }

    let document: PlistDocument = from_str(xml)
        .map_err(|e| AamError::XmlParsing(format!("Failed to parse property list: {}", e)))?;
    Ok(document.root)
}
