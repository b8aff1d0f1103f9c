pub mod parser;

pub use parser::{extract_entries, parse_entries, UpdateEntry, ALL_CHANNELS};

use crate::config::{base_products_for_channel, Product};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Parsed AAM updater feed
#[derive(Debug, Clone, Default)]
pub struct Feed {
    entries: Vec<UpdateEntry>,
}

/// An update selected for mirroring, merged across every channel announcing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUpdate {
    pub product: String,
    pub version: String,
    pub channels: Vec<String>,
    /// Configured base products this update applies to
    pub update_for: Vec<String>,
    /// Only set when revoked updates were explicitly requested
    pub revoked: bool,
}

/// Outcome of mapping the feed onto the configured products
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub updates: Vec<ResolvedUpdate>,
    pub revoked: Vec<UpdateEntry>,
    pub empty_channels: Vec<String>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

impl Feed {
    pub fn new(entries: Vec<UpdateEntry>) -> Self {
        Self { entries }
    }

    pub fn parse(text: &str) -> Self {
        Self::new(parse_entries(&extract_entries(text)))
    }

    pub fn entries(&self) -> &[UpdateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries announced on a channel, revocations included, in feed order
    pub fn updates_for_channel(&self, channel: &str) -> Vec<&UpdateEntry> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|entry| entry.channel == channel)
            .filter(|entry| seen.insert(*entry))
            .collect()
    }

    /// Check whether a build was revoked on the channel or globally
    pub fn is_revoked(&self, channel: &str, product: &str, version: &str) -> bool {
        self.entries.iter().any(|entry| {
            entry.revoked
                && entry.is_build(product, version)
                && (entry.channel == channel || entry.channel == ALL_CHANNELS)
        })
    }

    /// Map the feed onto the configured products.
    ///
    /// Products and their channels are walked in configuration order. A build
    /// announced on several channels is reported once, with the channels and
    /// base products of every announcement merged into the first occurrence.
    pub fn resolve(&self, products: &[Product], include_revoked: bool) -> Resolution {
        let mut resolution = Resolution::default();
        let mut index: HashMap<(String, String), usize> = HashMap::new();
        let mut revoked_seen: HashSet<(&str, &str)> = HashSet::new();

        for product in products {
            for channel in &product.channels {
                let entries = self.updates_for_channel(channel);
                if entries.is_empty() {
                    if !resolution.empty_channels.contains(channel) {
                        resolution.empty_channels.push(channel.clone());
                    }
                    continue;
                }

                for entry in entries {
                    // Revocation markers are not downloadable themselves
                    if entry.revoked {
                        continue;
                    }

                    let revoked = self.is_revoked(channel, &entry.product, &entry.version);
                    if revoked && !include_revoked {
                        if revoked_seen.insert((entry.product.as_str(), entry.version.as_str())) {
                            resolution.revoked.push(entry.clone());
                        }
                        continue;
                    }

                    let base_products = base_products_for_channel(products, channel);
                    let key = (entry.product.clone(), entry.version.clone());

                    if let Some(&position) = index.get(&key) {
                        let existing = &mut resolution.updates[position];
                        push_unique(&mut existing.channels, channel);
                        for base in &base_products {
                            push_unique(&mut existing.update_for, base);
                        }
                        existing.revoked |= revoked;
                        continue;
                    }

                    index.insert(key, resolution.updates.len());
                    resolution.updates.push(ResolvedUpdate {
                        product: entry.product.clone(),
                        version: entry.version.clone(),
                        channels: vec![channel.clone()],
                        update_for: base_products,
                        revoked,
                    });
                }
            }
        }

        resolution
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}
