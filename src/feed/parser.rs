use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Marker in the first field of a feed token that withdraws an update
pub const REVOKE_MARKER: &str = "REVOKE";
/// Channel id that revocations use to apply everywhere
pub const ALL_CHANNELS: &str = "ALL";

const COMBO_PREFIX: &str = "COMBO";

/// A single update announcement from the AAM updater feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UpdateEntry {
    pub channel: String,
    pub product: String,
    pub version: String,
    pub revoked: bool,
}

impl UpdateEntry {
    pub fn new(
        channel: impl Into<String>,
        product: impl Into<String>,
        version: impl Into<String>,
        revoked: bool,
    ) -> Self {
        Self {
            channel: channel.into(),
            product: product.into(),
            version: version.into(),
            revoked,
        }
    }

    /// Whether this entry refers to the given product build
    pub fn is_build(&self, product: &str, version: &str) -> bool {
        self.product == product && self.version == version
    }
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"<(.+)>").expect("feed token regex is valid"))
}

/// Extract the contents of every `<...>` token in the feed text.
///
/// Matching is per line and greedy, so a line holding several tokens yields a
/// single capture spanning from the first `<` to the last `>`.
pub fn extract_entries(text: &str) -> Vec<String> {
    token_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Turn raw feed tokens into update entries.
///
/// The last three comma separated fields are channel, product and version;
/// anything before them is a qualifier such as `REVOKE`.
pub fn parse_entries<S: AsRef<str>>(raw: &[S]) -> Vec<UpdateEntry> {
    raw.iter().filter_map(|token| parse_entry(token.as_ref())).collect()
}

fn parse_entry(token: &str) -> Option<UpdateEntry> {
    // COMBO bundles reference other updates and have no details document
    if token.starts_with(COMBO_PREFIX) {
        return None;
    }

    let fields: Vec<&str> = token.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        if std::env::var("AAMPORTER_VERBOSE").is_ok() {
            eprintln!("[VERBOSE] Ignoring malformed feed token: <{}>", token);
        }
        return None;
    }

    let n = fields.len();
    Some(UpdateEntry::new(
        fields[n - 3],
        fields[n - 2],
        fields[n - 1],
        fields[0] == REVOKE_MARKER,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = "\
<AdobePhotoshopCS6-13.0,AdobePhotoshop13-mul,13.0.1.1>
<AdobeIllustratorCS6-16.0,AdobeIllustrator16-mul,16.0.3>
<REVOKE,AdobeIllustratorCS6-16.0,AdobeIllustrator16-mul,16.0.2>
<COMBO,AdobePhotoshopCS6-13.0,AdobePhotoshop13-mul,13.0.1.2>
";

    #[test]
    fn extracts_one_token_per_line() {
        let raw = extract_entries(SAMPLE_FEED);
        assert_eq!(raw.len(), 4);
        assert_eq!(
            raw[0],
            "AdobePhotoshopCS6-13.0,AdobePhotoshop13-mul,13.0.1.1"
        );
    }

    #[test]
    fn greedy_match_spans_tokens_on_same_line() {
        let raw = extract_entries("<a,b,c><d,e,f>");
        assert_eq!(raw, vec!["a,b,c><d,e,f".to_string()]);
    }

    #[test]
    fn parses_channel_product_version_from_the_tail() {
        let entries = parse_entries(&extract_entries(SAMPLE_FEED));
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            UpdateEntry::new(
                "AdobePhotoshopCS6-13.0",
                "AdobePhotoshop13-mul",
                "13.0.1.1",
                false
            )
        );
        assert!(entries[2].revoked);
        assert_eq!(entries[2].channel, "AdobeIllustratorCS6-16.0");
        assert_eq!(entries[2].version, "16.0.2");
    }

    #[test]
    fn skips_combo_and_short_tokens() {
        let entries = parse_entries(&[
            "COMBO,chan,prod,1.0",
            "?xml version=\"1.0\"?",
            "only,two",
            "chan,prod,1.0",
        ]);
        assert_eq!(entries, vec![UpdateEntry::new("chan", "prod", "1.0", false)]);
    }

    #[test]
    fn revoke_marker_must_be_first_field() {
        let entries = parse_entries(&["chan,REVOKE,1.0", "REVOKE, ALL , prod , 2.0 "]);
        assert!(!entries[0].revoked);
        assert!(entries[1].revoked);
        assert_eq!(entries[1].channel, ALL_CHANNELS);
        assert_eq!(entries[1].product, "prod");
        assert_eq!(entries[1].version, "2.0");
    }
}
