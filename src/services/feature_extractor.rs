// Lexical URL feature extraction
// Turns a raw URL string into the ordered numeric vector the classifier consumes.
// Pure string work: no DNS, no HTTP, never fails.

use lazy_static::lazy_static;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;
use tracing::debug;

// =============================================================================
// FEATURE LAYOUT
// =============================================================================

/// Feature names in the exact order the extractor emits them.
/// Models are trained against this order; changing it requires a retrain.
pub const FEATURE_LAYOUT: &[&str] = &[
    "url_length",
    "num_directories",
    "query_length",
    "num_dots",
    "num_hyphens",
    "num_underscores",
    "num_slashes",
    "num_parameters",
    "has_ip",
    "has_suspicious_words",
];

/// Total number of features produced by the extractor
pub const FEATURE_COUNT: usize = 10;

/// Value used for any schema feature the extractor did not produce
pub const MISSING_FEATURE_SENTINEL: i64 = -1;

/// Lowercase substrings that mark a URL as using bait vocabulary
pub const SUSPICIOUS_WORDS: &[&str] = &[
    "login", "signin", "auth", "bank", "account", "payment", "transfer", "credit", "debit",
    "password", "secure", "verify", "confirm", "update", "click", "download", "free", "winner",
    "prize", "urgent", "expire",
];

lazy_static! {
    /// Dotted-quad IPv4 literal with every octet in 0-255, anywhere in the string
    static ref IPV4_PATTERN: Regex = Regex::new(
        r"(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)"
    )
    .expect("Invalid IPv4 pattern regex");

    /// Generic URI split: scheme, authority, path, query, fragment
    static ref URL_SPLIT_PATTERN: Regex = Regex::new(
        r"(?s)^(?:([A-Za-z][A-Za-z0-9+.\-]*):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$"
    )
    .expect("Invalid URL split regex");

    /// IPvFuture literal inside brackets, e.g. `v1.fe`
    static ref IPV_FUTURE_PATTERN: Regex = Regex::new(r"^v[a-fA-F0-9]+\..+$")
        .expect("Invalid IPvFuture regex");
}

// =============================================================================
// FEATURE VALUES
// =============================================================================

/// A single feature value; all lexical features are integral today
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
}

impl FeatureValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            FeatureValue::Int(v) => *v as f64,
            FeatureValue::Float(v) => *v,
        }
    }
}

impl From<usize> for FeatureValue {
    fn from(value: usize) -> Self {
        FeatureValue::Int(value as i64)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Int(i64::from(value))
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Int(v) => serializer.serialize_i64(*v),
            FeatureValue::Float(v) => serializer.serialize_f64(*v),
        }
    }
}

/// Ordered mapping of feature name to value.
/// Serializes as a JSON object whose keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(String, FeatureValue)>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a feature, keeping its original position if it already exists
    pub fn insert(&mut self, name: &str, value: impl Into<FeatureValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Project onto a schema, in schema order.
    /// Names the vector does not carry become MISSING_FEATURE_SENTINEL.
    pub fn project<S: AsRef<str>>(&self, schema: &[S]) -> Vec<f64> {
        schema
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .map(|v| v.as_f64())
                    .unwrap_or(MISSING_FEATURE_SENTINEL as f64)
            })
            .collect()
    }

    /// Rebuild the vector with exactly the schema's names, in schema order.
    /// Names the vector lacks get MISSING_FEATURE_SENTINEL; names outside the schema are dropped.
    pub fn conform_to<S: AsRef<str>>(&self, schema: &[S]) -> FeatureVector {
        let entries = schema
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let value = self
                    .get(name)
                    .unwrap_or(FeatureValue::Int(MISSING_FEATURE_SENTINEL));
                (name.to_string(), value)
            })
            .collect();

        FeatureVector { entries }
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// =============================================================================
// URL SPLITTING
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UrlSplitError {
    #[error("Invalid IPv6 URL: {0}")]
    InvalidIpv6(String),

    #[error("URL does not match the generic URI syntax")]
    Unmatched,
}

/// Raw URL components, sliced from the input without normalization
#[derive(Debug, Clone, PartialEq)]
pub struct UrlComponents {
    pub scheme: String,
    pub netloc: String,
    pub path: String,
    pub params: String,
    pub query: String,
    pub fragment: String,
}

/// Split a URL into components the way a lenient parser does.
/// Only structurally broken authorities (unbalanced or invalid IPv6 brackets) fail.
pub fn split_url(url: &str) -> Result<UrlComponents, UrlSplitError> {
    // Leading C0 controls and spaces are stripped, then tabs and newlines dropped
    let cleaned: String = url
        .trim_start_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
        .collect();

    let captures = URL_SPLIT_PATTERN
        .captures(&cleaned)
        .ok_or(UrlSplitError::Unmatched)?;
    let group = |i: usize| captures.get(i).map(|m| m.as_str()).unwrap_or("");

    let scheme = group(1).to_lowercase();
    let netloc = group(2).to_string();
    validate_netloc(&netloc)?;

    let (path, params) = split_params(group(3));

    Ok(UrlComponents {
        scheme,
        netloc,
        path: path.to_string(),
        params: params.to_string(),
        query: group(4).to_string(),
        fragment: group(5).to_string(),
    })
}

fn validate_netloc(netloc: &str) -> Result<(), UrlSplitError> {
    let opens = netloc.contains('[');
    let closes = netloc.contains(']');
    if opens != closes {
        return Err(UrlSplitError::InvalidIpv6(netloc.to_string()));
    }

    if opens {
        // Userinfo may precede the bracketed host
        let host_part = netloc.rsplit('@').next().unwrap_or(netloc);
        let start = host_part.find('[');
        let end = host_part.find(']');
        match (start, end) {
            (Some(s), Some(e)) if s < e => {
                let bracketed = &host_part[s..=e];
                let valid = if host_part[s + 1..e].starts_with('v') {
                    IPV_FUTURE_PATTERN.is_match(&host_part[s + 1..e])
                } else {
                    url::Host::parse(bracketed).is_ok()
                };
                if !valid {
                    return Err(UrlSplitError::InvalidIpv6(netloc.to_string()));
                }
            },
            _ => return Err(UrlSplitError::InvalidIpv6(netloc.to_string())),
        }
    }

    Ok(())
}

/// `;params` only split off the last path segment
fn split_params(path: &str) -> (&str, &str) {
    let search_from = path.rfind('/').unwrap_or(0);
    match path[search_from..].find(';') {
        Some(offset) => {
            let i = search_from + offset;
            (&path[..i], &path[i + 1..])
        },
        None => (path, ""),
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Outcome of feature extraction; both variants carry a complete vector
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed(FeatureVector),
    Fallback(FeatureVector),
}

impl Extraction {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Extraction::Fallback(_))
    }

    pub fn vector(&self) -> &FeatureVector {
        match self {
            Extraction::Parsed(v) | Extraction::Fallback(v) => v,
        }
    }

    pub fn into_vector(self) -> FeatureVector {
        match self {
            Extraction::Parsed(v) | Extraction::Fallback(v) => v,
        }
    }
}

/// Extract the lexical feature vector for a URL. Total: never fails.
pub fn extract(url: &str) -> FeatureVector {
    extract_detailed(url).into_vector()
}

/// Extract features, reporting whether the safe-default path was taken
pub fn extract_detailed(url: &str) -> Extraction {
    let url_length = url.chars().count();

    let components = match split_url(url) {
        Ok(components) => components,
        Err(e) => {
            debug!("URL could not be split ({}), using fallback features", e);
            return Extraction::Fallback(fallback_vector(url_length));
        },
    };

    let num_directories = components
        .path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .count();

    let query = components.query.as_str();
    let num_parameters = if query.is_empty() {
        0
    } else {
        query.split('&').count()
    };

    let mut features = FeatureVector::new();
    features.insert("url_length", url_length);
    features.insert("num_directories", num_directories);
    features.insert("query_length", query.chars().count());
    features.insert("num_dots", count_char(url, '.'));
    features.insert("num_hyphens", count_char(url, '-'));
    features.insert("num_underscores", count_char(url, '_'));
    features.insert("num_slashes", count_char(url, '/'));
    features.insert("num_parameters", num_parameters);
    features.insert("has_ip", IPV4_PATTERN.is_match(url));
    features.insert("has_suspicious_words", has_suspicious_words(url));

    Extraction::Parsed(features)
}

/// Length-only vector used when the URL cannot be split
fn fallback_vector(url_length: usize) -> FeatureVector {
    let mut features = FeatureVector::new();
    for name in FEATURE_LAYOUT {
        features.insert(name, 0usize);
    }
    features.insert("url_length", url_length);
    features
}

fn count_char(url: &str, needle: char) -> usize {
    url.chars().filter(|c| *c == needle).count()
}

pub fn has_suspicious_words(url: &str) -> bool {
    let lowered = url.to_lowercase();
    SUSPICIOUS_WORDS.iter().any(|word| lowered.contains(word))
}

/// Lowercased authority of the URL, empty when there is none or it is malformed
pub fn request_domain(url: &str) -> String {
    split_url(url)
        .map(|c| c.netloc.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(vector: &FeatureVector, name: &str) -> i64 {
        match vector.get(name) {
            Some(FeatureValue::Int(v)) => v,
            other => panic!("expected int for {}, got {:?}", name, other),
        }
    }

    #[test]
    fn test_layout_count() {
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_key_set_matches_layout() {
        let urls = [
            "https://google.com",
            "http://phishing-example.com/login?user=a&next=b",
            "ftp://files.example.org/pub/",
            "not a url at all",
            "",
        ];

        for url in urls {
            let features = extract(url);
            let names: Vec<&str> = features.names().collect();
            assert_eq!(names, FEATURE_LAYOUT, "layout mismatch for {:?}", url);
        }
    }

    #[test]
    fn test_basic_counts() {
        let url = "https://sub.example-site.com/a/b_c/?x=1&y=2&z=3";
        let features = extract(url);

        assert_eq!(int(&features, "url_length"), url.chars().count() as i64);
        assert_eq!(int(&features, "num_directories"), 2);
        assert_eq!(int(&features, "query_length"), 11);
        assert_eq!(int(&features, "num_parameters"), 3);
        assert_eq!(int(&features, "num_dots"), 2);
        assert_eq!(int(&features, "num_hyphens"), 1);
        assert_eq!(int(&features, "num_underscores"), 1);
        assert_eq!(int(&features, "num_slashes"), 5);
        assert_eq!(int(&features, "has_ip"), 0);
        assert_eq!(int(&features, "has_suspicious_words"), 0);
    }

    #[test]
    fn test_empty_query_has_no_parameters() {
        let features = extract("https://example.com/path?");
        assert_eq!(int(&features, "query_length"), 0);
        assert_eq!(int(&features, "num_parameters"), 0);
    }

    #[test]
    fn test_ip_detection() {
        assert_eq!(int(&extract("https://192.168.1.1"), "has_ip"), 1);
        assert_eq!(int(&extract("http://10.0.0.254/admin"), "has_ip"), 1);
        assert_eq!(int(&extract("https://example.com/v1.2.3"), "has_ip"), 0);
        assert_eq!(int(&extract("http://999.999.999.999"), "has_ip"), 0);
    }

    #[test]
    fn test_suspicious_words() {
        let features = extract("https://bit.ly/verify-login");
        assert_eq!(int(&features, "has_suspicious_words"), 1);

        let features = extract("https://EXAMPLE.com/PayMent");
        assert_eq!(int(&features, "has_suspicious_words"), 1);

        let features = extract("https://example.com/about");
        assert_eq!(int(&features, "has_suspicious_words"), 0);
    }

    #[test]
    fn test_unicode_length_counts_characters() {
        let url = "https://exämple.com/パス";
        let features = extract(url);
        assert_eq!(int(&features, "url_length"), url.chars().count() as i64);
    }

    #[test]
    fn test_malformed_url_falls_back() {
        let url = "http://[::1/broken";
        let extraction = extract_detailed(url);
        assert!(extraction.is_fallback());

        let features = extraction.into_vector();
        assert_eq!(int(&features, "url_length"), url.chars().count() as i64);
        for name in FEATURE_LAYOUT.iter().filter(|n| **n != "url_length") {
            assert_eq!(int(&features, name), 0, "{} should be zero", name);
        }
    }

    #[test]
    fn test_invalid_bracketed_host_falls_back() {
        assert!(extract_detailed("https://[not-an-ip]/x").is_fallback());
        assert!(!extract_detailed("https://[::1]:8080/x").is_fallback());
        assert!(extract_detailed("https://[1.2.3.4]/x").is_fallback());
    }

    #[test]
    fn test_ipvfuture_host_is_accepted() {
        let components = split_url("http://[v1.fe]/a").unwrap();
        assert_eq!(components.netloc, "[v1.fe]");
        assert_eq!(components.path, "/a");

        assert!(split_url("http://[v1]/").is_err());
        assert!(split_url("http://[vzz.fe]/").is_err());
    }

    #[test]
    fn test_leading_controls_and_spaces_stripped() {
        let components = split_url("\u{0}\t  https://example.com/a").unwrap();
        assert_eq!(components.scheme, "https");
        assert_eq!(components.netloc, "example.com");
        assert_eq!(components.path, "/a");
    }

    #[test]
    fn test_empty_url() {
        let extraction = extract_detailed("");
        assert!(!extraction.is_fallback());
        for (_, value) in extraction.vector().iter() {
            assert_eq!(value, FeatureValue::Int(0));
        }
    }

    #[test]
    fn test_schemeless_url_is_path() {
        let components = split_url("google.com/mail").unwrap();
        assert_eq!(components.netloc, "");
        assert_eq!(components.path, "google.com/mail");
        assert_eq!(int(&extract("google.com/mail"), "num_directories"), 2);
    }

    #[test]
    fn test_split_params_from_last_segment() {
        let components = split_url("http://example.com/a;x/b;type=i?q=1#top").unwrap();
        assert_eq!(components.path, "/a;x/b");
        assert_eq!(components.params, "type=i");
        assert_eq!(components.query, "q=1");
        assert_eq!(components.fragment, "top");
    }

    #[test]
    fn test_request_domain() {
        assert_eq!(request_domain("https://Mail.Google.com/inbox"), "mail.google.com");
        assert_eq!(request_domain("https://example.com:8443/"), "example.com:8443");
        assert_eq!(request_domain("no-scheme.com"), "");
        assert_eq!(request_domain("http://[::1/"), "");
        assert_eq!(request_domain(" \x07https://Google.com/"), "google.com");
    }

    #[test]
    fn test_projection_uses_sentinel() {
        let features = extract("https://example.com");
        let schema = ["url_length", "page_rank", "has_ip"];
        let projected = features.project(&schema);

        assert_eq!(projected.len(), 3);
        assert_eq!(projected[0], 19.0);
        assert_eq!(projected[1], -1.0);
        assert_eq!(projected[2], 0.0);
    }

    #[test]
    fn test_conform_to_schema() {
        let features = extract("https://example.com");
        let conformed = features.conform_to(&["page_rank", "url_length"]);

        let names: Vec<&str> = conformed.names().collect();
        assert_eq!(names, vec!["page_rank", "url_length"]);
        assert_eq!(conformed.get("page_rank"), Some(FeatureValue::Int(-1)));
        assert_eq!(conformed.get("url_length"), Some(FeatureValue::Int(19)));
        assert_eq!(conformed.get("num_dots"), None);
    }

    #[test]
    fn test_vector_serializes_in_order() {
        let features = extract("https://example.com");
        let json = serde_json::to_string(&features).unwrap();
        let first = json.find("url_length").unwrap();
        let last = json.find("has_suspicious_words").unwrap();
        assert!(first < last);
        assert!(json.starts_with("{\"url_length\":19"));
    }
}
