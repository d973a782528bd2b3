// Trusted domain allow-set
// Exact and subdomain matching against curated root domains, loaded once at startup

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

// =============================================================================
// BUILT-IN LIST
// =============================================================================

pub const BUILTIN_VERSION: &str = "builtin-1";

/// Curated fallback list, used when the JSON source is unavailable
const BUILTIN_TRUSTED_DOMAINS: &[&str] = &[
    // Google services
    "google.com", "gmail.com", "youtube.com", "google.co.in", "google.co.uk",
    "googleapis.com", "googleusercontent.com", "gstatic.com", "googlesource.com",
    "google-analytics.com", "googleadservices.com", "googlevideo.com",
    "googletagmanager.com", "googledomains.com", "blogger.com", "blogspot.com",
    "aistudio.google.com", "console.cloud.google.com", "firebase.google.com",
    // Microsoft services
    "microsoft.com", "office.com", "outlook.com", "live.com", "hotmail.com",
    "azure.com", "windows.com", "xbox.com", "onedrive.com", "microsoftonline.com",
    "office365.com", "visualstudio.com", "github.com", "linkedin.com",
    // Apple
    "apple.com", "icloud.com", "itunes.com", "appstore.com", "me.com",
    // Amazon
    "amazon.com", "aws.amazon.com", "amazonaws.com", "amazon.co.uk", "amazon.in",
    "amazon.de", "amazon.fr", "amazon.ca", "cloudfront.net",
    // Social media
    "facebook.com", "instagram.com", "twitter.com", "x.com", "tiktok.com",
    "snapchat.com", "reddit.com", "pinterest.com", "whatsapp.com",
    // Development platforms
    "stackoverflow.com", "stackexchange.com", "npmjs.com", "pypi.org",
    "gitlab.com", "bitbucket.org", "sourceforge.net", "codepen.io",
    // Cloud & hosting
    "cloudflare.com", "netlify.com", "vercel.com", "heroku.com",
    "digitalocean.com", "linode.com", "render.com",
    // Payments
    "paypal.com", "stripe.com", "square.com", "venmo.com",
    // Education
    "coursera.org", "udemy.com", "edx.org", "khanacademy.org",
    "mit.edu", "stanford.edu", "harvard.edu", "berkeley.edu",
    // E-commerce
    "ebay.com", "etsy.com", "shopify.com", "walmart.com", "bestbuy.com",
    // Media & entertainment
    "netflix.com", "spotify.com", "hulu.com", "disney.com", "twitch.tv",
    // Other popular services
    "dropbox.com", "zoom.us", "slack.com", "discord.com", "telegram.org",
    "wikipedia.org", "wikimedia.org", "mozilla.org", "w3.org",
];

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug)]
pub enum TrustedDomainError {
    #[error("Failed to read trusted domains file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse trusted domains file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Trusted domains file {0} contains no domains")]
    Empty(String),
}

/// On-disk shape of the trusted domain source
#[derive(Debug, Deserialize)]
struct TrustedDomainsFile {
    version: String,
    domains: Vec<String>,
}

// =============================================================================
// TRUSTED DOMAIN SET
// =============================================================================

/// Immutable allow-set of root domains
#[derive(Debug, Clone)]
pub struct TrustedDomainSet {
    domains: HashSet<String>,
    version: String,
}

impl Default for TrustedDomainSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TrustedDomainSet {
    /// Build a set from arbitrary entries; entries are trimmed and lowercased
    pub fn from_domains<I, S>(version: impl Into<String>, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Self {
            domains,
            version: version.into(),
        }
    }

    /// The curated list compiled into the binary
    pub fn builtin() -> Self {
        Self::from_domains(BUILTIN_VERSION, BUILTIN_TRUSTED_DOMAINS.iter())
    }

    /// Load a versioned JSON source: `{ "version": "...", "domains": [...] }`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrustedDomainError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let content = std::fs::read_to_string(path).map_err(|source| TrustedDomainError::Io {
            path: display.clone(),
            source,
        })?;

        let file: TrustedDomainsFile =
            serde_json::from_str(&content).map_err(|source| TrustedDomainError::Parse {
                path: display.clone(),
                source,
            })?;

        let set = Self::from_domains(file.version, file.domains);
        if set.is_empty() {
            return Err(TrustedDomainError::Empty(display));
        }

        Ok(set)
    }

    /// Load from JSON, falling back to the built-in list on any failure
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(set) => {
                info!(
                    "Loaded {} trusted domains (version {})",
                    set.len(),
                    set.version
                );
                set
            },
            Err(e) => {
                warn!("{}. Using built-in trusted domain list", e);
                Self::builtin()
            },
        }
    }

    /// True when the domain or any parent suffix of it is in the set.
    /// `mail.google.com` matches an entry for `google.com`.
    pub fn is_trusted(&self, domain: &str) -> bool {
        self.matched_root(domain).is_some()
    }

    /// The set entry that made the domain trusted, if any
    pub fn matched_root(&self, domain: &str) -> Option<&str> {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return None;
        }

        let mut candidate = domain.as_str();
        loop {
            if let Some(entry) = self.domains.get(candidate) {
                return Some(entry.as_str());
            }
            match candidate.find('.') {
                Some(dot) => candidate = &candidate[dot + 1..],
                None => return None,
            }
        }
    }

    /// Trust score in [0, 1]: 1.0 for trusted domains, 0.0 for everything else
    pub fn trust_score(&self, domain: &str) -> f64 {
        if self.is_trusted(domain) {
            1.0
        } else {
            0.0
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
