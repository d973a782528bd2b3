// Configuration modules for PhishShield

pub mod policy;

pub use policy::{
    PolicyConfig, DEFAULT_MAX_BATCH_ITEMS, DEFAULT_PHISHING_THRESHOLD,
    DEFAULT_TRUSTED_DOMAIN_CONFIDENCE,
};
