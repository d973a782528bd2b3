pub mod classification;

// Re-export common types
pub use classification::*;
