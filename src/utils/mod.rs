// Utility modules for PhishShield

pub mod classification_errors;
pub mod scan_audit;

pub use classification_errors::{
    ClassificationError, ClassificationErrorResponse, ClassificationOutcome,
};
pub use scan_audit::{ScanAction, ScanAuditLog, ScanAuditor};
