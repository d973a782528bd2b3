// Scan audit trail
// One JSON line per completed scan under the "audit" tracing target
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{BatchReport, ClassificationResult};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum ScanAction {
    UrlScanned,
    TrustedDomainMatched,
    ScanFailed,
    BatchScanned,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScanAuditLog {
    pub id: Uuid,
    pub action: ScanAction,
    pub url: Option<String>,
    pub is_phishing: Option<bool>,
    pub confidence: Option<f64>,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ScanAuditLog {
    fn new(action: ScanAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            url: None,
            is_phishing: None,
            confidence: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn for_result(url: &str, result: &ClassificationResult) -> Self {
        let action = if result.is_trusted_short_circuit() {
            ScanAction::TrustedDomainMatched
        } else {
            ScanAction::UrlScanned
        };

        Self {
            url: Some(url.to_string()),
            is_phishing: Some(result.is_phishing),
            confidence: Some(result.confidence),
            details: result.reason.clone(),
            ..Self::new(action)
        }
    }

    pub fn for_failure(url: &str, error: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            details: Some(error.to_string()),
            ..Self::new(ScanAction::ScanFailed)
        }
    }

    pub fn for_batch(report: &BatchReport) -> Self {
        Self {
            details: Some(format!(
                "total={} successful={} failed={}",
                report.total,
                report.successful,
                report.failed()
            )),
            ..Self::new(ScanAction::BatchScanned)
        }
    }
}

pub struct ScanAuditor;

impl ScanAuditor {
    pub fn log_result(url: &str, result: &ClassificationResult) {
        Self::emit(&ScanAuditLog::for_result(url, result));
    }

    pub fn log_failure(url: &str, error: &str) {
        Self::emit(&ScanAuditLog::for_failure(url, error));
    }

    pub fn log_batch(report: &BatchReport) {
        Self::emit(&ScanAuditLog::for_batch(report));
    }

    fn emit(entry: &ScanAuditLog) {
        let json_log = serde_json::to_string(entry).unwrap_or_else(|e| {
            warn!("Failed to serialize scan audit log: {}", e);
            format!("{:?}", entry)
        });

        info!(target: "audit", "{}", json_log);
    }
}
