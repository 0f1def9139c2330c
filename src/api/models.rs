//! Wire models for the platform API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Access/refresh token pair. Replaced wholesale on every successful
/// authentication or refresh; the two fields never mix across exchanges.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// A file as the server sees it. Created on upload, validated
/// asynchronously; the client only ever reads it.
#[derive(Debug, Clone, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub check_completed: bool,
    #[serde(default)]
    pub acceptable: bool,
    #[serde(default)]
    pub amount_of_samples: u64,
}

impl FileRecord {
    /// Ready for order submission: server-side check finished, file was
    /// accepted, and it actually contains samples.
    pub fn is_validated(&self) -> bool {
        self.check_completed && self.acceptable && self.amount_of_samples > 0
    }

    pub fn validation_state(&self) -> String {
        format!(
            "check_completed={}, acceptable={}, amount_of_samples={}",
            self.check_completed, self.acceptable, self.amount_of_samples
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Submitted,
    Running,
    Completed,
    Failed,
    Canceled,
    #[serde(rename = "Model completed")]
    ModelCompleted,
    #[serde(rename = "Making report")]
    MakingReport,
    #[serde(rename = "Collecting report results")]
    CollectingReportResults,
    #[serde(rename = "Reports failed")]
    ReportsFailed,
}

impl OrderStatus {
    /// Terminal states whose results are (at least partially) downloadable.
    /// "Reports failed" means the model ran but report generation did not;
    /// the remaining result types stay retrievable.
    pub fn is_terminal_success(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::ReportsFailed)
    }

    pub fn is_terminal_failure(self) -> bool {
        matches!(self, OrderStatus::Failed | OrderStatus::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Submitted => "Submitted",
            OrderStatus::Running => "Running",
            OrderStatus::Completed => "Completed",
            OrderStatus::Failed => "Failed",
            OrderStatus::Canceled => "Canceled",
            OrderStatus::ModelCompleted => "Model completed",
            OrderStatus::MakingReport => "Making report",
            OrderStatus::CollectingReportResults => "Collecting report results",
            OrderStatus::ReportsFailed => "Reports failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    pub id: Uuid,
    pub status: OrderStatus,
    #[serde(default)]
    pub result_types: Vec<ResultTypeEntry>,
}

/// The server declares downloadable result types either as plain strings
/// or as `{type, label}` objects, depending on the endpoint version.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResultTypeEntry {
    Plain(String),
    Labeled {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        label: Option<String>,
    },
    /// Anything else the server might send; skipped during normalization.
    Other(serde_json::Value),
}

impl ResultTypeEntry {
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ResultTypeEntry::Plain(name) => Some(name),
            ResultTypeEntry::Labeled { kind, .. } => Some(kind),
            ResultTypeEntry::Other(_) => None,
        }
    }
}

/// Flatten declared result types to plain type names, dropping entries of
/// neither known shape with a warning.
pub fn normalize_result_types(entries: &[ResultTypeEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| match entry.type_name() {
            Some(name) => Some(name.to_string()),
            None => {
                warn!(?entry, "skipping result type entry of unknown shape");
                None
            }
        })
        .collect()
}

/// Pagination envelope used by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_status_wire_names_round_trip() {
        for (wire, status) in [
            ("Submitted", OrderStatus::Submitted),
            ("Model completed", OrderStatus::ModelCompleted),
            ("Collecting report results", OrderStatus::CollectingReportResults),
            ("Reports failed", OrderStatus::ReportsFailed),
        ] {
            let parsed: OrderStatus =
                serde_json::from_value(json!(wire)).expect("status should parse");
            assert_eq!(parsed, status);
            assert_eq!(status.as_str(), wire);
        }
    }

    #[test]
    fn test_terminal_sets() {
        assert!(OrderStatus::Completed.is_terminal_success());
        assert!(OrderStatus::ReportsFailed.is_terminal_success());
        assert!(OrderStatus::Failed.is_terminal_failure());
        assert!(OrderStatus::Canceled.is_terminal_failure());

        for status in [
            OrderStatus::Submitted,
            OrderStatus::Running,
            OrderStatus::ModelCompleted,
            OrderStatus::MakingReport,
            OrderStatus::CollectingReportResults,
        ] {
            assert!(!status.is_terminal_success());
            assert!(!status.is_terminal_failure());
        }
    }

    #[test]
    fn test_result_types_normalize_both_shapes() {
        let entries: Vec<ResultTypeEntry> = serde_json::from_value(json!([
            {"type": "SUMMARY_CHROMS", "label": "Summary per chromosome"},
            "RAW_VCF"
        ]))
        .expect("entries should parse");

        assert_eq!(
            normalize_result_types(&entries),
            vec!["SUMMARY_CHROMS".to_string(), "RAW_VCF".to_string()]
        );
    }

    #[test]
    fn test_result_types_skip_unknown_shapes() {
        let entries: Vec<ResultTypeEntry> = serde_json::from_value(json!([
            "ANCESTRY_SUMMARY",
            {"label": "missing type key"},
            42,
            {"type": "RAW_VCF"}
        ]))
        .expect("entries should parse");

        assert_eq!(
            normalize_result_types(&entries),
            vec!["ANCESTRY_SUMMARY".to_string(), "RAW_VCF".to_string()]
        );
    }

    #[test]
    fn test_file_record_validation_predicate() {
        let mut record: FileRecord = serde_json::from_value(json!({
            "id": "8f2a43fe-3c65-4a78-9f9a-0d6c4f4f5a11",
            "name": "cohort.vcf",
            "created_at": "2026-03-02T10:15:00Z",
            "check_completed": true,
            "acceptable": true,
            "amount_of_samples": 12
        }))
        .expect("record should parse");
        assert!(record.is_validated());

        record.amount_of_samples = 0;
        assert!(!record.is_validated());
    }

    #[test]
    fn test_page_tolerates_missing_fields() {
        let page: Page<FileRecord> =
            serde_json::from_value(json!({})).expect("empty page should parse");
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
    }
}
