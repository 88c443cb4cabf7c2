//! API DTOs (Data Transfer Objects)
//!
//! Client installations expect PascalCase members and a `Result` marker.

use crate::domain::entities::{ReportEntry, UsageTotals};
use serde::{Deserialize, Serialize};

const RESULT_OK: &str = "OK";

/// Generic success body
#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    #[serde(rename = "Result")]
    pub result: &'static str,
}

impl Default for OkResponse {
    fn default() -> Self {
        Self { result: RESULT_OK }
    }
}

/// Response for GET /get
#[derive(Debug, Clone, Serialize)]
pub struct FoundNamesResponse {
    #[serde(rename = "Result")]
    pub result: &'static str,
    #[serde(rename = "FoundNames")]
    pub found_names: Vec<String>,
}

impl FoundNamesResponse {
    pub fn new(found_names: Vec<String>) -> Self {
        Self {
            result: RESULT_OK,
            found_names,
        }
    }
}

/// Request body for POST /add
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "ServerBarcodes")]
    pub server_barcodes: Option<Vec<SubmittedBarcode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedBarcode {
    #[serde(rename = "Barcode", default)]
    pub barcode: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// Response for GET /admin/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub totals: UsageTotals,
    pub pending_reports: usize,
    /// Addresses locked out of the moderator login
    pub blocked_addresses: usize,
}

/// Response for GET /admin/reports
#[derive(Debug, Clone, Serialize)]
pub struct ReportsResponse {
    pub reports: Vec<ReportEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_names_shape() {
        let body = serde_json::to_value(FoundNamesResponse::new(vec!["Milch".into()])).unwrap();
        assert_eq!(body, serde_json::json!({"Result": "OK", "FoundNames": ["Milch"]}));
    }

    #[test]
    fn test_submit_request_without_list() {
        let req: SubmitRequest = serde_json::from_str("{}").unwrap();
        assert!(req.server_barcodes.is_none());

        let req: SubmitRequest = serde_json::from_str(
            r#"{"ServerBarcodes":[{"Barcode":"4311501490100","Name":"Butter"}]}"#,
        )
        .unwrap();
        let list = req.server_barcodes.unwrap();
        assert_eq!(list[0].barcode, "4311501490100");
        assert_eq!(list[0].name, "Butter");
    }
}
