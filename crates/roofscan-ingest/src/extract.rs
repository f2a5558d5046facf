//! Heuristic report extraction.
//!
//! Fields, issues and classification all read the same text independently.
//! Nothing here fails: a miss is an empty string, a zero or an empty list.

pub mod classify;
pub mod fields;
pub mod issues;
pub mod sections;
pub mod summary;

use chrono::NaiveDate;
use roofscan_core::RoofscanConfig;
use serde::{Deserialize, Serialize};

pub use classify::{Classification, InspectionType};
pub use fields::ReportFields;
pub use issues::{Issue, Severity};
pub use summary::OverallCondition;

/// Where a report came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub filename: String,
    /// SHA-256 of the extracted text, hex encoded. Empty without text.
    pub content_hash: String,
    pub text_available: bool,
}

/// Structured record for one inspection report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedReport {
    #[serde(flatten)]
    pub fields: ReportFields,
    pub report_date_parsed: Option<NaiveDate>,
    pub page_count: u32,
    pub classification: Classification,
    pub issues: Vec<Issue>,
    pub overall_condition: OverallCondition,
    pub priority_actions: Vec<String>,
    pub estimated_repair_cost: f64,
    pub recommended_timeframe: String,
    pub source: SourceInfo,
}

impl ExtractedReport {
    /// Minimal report for a document without usable text.
    pub fn from_filename(filename: &str) -> Self {
        Self {
            fields: ReportFields {
                property_name: crate::file::property_name_from_filename(filename),
                ..Default::default()
            },
            source: SourceInfo {
                filename: filename.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Run every extractor over `text`.
pub fn extract_report(text: &str, config: &RoofscanConfig) -> ExtractedReport {
    let fields = fields::extract_fields(text);
    let issues = issues::extract_issues(text, &config.extraction, &config.costs);
    let classification = classify::classify(
        text,
        &fields.report_type,
        &config.classifier,
        config.extraction.max_indicators,
    );

    ExtractedReport {
        report_date_parsed: fields::parse_report_date(&fields.report_date),
        overall_condition: summary::overall_condition(text, &issues),
        priority_actions: summary::priority_actions(&issues, config.extraction.max_priority_actions),
        estimated_repair_cost: summary::estimated_repair_cost(&issues),
        recommended_timeframe: summary::recommended_timeframe(text, &issues),
        fields,
        classification,
        issues,
        page_count: 0,
        source: SourceInfo::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_blank_report() {
        let report = extract_report("", &RoofscanConfig::default());
        assert_eq!(report.fields, ReportFields::default());
        assert!(report.issues.is_empty());
        assert_eq!(report.classification.primary_type, InspectionType::Unknown);
        assert_eq!(report.classification.confidence, 0.0);
        assert_eq!(report.overall_condition, OverallCondition::Good);
        assert_eq!(report.recommended_timeframe, "");
        assert_eq!(report.estimated_repair_cost, 0.0);
    }

    #[test]
    fn test_from_filename() {
        let report = ExtractedReport::from_filename("Westgate_Mall_Annual_Inspection.pdf");
        assert_eq!(report.fields.property_name, "Westgate Mall");
        assert_eq!(report.source.filename, "Westgate_Mall_Annual_Inspection.pdf");
        assert!(!report.source.text_available);
        assert_eq!(report.classification.primary_type, InspectionType::Unknown);
    }

    #[test]
    fn test_serializes_flat_camel_case() {
        let report = ExtractedReport::from_filename("Oak_Ridge_Plaza.pdf");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["propertyName"], "Oak Ridge Plaza");
        assert_eq!(json["roofArea"], 0);
        assert_eq!(json["classification"]["primaryType"], "unknown");
        assert_eq!(json["overallCondition"], "good");
        assert!(json["reportDateParsed"].is_null());
    }
}
