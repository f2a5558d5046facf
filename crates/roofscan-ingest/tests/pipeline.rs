use chrono::NaiveDate;
use roofscan_core::{Error, Result, RoofscanConfig};
use roofscan_ingest::{
    DocumentInput, ExtractedText, InspectionType, OverallCondition, PlainTextExtractor,
    PropertyResolution, ReportPipeline, Severity, TextExtractor,
};
use roofscan_resolve::{MatchType, PropertyRecord, PropertyRegistry};

const STORM_REPORT: &str = "\
STORM DAMAGE INSPECTION REPORT
Property: Oak Ridge Plaza
Address: 845 Commerce Parkway, Plano, TX 75024
Client: Brazos Retail Holdings
Property Manager: Maria Lopez (972) 555-0142
Report Type: Storm Damage Inspection
Inspection Date: April 3, 2025
Inspected By: Summit Roof Consultants
Roof Area: 62,000 SF
Roof System: TPO
Manufacturer: GAF

EXECUTIVE SUMMARY
Hail damage was documented across the main roof following the March 28 storm.
The insurance adjuster attended the inspection. Claim number TX-22841.

DEFICIENCIES
- Active leak above suite 140 at the east section
- Hail damaged the TPO membrane across the main roof field
- Clogged drains at the north side causing ponding
- Minor debris accumulation at the loading dock canopy

RECOMMENDATIONS
- Replace damaged membrane sections within 30 days
";

fn record(id: &str, name: &str, address: &str) -> PropertyRecord {
    PropertyRecord {
        id: id.into(),
        name: name.into(),
        address: address.into(),
        city: "Plano".into(),
        state: "TX".into(),
    }
}

struct UnavailableRegistry;

impl PropertyRegistry for UnavailableRegistry {
    fn properties(&self) -> Result<Vec<PropertyRecord>> {
        Err(Error::RegistryUnavailable("connection refused".into()))
    }
}

struct ScannedPdf;

impl TextExtractor for ScannedPdf {
    fn extract(&self, _bytes: &[u8]) -> Result<ExtractedText> {
        Ok(ExtractedText {
            text: "  \n\x0C\n ".into(),
            page_count: 2,
        })
    }
}

#[test]
fn storm_report_end_to_end() {
    let pipeline = ReportPipeline::new(PlainTextExtractor);
    let report = pipeline.process(STORM_REPORT.as_bytes(), "oak_ridge.txt");

    assert_eq!(report.fields.property_name, "Oak Ridge Plaza");
    assert_eq!(report.fields.address, "845 Commerce Parkway, Plano, TX 75024");
    assert_eq!(report.fields.roof_area, 62_000);
    assert_eq!(report.fields.manufacturer, "GAF");
    assert_eq!(report.report_date_parsed, NaiveDate::from_ymd_opt(2025, 4, 3));
    assert_eq!(report.page_count, 1);

    assert_eq!(report.classification.primary_type, InspectionType::Storm);
    assert!(report.classification.confidence > 0.9);
    assert!(report
        .classification
        .indicators
        .contains(&"insurance adjuster".to_string()));

    assert_eq!(report.issues.len(), 5);
    assert_eq!(report.issues[0].issue_type, "Active Leak");
    assert_eq!(report.issues[0].severity, Severity::Critical);
    assert_eq!(report.issues[0].location, "east section");
    assert_eq!(report.issues[1].issue_type, "Hail Damage");
    assert_eq!(report.issues[1].severity, Severity::High);
    assert_eq!(report.issues[3].severity, Severity::Low);
    assert_eq!(
        report.issues[4].recommendation,
        "Replace damaged membrane sections within 30 days"
    );

    assert_eq!(report.estimated_repair_cost, 11_700.0);
    assert_eq!(report.overall_condition, OverallCondition::Critical);
    assert_eq!(report.priority_actions.len(), 3);
    assert_eq!(report.recommended_timeframe, "Within 30 days");
    assert!(report.source.text_available);
    assert_eq!(report.source.content_hash.len(), 64);
}

#[test]
fn exact_name_outranks_similar_entries() {
    let registry = vec![
        record("prop-7", "Oak Ridge Plaza Shopping Center", "9 Elm St"),
        record("prop-9", "Oak Ridge Plaza", "12 Elm St"),
    ];
    let pipeline = ReportPipeline::new(PlainTextExtractor);
    let doc = pipeline.process_and_resolve(STORM_REPORT.as_bytes(), "a.txt", &registry);

    let matched = doc.resolution.matched().expect("match");
    assert_eq!(matched.id, "prop-9");
    assert_eq!(matched.match_type, MatchType::Exact);
}

#[test]
fn address_resolves_renamed_property() {
    let registry = vec![record("a-1", "ORP Retail", "845 Commerce Parkway")];
    let pipeline = ReportPipeline::new(PlainTextExtractor);
    let doc = pipeline.process_and_resolve(STORM_REPORT.as_bytes(), "a.txt", &registry);

    let matched = doc.resolution.matched().expect("match");
    assert_eq!(matched.match_type, MatchType::Address);
    assert!((matched.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn empty_registry_needs_manual_match() {
    let pipeline = ReportPipeline::new(PlainTextExtractor);
    let doc = pipeline.process_and_resolve(STORM_REPORT.as_bytes(), "a.txt", &[]);
    assert_eq!(
        doc.resolution,
        PropertyResolution::NeedsManualMatch { candidates: vec![] }
    );
}

#[test]
fn empty_input_yields_blank_report() {
    let pipeline = ReportPipeline::new(PlainTextExtractor);
    let report = pipeline.process(b"", "");

    assert_eq!(report.fields.property_name, "");
    assert_eq!(report.fields.roof_area, 0);
    assert!(report.issues.is_empty());
    assert_eq!(report.classification.primary_type, InspectionType::Unknown);
    assert_eq!(report.classification.confidence, 0.0);
}

#[test]
fn whitespace_only_text_uses_filename() {
    let pipeline = ReportPipeline::new(ScannedPdf);
    let report = pipeline.process(b"%PDF", "Dallas_Corporate_Center_STORM_DAMAGE_Report.pdf");
    assert_eq!(report.fields.property_name, "Dallas Corporate Center");
    assert_eq!(report.page_count, 0);
    assert!(!report.source.text_available);
}

#[test]
fn configured_issue_cap_applies() {
    let mut config = RoofscanConfig::default();
    config.extraction.max_issues = 2;
    let pipeline = ReportPipeline::with_config(PlainTextExtractor, config);
    let report = pipeline.process(STORM_REPORT.as_bytes(), "a.txt");
    assert_eq!(report.issues.len(), 2);
    assert_eq!(report.issues[0].issue_type, "Active Leak");
}

#[test]
fn batch_from_directory_keeps_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let files = [
        ("Oak_Ridge_Plaza_Storm_Report.txt", STORM_REPORT.to_string()),
        ("Westgate_Mall_Annual_Inspection.txt", String::new()),
        (
            "Pecan_Point.txt",
            "Property: Pecan Point Office Park\nANNUAL INSPECTION REPORT\n".to_string(),
        ),
    ];
    for (name, content) in &files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    let documents: Vec<DocumentInput> = files
        .iter()
        .map(|(name, _)| {
            let bytes = std::fs::read(dir.path().join(name)).unwrap();
            DocumentInput::new(*name, bytes)
        })
        .collect();

    let registry = vec![
        record("p-1", "Oak Ridge Plaza", "845 Commerce Parkway"),
        record("p-2", "Westgate Mall", "3300 Westgate Blvd"),
    ];

    let mut config = RoofscanConfig::default();
    config.workers = 2;
    let pipeline = ReportPipeline::with_config(PlainTextExtractor, config);
    let results = pipeline.process_batch(&documents, &registry);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].report.fields.property_name, "Oak Ridge Plaza");
    assert_eq!(results[0].resolution.matched().map(|m| m.id.as_str()), Some("p-1"));
    assert_eq!(results[1].report.fields.property_name, "Westgate Mall");
    assert_eq!(results[1].resolution.matched().map(|m| m.id.as_str()), Some("p-2"));
    assert_eq!(results[2].report.fields.property_name, "Pecan Point Office Park");
    assert!(results[2].resolution.matched().is_none());
}

#[test]
fn unavailable_registry_is_treated_as_empty() {
    let pipeline = ReportPipeline::new(PlainTextExtractor);
    let documents = vec![DocumentInput::new("a.txt", STORM_REPORT)];
    let results = pipeline.process_batch(&documents, &UnavailableRegistry);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].report.fields.property_name, "Oak Ridge Plaza");
    assert!(results[0].resolution.matched().is_none());
}
