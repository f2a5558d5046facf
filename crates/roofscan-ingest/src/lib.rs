//! Roofscan Ingest: report text extraction, issue detection, classification
//! and the document pipeline.

pub mod extract;
pub mod file;
pub mod ingest;

pub use extract::{
    extract_report, Classification, ExtractedReport, InspectionType, Issue, OverallCondition,
    ReportFields, Severity, SourceInfo,
};
#[cfg(feature = "pdf")]
pub use file::PdfTextExtractor;
pub use file::{
    extractor_for, AutoExtractor, ExtractedText, FileType, PlainTextExtractor, TextExtractor,
};
pub use ingest::{DocumentInput, ProcessedDocument, PropertyResolution, ReportPipeline};
