//! Report pipeline: bytes → text → extracted report → property resolution.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::extract::{self, ExtractedReport, SourceInfo};
use crate::file::TextExtractor;
use roofscan_core::RoofscanConfig;
use roofscan_resolve::registry::snapshot;
use roofscan_resolve::{PropertyMatch, PropertyRecord, PropertyRegistry, PropertyResolver};

/// One document handed to the pipeline.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Outcome of matching a report against the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PropertyResolution {
    Matched { property: PropertyMatch },
    /// No entry cleared its tier; a person should pick from the shortlist.
    NeedsManualMatch { candidates: Vec<PropertyMatch> },
}

impl PropertyResolution {
    pub fn matched(&self) -> Option<&PropertyMatch> {
        match self {
            Self::Matched { property } => Some(property),
            Self::NeedsManualMatch { .. } => None,
        }
    }
}

/// A processed document: the report plus its resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub report: ExtractedReport,
    pub resolution: PropertyResolution,
}

/// Runs extraction and resolution for documents. Holds no per-document state.
pub struct ReportPipeline<E> {
    extractor: E,
    config: RoofscanConfig,
    resolver: PropertyResolver,
}

impl<E: TextExtractor> ReportPipeline<E> {
    pub fn new(extractor: E) -> Self {
        Self::with_config(extractor, RoofscanConfig::default())
    }

    pub fn with_config(extractor: E, config: RoofscanConfig) -> Self {
        let resolver = PropertyResolver::new(config.resolver.clone());
        Self {
            extractor,
            config,
            resolver,
        }
    }

    /// Extract a report from document bytes. Never fails: without usable
    /// text the report carries only a filename-derived property name.
    pub fn process(&self, bytes: &[u8], filename: &str) -> ExtractedReport {
        let extracted = match self.extractor.extract(bytes) {
            Ok(e) if !e.text.trim().is_empty() => e,
            Ok(_) => {
                warn!("No text extracted from {}, using filename", filename);
                return ExtractedReport::from_filename(filename);
            }
            Err(e) => {
                warn!("Text extraction failed for {}: {}", filename, e);
                return ExtractedReport::from_filename(filename);
            }
        };

        let mut report = self.process_text(&extracted.text, filename);
        report.page_count = extracted.page_count;
        report
    }

    /// Extract a report from already-recovered text.
    pub fn process_text(&self, text: &str, filename: &str) -> ExtractedReport {
        if text.trim().is_empty() {
            return ExtractedReport::from_filename(filename);
        }

        let mut report = extract::extract_report(text, &self.config);
        if report.fields.property_name.is_empty() {
            report.fields.property_name = crate::file::property_name_from_filename(filename);
        }
        report.source = SourceInfo {
            filename: filename.to_string(),
            content_hash: content_hash(text),
            text_available: true,
        };

        debug!(
            "Extracted {}: {} issues, {} ({:.2})",
            filename,
            report.issues.len(),
            report.classification.primary_type,
            report.classification.confidence
        );
        report
    }

    /// Match a report's name and address against a registry snapshot.
    pub fn resolve(&self, report: &ExtractedReport, registry: &[PropertyRecord]) -> PropertyResolution {
        let name = &report.fields.property_name;
        let address = Some(report.fields.address.as_str()).filter(|a| !a.trim().is_empty());

        match self.resolver.find_best_match(name, address, registry) {
            Some(property) => PropertyResolution::Matched { property },
            None => PropertyResolution::NeedsManualMatch {
                candidates: self.resolver.potential_matches(
                    name,
                    address,
                    registry,
                    self.config.resolver.shortlist_limit,
                ),
            },
        }
    }

    pub fn process_and_resolve(
        &self,
        bytes: &[u8],
        filename: &str,
        registry: &[PropertyRecord],
    ) -> ProcessedDocument {
        let report = self.process(bytes, filename);
        let resolution = self.resolve(&report, registry);
        ProcessedDocument { report, resolution }
    }

    /// Process documents in parallel. The registry is read once and shared;
    /// results come back in input order.
    pub fn process_batch<R: PropertyRegistry + ?Sized>(
        &self,
        documents: &[DocumentInput],
        registry: &R,
    ) -> Vec<ProcessedDocument> {
        let registry = snapshot(registry);
        let run = |doc: &DocumentInput| self.process_and_resolve(&doc.bytes, &doc.filename, &registry);

        let results: Vec<ProcessedDocument> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
        {
            Ok(pool) => pool.install(|| documents.par_iter().map(run).collect()),
            Err(e) => {
                warn!("Worker pool unavailable ({}), processing sequentially", e);
                documents.iter().map(run).collect()
            }
        };

        let matched = results.iter().filter(|d| d.resolution.matched().is_some()).count();
        info!(
            "Processed {} documents ({} matched, {} need review)",
            results.len(),
            matched,
            results.len() - matched
        );
        results
    }
}

/// Compute SHA-256 content hash.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
