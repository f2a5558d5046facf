//! Text extraction from report files, and the filename fallback used when
//! no text can be recovered.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use roofscan_core::text::collapse_whitespace;
use roofscan_core::{Error, Result};

/// Text recovered from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: u32,
}

/// Turns document bytes into text. Called once per document.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText>;
}

impl<T: TextExtractor + ?Sized> TextExtractor for Box<T> {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        (**self).extract(bytes)
    }
}

/// UTF-8 text files. Pages are separated by form feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::ExtractionUnavailable(format!("invalid UTF-8: {}", e)))?;
        let page_count = if text.trim().is_empty() {
            0
        } else {
            text.matches('\x0C').count() as u32 + 1
        };
        Ok(ExtractedText {
            text: text.to_string(),
            page_count,
        })
    }
}

/// PDF text layer via `pdf-extract`. Scanned PDFs without a text layer
/// come back empty.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        if !bytes.starts_with(b"%PDF") {
            return Err(Error::ExtractionUnavailable("not a PDF document".into()));
        }

        // pdf-extract panics on some malformed inputs, so every call into it
        // stays inside the guard.
        let (text, pages) = std::panic::catch_unwind(|| {
            let text = pdf_extract::extract_text_from_mem(bytes)?;
            let pages = pdf_extract::Document::load_mem(bytes)
                .ok()
                .map(|doc| doc.get_pages().len() as u32);
            Ok::<_, pdf_extract::OutputError>((text, pages))
        })
        .map_err(|_| Error::ExtractionUnavailable("PDF parser panicked".into()))?
        .map_err(|e| Error::ExtractionUnavailable(e.to_string()))?;

        let page_count = pages.unwrap_or_else(|| text.matches('\x0C').count() as u32 + 1);
        Ok(ExtractedText { text, page_count })
    }
}

/// Supported report file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    PlainText,
    Pdf,
    Unknown,
}

impl FileType {
    /// Detect file type from extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" | "md" => Self::PlainText,
            "pdf" => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }
}

/// Extractor for a file type. PDFs need the `pdf` feature; everything else
/// is read as plain text.
pub fn extractor_for(file_type: FileType) -> Box<dyn TextExtractor> {
    match file_type {
        #[cfg(feature = "pdf")]
        FileType::Pdf => Box::new(PdfTextExtractor),
        _ => Box::new(PlainTextExtractor),
    }
}

/// Chooses by content: `%PDF` bytes go to the PDF extractor, the rest are
/// read as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoExtractor;

impl TextExtractor for AutoExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        if bytes.starts_with(b"%PDF") {
            extractor_for(FileType::Pdf).extract(bytes)
        } else {
            PlainTextExtractor.extract(bytes)
        }
    }
}

static REPORT_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:[_\-\s]+(?:storm[_\-\s]*damage|hail[_\-\s]*damage|annual|due[_\-\s]*diligence|roof|survey|inspection|assessment|condition|final|draft|report))+$",
    )
    .expect("report suffix pattern")
});

/// Property name recovered from a report filename.
///
/// `"Dallas_Corporate_Center_STORM_DAMAGE_Report.pdf"` → `"Dallas Corporate Center"`.
pub fn property_name_from_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };

    let stripped = REPORT_SUFFIX_RE.replace(stem, "");
    // A name that is nothing but report words is kept as-is.
    let base = if stripped.trim_matches(|c: char| c == '_' || c == '-' || c.is_whitespace()).is_empty() {
        stem
    } else {
        &*stripped
    };

    collapse_whitespace(&base.replace(['_', '-'], " "))
}
