//! Multi-format text extraction with a fallback ladder

use crate::clean::clean_text;
use crate::error::ExtractError;
use crate::{hwpx, markup, pdf};
use std::path::Path;
use tracing::{debug, info, warn};

/// Upload formats the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Portable Document Format
    Pdf,
    /// HWPX (OPC container of section XML)
    Hwpx,
    /// HTML page
    Html,
    /// Plain text
    Txt,
}

impl FileFormat {
    /// Detect the format from a file extension; anything unknown falls
    /// back to plain-text decoding.
    pub fn from_extension(path: &Path) -> FileFormat {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => FileFormat::Pdf,
            Some("hwpx") => FileFormat::Hwpx,
            Some("html") | Some("htm") => FileFormat::Html,
            _ => FileFormat::Txt,
        }
    }

    /// Name used in logs and failure reports
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Hwpx => "hwpx",
            FileFormat::Html => "html",
            FileFormat::Txt => "txt",
        }
    }
}

/// Which rung of the ladder produced the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// PDF text layer (primary reader)
    PdfNative,
    /// PDF per-page extraction (alternative reader)
    PdfAlternate,
    /// PDF content-stream literal scan (last native rung)
    PdfLiteral,
    /// Raster + recognition through the configured OCR engine
    Ocr,
    /// HWPX section XML
    Hwpx,
    /// HTML tag stripping
    Html,
    /// Decoded text bytes
    PlainText,
}

/// Recovered text plus how it was recovered
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Cleaned text, non-empty
    pub text: String,
    /// Rung that produced it
    pub method: ExtractionMethod,
    /// Failure notes from the rungs that were tried first
    pub notes: Vec<String>,
}

/// Pluggable OCR for scanned PDFs. No engine ships with this crate;
/// callers inject one (or none, in which case scanned PDFs fail with a
/// full failure report).
pub trait OcrEngine: Send + Sync {
    /// Rasterize the PDF and recognize Korean + English text
    fn recognize_pdf(&self, pdf_bytes: &[u8]) -> Result<String, String>;
}

/// Multi-format text extractor
pub struct TextExtractor {
    ocr: Option<Box<dyn OcrEngine>>,
}

impl TextExtractor {
    /// Create an extractor without OCR
    pub fn new() -> Self {
        Self { ocr: None }
    }

    /// Attach an OCR engine as the PDF ladder's last rung
    pub fn with_ocr(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Extract text from a file. The format is taken from `format_hint`
    /// when given, otherwise detected from the extension.
    pub fn extract(
        &self,
        path: &Path,
        format_hint: Option<FileFormat>,
    ) -> Result<Extraction, ExtractError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let format = format_hint.unwrap_or_else(|| FileFormat::from_extension(path));
        self.extract_bytes(&bytes, format)
    }

    /// Extract text from in-memory bytes of a known format
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        format: FileFormat,
    ) -> Result<Extraction, ExtractError> {
        info!(format = format.as_str(), size = bytes.len(), "Starting text extraction");

        let mut tried: Vec<String> = Vec::new();
        let rungs = self.ladder_for(format);

        for (name, method, run) in rungs {
            match run(self, bytes) {
                Ok(raw) => {
                    let cleaned = clean_text(&raw);
                    if cleaned.trim().is_empty() {
                        debug!(method = name, "Rung produced empty text");
                        tried.push(format!("{}: empty text", name));
                        continue;
                    }
                    info!(
                        method = name,
                        chars = cleaned.chars().count(),
                        "Text extraction complete"
                    );
                    return Ok(Extraction {
                        text: cleaned,
                        method,
                        notes: tried,
                    });
                }
                Err(reason) => {
                    debug!(method = name, reason = %reason, "Rung failed");
                    tried.push(format!("{}: {}", name, reason));
                }
            }
        }

        warn!(format = format.as_str(), attempts = tried.len(), "All extraction methods failed");
        Err(ExtractError::Empty { tried })
    }

    /// The ordered rungs for a format
    #[allow(clippy::type_complexity)]
    fn ladder_for(
        &self,
        format: FileFormat,
    ) -> Vec<(
        &'static str,
        ExtractionMethod,
        fn(&TextExtractor, &[u8]) -> Result<String, String>,
    )> {
        match format {
            FileFormat::Pdf => vec![
                ("pdf_native", ExtractionMethod::PdfNative, |_, b| {
                    pdf::extract_native(b)
                }),
                ("pdf_pages", ExtractionMethod::PdfAlternate, |_, b| {
                    pdf::extract_pages(b)
                }),
                ("pdf_literals", ExtractionMethod::PdfLiteral, |_, b| {
                    pdf::extract_literals(b)
                }),
                ("ocr", ExtractionMethod::Ocr, |this, b| match &this.ocr {
                    Some(engine) => engine.recognize_pdf(b),
                    None => Err("no OCR engine configured".to_string()),
                }),
            ],
            FileFormat::Hwpx => vec![("hwpx_xml", ExtractionMethod::Hwpx, |_, b| hwpx::extract(b))],
            FileFormat::Html => vec![("html_strip", ExtractionMethod::Html, |_, b| {
                let html = String::from_utf8_lossy(b);
                markup::extract(&html)
            })],
            FileFormat::Txt => vec![("txt_decode", ExtractionMethod::PlainText, |_, b| {
                decode_text(b)
            })],
        }
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_text(bytes: &[u8]) -> Result<String, String> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => {
            warn!("Input is not valid UTF-8, decoding lossily");
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
