//! PDF text extraction with page tracking

use crate::error::{Error, Result};
use crate::types::{ExtractedText, PageText};

/// Characters PDF fonts commonly emit that break pattern matching
const REPLACEMENTS: &[(char, &str)] = &[
    ('\0', ""),
    ('\u{00A0}', " "),  // Non-breaking space
    ('\u{2010}', "-"),  // Hyphen
    ('\u{2011}', "-"),  // Non-breaking hyphen
    ('\u{2013}', "-"),  // En dash
    ('\u{2014}', "--"), // Em dash
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "), // Bullet
    ('\u{2026}', "..."),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Normalize extracted text: glyph replacements, per-line trimming, blank lines dropped
pub fn cleanup_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => result.push_str(to),
            None => result.push(c),
        }
    }

    result
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text-layer PDF extractor
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract page-ordered text from PDF bytes.
    ///
    /// `lopdf` is tried page by page first; when it finds no text at all,
    /// `pdf-extract` gets a pass over the whole document. A document without
    /// a text layer yields empty pages rather than an error.
    pub fn extract(source: &str, data: &[u8]) -> Result<ExtractedText> {
        let primary = Self::extract_pages(data);

        match primary {
            Ok(text) if !text.is_empty() => {
                tracing::debug!(
                    "Extracted {} pages ({} chars) from {}",
                    text.page_count(),
                    text.char_count(),
                    source
                );
                Ok(text)
            }
            Ok(empty) => match Self::extract_whole(data) {
                Ok(text) if !text.is_empty() => {
                    tracing::info!("pdf-extract recovered text for {}", source);
                    Ok(text)
                }
                Ok(_) => Ok(empty),
                Err(e) => {
                    tracing::debug!("pdf-extract fallback failed for {}: {}", source, e);
                    Ok(empty)
                }
            },
            Err(load_err) => {
                tracing::warn!("lopdf could not load {}: {}, trying pdf-extract", source, load_err);
                Self::extract_whole(data).map_err(|e| {
                    Error::extraction(source, format!("{}; fallback: {}", load_err, e))
                })
            }
        }
    }

    /// Extract on the blocking pool
    pub async fn extract_blocking(source: String, data: Vec<u8>) -> Result<ExtractedText> {
        tokio::task::spawn_blocking(move || Self::extract(&source, &data))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))?
    }

    fn extract_pages(data: &[u8]) -> std::result::Result<ExtractedText, lopdf::Error> {
        let doc = lopdf::Document::load_mem(data)?;
        let pages = doc
            .get_pages()
            .keys()
            .map(|&number| {
                let text = match doc.extract_text(&[number]) {
                    Ok(text) => cleanup_text(&text),
                    Err(e) => {
                        tracing::debug!("No text on page {}: {}", number, e);
                        String::new()
                    }
                };
                PageText { number, text }
            })
            .collect();

        Ok(ExtractedText::new(pages))
    }

    fn extract_whole(data: &[u8]) -> std::result::Result<ExtractedText, String> {
        let raw = pdf_extract::extract_text_from_mem(data).map_err(|e| e.to_string())?;

        let pages = raw
            .split('\u{000C}')
            .enumerate()
            .map(|(i, page)| PageText {
                number: i as u32 + 1,
                text: cleanup_text(page),
            })
            .collect();

        Ok(ExtractedText::new(pages))
    }
}
