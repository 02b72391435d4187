//! Document, extracted text and chunk types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;

/// Where a document comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Locator {
    /// `http://` or `https://` URL
    Remote(String),
    /// Filesystem path
    Local(PathBuf),
}

impl Locator {
    /// Classify a locator string. Anything that is not an http(s) URL is a path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Remote(trimmed.to_string())
        } else {
            Self::Local(PathBuf::from(trimmed))
        }
    }

    /// Whether the locator points at a remote URL
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Raw document bytes held in memory for one analysis
#[derive(Debug, Clone)]
pub struct Document {
    /// Locator text the document was fetched from
    pub source: String,
    /// Raw bytes
    pub bytes: Vec<u8>,
    /// First 16 hex chars of the SHA-256 of `bytes`
    pub fingerprint: String,
}

impl Document {
    /// Wrap fetched bytes, computing the fingerprint
    pub fn new(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        let fingerprint = fingerprint(&bytes);
        Self {
            source: source.into(),
            bytes,
            fingerprint,
        }
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-byte document
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Short content hash used to namespace chunk ids
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = hex::encode(digest);
    hex.truncate(16);
    hex
}

/// Text of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number
    pub number: u32,
    /// Cleaned page text
    pub text: String,
}

/// Page-ordered text of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub pages: Vec<PageText>,
}

impl ExtractedText {
    pub fn new(pages: Vec<PageText>) -> Self {
        Self { pages }
    }

    /// Build from a single block of text treated as page 1
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            pages: vec![PageText {
                number: 1,
                text: text.into(),
            }],
        }
    }

    /// True when no page carries any non-whitespace text
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Flattened text with `--- Page N ---` markers
    pub fn full_text(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            out.push_str(&format!("\n--- Page {} ---\n", page.number));
            out.push_str(&page.text);
            out.push('\n');
        }
        out
    }

    /// Total characters across pages
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Bounded slice of page text; the unit of embedding and indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{fingerprint}-page_{page}_chunk_{ordinal}`
    pub id: String,
    pub text: String,
    /// 1-based page number
    pub page: u32,
    /// 1-based position within the page
    pub ordinal: u32,
}

impl Chunk {
    pub fn new(fingerprint: &str, page: u32, ordinal: u32, text: String) -> Self {
        Self {
            id: Self::make_id(fingerprint, page, ordinal),
            text,
            page,
            ordinal,
        }
    }

    /// Chunk id for a document fingerprint and position
    pub fn make_id(fingerprint: &str, page: u32, ordinal: u32) -> String {
        format!("{}-page_{}_chunk_{}", fingerprint, page, ordinal)
    }
}
