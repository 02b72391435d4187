//! Document ingestion: fetch, extract, chunk

mod chunker;
mod fetcher;
mod parser;

pub use chunker::{WordChunker, DEFAULT_MAX_CHARS};
pub use fetcher::DocumentFetcher;
pub use parser::{cleanup_text, PdfExtractor};
