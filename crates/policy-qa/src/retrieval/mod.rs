//! Chunk indexing and similarity retrieval

mod indexer;

pub use indexer::ChunkIndexer;
