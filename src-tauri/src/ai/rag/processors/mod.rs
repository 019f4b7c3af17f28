// RAG processors

pub mod chunk;
pub mod entity_extraction;
pub mod text;

pub use chunk::{
    ChunkingProcessor, ChunkingStrategy, ContentType, TokenBasedChunker, ChunkSelector,
};
pub use entity_extraction::{EntityExtractionService, EntityExtractionServiceImpl};

