pub mod batch;
pub mod cache;
pub mod attention;
pub mod scheduler;

pub use batch::{BatchProcessor, InferenceRequest};
pub use cache::CachePool;