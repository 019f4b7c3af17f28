pub mod config;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::{ModelConfig, TokenizerConfig};
pub use router::{create_model_server_router, ModelServerState};