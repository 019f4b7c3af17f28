//! External AI provider implementations
//!
//! This module contains implementations for various external AI providers
//! including OpenAI, Anthropic, Groq, Gemini, Mistral, Hugging Face, and custom providers.

pub mod anthropic;
pub mod custom;
pub mod deepseek;
pub mod gemini;
pub mod groq;
pub mod huggingface;
pub mod local;
pub mod mistral;
pub mod openai;
pub mod openai_compatible;
pub mod openai_types;

pub use anthropic::*;
pub use custom::*;
pub use deepseek::*;
pub use gemini::*;
pub use groq::*;
pub use huggingface::*;
pub use local::*;
pub use mistral::*;
pub use openai::*;
pub use openai_compatible::*;
pub use openai_types::*;
