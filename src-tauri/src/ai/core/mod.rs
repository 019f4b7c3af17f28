//! Core AI provider types, traits, and utilities
//!
//! This module contains the fundamental types and traits used across all AI providers,
//! including common HTTP client builders and proxy configuration.

pub mod providers;
pub mod provider_base;

pub use providers::*;
pub use provider_base::*;