use candle_core::{Device, Tensor};
use std::path::Path;
use tokenizers::Tokenizer;

use super::candle::{CandleError, CandleModel};

/// Simplified Llama model implementation for Candle
/// Note: This is a placeholder implementation - actual model loading would require
/// specific model files and more complex initialization
#[derive(Debug)]
pub struct LlamaModelWrapper {
    device: Device,
    vocab_size: usize,
    cache: Option<Vec<Tensor>>,
}

impl LlamaModelWrapper {
    pub fn load(
        model_path: &str,
        device: &Device,
    ) -> Result<Self, CandleError> {
        // This is a simplified placeholder implementation
        // In a real implementation, you would:
        // 1. Load the model configuration from config.json
        // 2. Load the model weights from model safetensors files
        // 3. Initialize the Llama model with the weights
        
        println!("Loading Llama model from: {}", model_path);
        
        // For now, create a minimal placeholder
        Ok(Self {
            device: device.clone(),
            vocab_size: 32000, // Default vocab size
            cache: None,
        })
    }

    pub fn load_tokenizer(model_path: &str) -> Result<Tokenizer, CandleError> {
        let tokenizer_path = Path::new(model_path).join("tokenizer.json");
        Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| CandleError::TokenizerError(format!("Failed to load tokenizer: {}", e)))
    }
}

impl CandleModel for LlamaModelWrapper {
    fn forward(&mut self, input_ids: &Tensor, _start_pos: usize) -> candle_core::Result<Tensor> {
        // This is a placeholder implementation
        // In a real implementation, this would run the actual model forward pass
        
        let batch_size = input_ids.dim(0)?;
        let seq_len = input_ids.dim(1)?;
        
        // Create dummy logits tensor with vocab_size as last dimension
        let logits = Tensor::randn(0f32, 1.0, (batch_size, seq_len, self.vocab_size), &self.device)?;
        Ok(logits)
    }

    fn clear_cache(&mut self) {
        self.cache = None;
    }
}

/// Model factory for creating different model types
pub struct ModelFactory;

impl ModelFactory {
    pub fn create_model(
        model_type: &str,
        model_path: &str,
        device: &Device,
    ) -> Result<Box<dyn CandleModel + Send + Sync>, CandleError> {
        match model_type.to_lowercase().as_str() {
            "llama" => {
                let model = LlamaModelWrapper::load(model_path, device)?;
                Ok(Box::new(model))
            }
            _ => Err(CandleError::UnsupportedModel(model_type.to_string())),
        }
    }

    pub fn load_tokenizer(
        model_type: &str,
        model_path: &str,
    ) -> Result<Tokenizer, CandleError> {
        match model_type.to_lowercase().as_str() {
            "llama" => LlamaModelWrapper::load_tokenizer(model_path),
            _ => Err(CandleError::UnsupportedModel(model_type.to_string())),
        }
    }
}

/// Utility functions for model management
pub struct ModelUtils;

impl ModelUtils {
    /// Check if a model exists at the given path
    pub fn model_exists(model_path: &str) -> bool {
        let path = Path::new(model_path);
        path.exists() && path.is_dir() && 
        path.join("tokenizer.json").exists()
    }

    /// Get model size in bytes
    pub fn get_model_size(model_path: &str) -> Result<u64, std::io::Error> {
        let mut total_size = 0;
        for entry in std::fs::read_dir(model_path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                total_size += entry.metadata()?.len();
            }
        }
        Ok(total_size)
    }

    /// List available models in a directory
    pub fn list_models(models_dir: &str) -> Result<Vec<String>, std::io::Error> {
        let mut models = Vec::new();
        for entry in std::fs::read_dir(models_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if Self::model_exists(&entry.path().to_string_lossy()) {
                        models.push(name.to_string());
                    }
                }
            }
        }
        Ok(models)
    }
}