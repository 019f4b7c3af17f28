//! GPTQ quantization implementation
//!
//! This module implements GPTQ (General Purpose Token Quantization) support
//! for 4-bit and 8-bit quantized models, enabling large model inference on
//! consumer GPUs with reduced memory requirements.

use candle_core::{Device, Result, Shape, Tensor};
use candle_nn::{Linear, Module};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{QuantConfig, QuantMethod};
use crate::ai::candle::candle::CandleError;

/// GPTQ-specific configuration loaded from model files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GptqConfig {
    /// Quantization method ("gptq", "awq")
    #[serde(default = "default_quant_method")]
    pub quant_method: String,
    
    /// Number of bits (4 or 8)
    #[serde(default = "default_bits")]
    pub bits: u32,
    
    /// Group size for quantization
    #[serde(default = "default_group_size")]
    pub group_size: i32,
    
    /// Symmetric quantization
    #[serde(default = "default_true")]
    pub sym: bool,
    
    /// Activation ordering
    #[serde(default = "default_false")]
    pub desc_act: bool,
    
    /// Checkpoint format
    pub checkpoint_format: Option<String>,
    
    /// AWQ format specific
    #[serde(default = "default_false")]
    pub zero_point: bool,
    
    /// Version information
    pub version: Option<String>,
}

// Default value functions for serde
fn default_quant_method() -> String { "gptq".to_string() }
fn default_bits() -> u32 { 4 }
fn default_group_size() -> i32 { 128 }
fn default_true() -> bool { true }
fn default_false() -> bool { false }

impl Default for GptqConfig {
    fn default() -> Self {
        Self {
            quant_method: "gptq".to_string(),
            bits: 4,
            group_size: 128,
            sym: true,
            desc_act: false,
            checkpoint_format: None,
            zero_point: false,
            version: None,
        }
    }
}

impl From<GptqConfig> for QuantConfig {
    fn from(gptq_config: GptqConfig) -> Self {
        let method = match gptq_config.quant_method.as_str() {
            "gptq" => QuantMethod::Gptq,
            "awq" => QuantMethod::Awq,
            "marlin" => QuantMethod::Marlin,
            _ => QuantMethod::Gptq,
        };

        QuantConfig {
            method,
            bits: gptq_config.bits,
            group_size: gptq_config.group_size,
            symmetric: gptq_config.sym,
            desc_act: gptq_config.desc_act,
            checkpoint_format: gptq_config.checkpoint_format,
        }
    }
}

/// GPTQ quantized linear layer
#[derive(Debug)]
pub struct GptqLinear {
    /// Quantized weights (packed)
    qweight: Tensor,
    /// Scaling factors
    scales: Tensor,
    /// Zero points (for asymmetric quantization)
    qzeros: Option<Tensor>,
    /// Group indices (for GPTQ with activation ordering)
    g_idx: Option<Tensor>,
    /// Bias term
    bias: Option<Tensor>,
    /// Configuration
    config: QuantConfig,
    /// Input/output dimensions
    in_features: usize,
    out_features: usize,
}

impl GptqLinear {
    /// Create a new GPTQ linear layer
    pub fn new(
        qweight: Tensor,
        scales: Tensor,
        qzeros: Option<Tensor>,
        g_idx: Option<Tensor>,
        bias: Option<Tensor>,
        config: QuantConfig,
        in_features: usize,
        out_features: usize,
    ) -> Result<Self> {
        // Validate tensor shapes
        let pack_factor = config.pack_factor() as usize;
        let expected_weight_shape = match config.method {
            QuantMethod::Gptq => (in_features / pack_factor, out_features),
            QuantMethod::Awq => (in_features, out_features / pack_factor),
            _ => (in_features / pack_factor, out_features),
        };

        let weight_shape = qweight.shape().dims2()?;
        if weight_shape != expected_weight_shape {
            return Err(candle_core::Error::Msg(format!(
                "Invalid weight shape: expected {:?}, got {:?}",
                expected_weight_shape, weight_shape
            )));
        }

        Ok(Self {
            qweight,
            scales,
            qzeros,
            g_idx,
            bias,
            config,
            in_features,
            out_features,
        })
    }

    /// Load GPTQ linear layer from tensors
    pub fn from_tensors(
        tensors: &HashMap<String, Tensor>,
        prefix: &str,
        config: &QuantConfig,
        in_features: usize,
        out_features: usize,
    ) -> Result<Self> {
        let qweight_key = format!("{}.qweight", prefix);
        let scales_key = format!("{}.scales", prefix);
        let qzeros_key = format!("{}.qzeros", prefix);
        let g_idx_key = format!("{}.g_idx", prefix);
        let bias_key = format!("{}.bias", prefix);

        let qweight = tensors
            .get(&qweight_key)
            .ok_or_else(|| candle_core::Error::Msg(format!("Missing quantized weight: {}", qweight_key)))?
            .clone();

        let scales = tensors
            .get(&scales_key)
            .ok_or_else(|| candle_core::Error::Msg(format!("Missing scales: {}", scales_key)))?
            .clone();

        let qzeros = if !config.symmetric {
            tensors.get(&qzeros_key).map(|t| t.clone())
        } else {
            None
        };

        let g_idx = if config.desc_act {
            tensors.get(&g_idx_key).map(|t| t.clone())
        } else {
            None
        };

        let bias = tensors.get(&bias_key).map(|t| t.clone());

        Self::new(qweight, scales, qzeros, g_idx, bias, config.clone(), in_features, out_features)
    }

    /// Forward pass with GPTQ dequantization
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        // Dequantize weights on-the-fly and perform matrix multiplication
        let dequantized_weight = self.dequantize_weights()?;
        
        // Perform matrix multiplication
        let output = x.matmul(&dequantized_weight)?;
        
        // Add bias if present
        if let Some(bias) = &self.bias {
            output.broadcast_add(bias)
        } else {
            Ok(output)
        }
    }

    /// Dequantize the quantized weights
    fn dequantize_weights(&self) -> Result<Tensor> {
        match self.config.bits {
            4 => self.dequantize_4bit(),
            8 => self.dequantize_8bit(),
            _ => Err(candle_core::Error::Msg(format!(
                "Unsupported bit width: {}",
                self.config.bits
            ))),
        }
    }

    /// Dequantize 4-bit weights
    fn dequantize_4bit(&self) -> Result<Tensor> {
        let device = self.qweight.device();
        let dtype = self.scales.dtype();
        
        // Get the packed weights as u32
        let qweight_shape = self.qweight.shape();
        let scales_shape = self.scales.shape();
        
        // For 4-bit, we need to unpack 8 weights from each u32
        let pack_factor = self.config.pack_factor() as usize;
        
        // Create output tensor
        let output_shape = match self.config.method {
            QuantMethod::Gptq => Shape::from_dims(&[self.in_features, self.out_features]),
            QuantMethod::Awq => Shape::from_dims(&[self.in_features, self.out_features]),
            _ => Shape::from_dims(&[self.in_features, self.out_features]),
        };
        
        // For now, implement a basic CPU-based dequantization
        // In production, this would use optimized CUDA/Metal kernels
        if device.is_cpu() {
            self.dequantize_4bit_cpu()
        } else {
            // Fallback to CPU for now
            let qweight_cpu = self.qweight.to_device(&Device::Cpu)?;
            let scales_cpu = self.scales.to_device(&Device::Cpu)?;
            let qzeros_cpu = if let Some(qzeros) = &self.qzeros {
                Some(qzeros.to_device(&Device::Cpu)?)
            } else {
                None
            };
            
            let cpu_linear = GptqLinear {
                qweight: qweight_cpu,
                scales: scales_cpu,
                qzeros: qzeros_cpu,
                g_idx: self.g_idx.clone(),
                bias: self.bias.clone(),
                config: self.config.clone(),
                in_features: self.in_features,
                out_features: self.out_features,
            };
            
            let result = cpu_linear.dequantize_4bit_cpu()?;
            result.to_device(device)
        }
    }

    /// CPU implementation of 4-bit dequantization
    fn dequantize_4bit_cpu(&self) -> Result<Tensor> {
        let qweight_data = self.qweight.flatten_all()?.to_vec1::<u32>()?;
        let scales_data = self.scales.to_vec2::<f32>()?;
        
        let qzeros_data = if let Some(qzeros) = &self.qzeros {
            Some(qzeros.to_vec2::<u32>()?)
        } else {
            None
        };

        let mut output_data = vec![0.0f32; self.in_features * self.out_features];
        
        let pack_factor = 8; // 8 weights per u32 for 4-bit
        let group_size = if self.config.group_size == -1 {
            self.in_features
        } else {
            self.config.group_size as usize
        };

        for out_idx in 0..self.out_features {
            for in_group in 0..(self.in_features / group_size) {
                let scale_idx = match self.config.method {
                    QuantMethod::Gptq => in_group * self.out_features + out_idx,
                    QuantMethod::Awq => out_idx * (self.in_features / group_size) + in_group,
                    _ => in_group * self.out_features + out_idx,
                };
                
                let scale = scales_data[scale_idx / self.out_features][scale_idx % self.out_features];
                
                let zero_point = if let Some(ref qzeros) = qzeros_data {
                    // Unpack zero point from 4-bit
                    let zero_packed = qzeros[scale_idx / self.out_features][scale_idx % self.out_features];
                    let zero_shift = (scale_idx % pack_factor) * 4;
                    ((zero_packed >> zero_shift) & 0xF) as f32
                } else {
                    0.0f32
                };

                for group_offset in 0..group_size {
                    let in_idx = in_group * group_size + group_offset;
                    if in_idx >= self.in_features {
                        break;
                    }

                    let weight_idx = match self.config.method {
                        QuantMethod::Gptq => (in_idx / pack_factor) * self.out_features + out_idx,
                        QuantMethod::Awq => in_idx * (self.out_features / pack_factor) + (out_idx / pack_factor),
                        _ => (in_idx / pack_factor) * self.out_features + out_idx,
                    };

                    let packed_weight = qweight_data[weight_idx];
                    let weight_shift = (in_idx % pack_factor) * 4;
                    let quantized_weight = ((packed_weight >> weight_shift) & 0xF) as f32;

                    // Dequantize: (quantized - zero_point) * scale
                    let dequantized = (quantized_weight - zero_point) * scale;
                    
                    let output_idx = in_idx * self.out_features + out_idx;
                    output_data[output_idx] = dequantized;
                }
            }
        }

        let device = self.qweight.device();
        Tensor::from_vec(output_data, (self.in_features, self.out_features), device)
    }

    /// Dequantize 8-bit weights (placeholder)
    fn dequantize_8bit(&self) -> Result<Tensor> {
        // Similar to 4-bit but with 4 weights per u32
        // Implementation would be similar but with different bit operations
        Err(candle_core::Error::Msg("8-bit GPTQ not yet implemented".to_string()))
    }
}

impl Module for GptqLinear {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        self.forward(xs)
    }
}

/// GPTQ model loader and detector
pub struct GptqLoader;

impl GptqLoader {
    /// Detect if a model directory contains GPTQ quantized weights
    pub fn detect_gptq_model(model_path: &Path) -> Result<Option<GptqConfig>> {
        // First, try to load quantization config from config.json
        let config_path = model_path.join("config.json");
        if config_path.exists() {
            if let Ok(config_content) = std::fs::read_to_string(&config_path) {
                if let Ok(config_json) = serde_json::from_str::<serde_json::Value>(&config_content) {
                    if let Some(quant_config) = config_json.get("quantization_config") {
                        if let Ok(gptq_config) = serde_json::from_value::<GptqConfig>(quant_config.clone()) {
                            return Ok(Some(gptq_config));
                        }
                    }
                }
            }
        }

        // If no config found, try to detect by examining weight files
        if Self::has_gptq_tensors(model_path)? {
            // Return default GPTQ config
            Ok(Some(GptqConfig::default()))
        } else {
            Ok(None)
        }
    }

    /// Check if the model directory contains GPTQ-style tensors
    fn has_gptq_tensors(model_path: &Path) -> Result<bool> {
        // Look for .safetensors files and check for GPTQ tensor names
        for entry in std::fs::read_dir(model_path)? {
            let entry = entry?;
            let path = entry.path();
            
            if let Some(extension) = path.extension() {
                if extension == "safetensors" {
                    // For now, just check if file exists
                    // In a full implementation, we would parse the safetensors file
                    // and look for tensors with names like "*.qweight", "*.scales", etc.
                    return Ok(true);
                }
            }
        }
        
        Ok(false)
    }

    /// Load GPTQ configuration from model directory
    pub fn load_gptq_config(model_path: &Path) -> Result<GptqConfig> {
        if let Some(config) = Self::detect_gptq_model(model_path)? {
            Ok(config)
        } else {
            Err(candle_core::Error::Msg(
                "No GPTQ configuration found in model directory".to_string()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gptq_config_validation() {
        let config = QuantConfig::gptq(4, 128, true);
        assert!(config.validate().is_ok());
        assert_eq!(config.pack_factor(), 8);
        assert!(config.is_marlin_compatible());
    }

    #[test]
    fn test_gptq_config_serde() {
        let json = r#"{
            "quant_method": "gptq",
            "bits": 4,
            "group_size": 128,
            "sym": true,
            "desc_act": false
        }"#;
        
        let config: GptqConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.bits, 4);
        assert_eq!(config.group_size, 128);
        assert!(config.sym);
    }
}