//! Per-sample feature extractors
//!
//! - [`HandcraftedFeatureExtractor`]: 13 acoustic statistics, recoverable
//!   failures collapse to a zero sentinel
//! - [`EmbeddingFeatureExtractor`]: pooled pretrained-encoder output,
//!   failures are fatal

pub mod embedding;
pub mod encoder;
pub mod handcrafted;
#[cfg(feature = "onnx")]
pub mod onnx_encoder;

pub use embedding::EmbeddingFeatureExtractor;
pub use encoder::{AudioEncoder, Device, SharedEncoder};
pub use handcrafted::HandcraftedFeatureExtractor;
#[cfg(feature = "onnx")]
pub use onnx_encoder::OnnxEncoder;
