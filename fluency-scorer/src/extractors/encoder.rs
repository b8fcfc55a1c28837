//! Pretrained audio encoder seam
//!
//! The encoder is opaque: normalised 16 kHz mono samples in, one pooled
//! hidden-state vector out. [`SharedEncoder`] owns the process-wide instance,
//! built at most once on first use and never mutated afterwards.

use crate::error::{Result, ScorerError};
use once_cell::sync::OnceCell;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Pooled-embedding producer
pub trait AudioEncoder: Send + Sync {
    /// Encode one utterance (already normalised to zero mean, unit variance)
    /// into a time-pooled vector
    fn encode(&self, samples: &[f32]) -> Result<Vec<f32>>;

    /// Hidden size, when known before the first call
    fn hidden_size(&self) -> Option<usize> {
        None
    }

    /// Short label for logs
    fn name(&self) -> &str;
}

/// Compute device requested for the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda(u32),
    /// Best available accelerator, else CPU
    Auto,
}

impl FromStr for Device {
    type Err = ScorerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda(0)),
            "auto" | "" => Ok(Device::Auto),
            other => match other.strip_prefix("cuda:") {
                Some(index) => index.parse().map(Device::Cuda).map_err(|_| {
                    ScorerError::Encoder(format!("invalid CUDA device index in '{}'", s))
                }),
                None => Err(ScorerError::Encoder(format!(
                    "unknown device '{}' (expected cpu, cuda, cuda:N or auto)",
                    s
                ))),
            },
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(i) => write!(f, "cuda:{}", i),
            Device::Auto => write!(f, "auto"),
        }
    }
}

/// Zero-mean, unit-variance copy of a waveform
pub fn normalize_input(samples: &[f32]) -> Vec<f32> {
    const EPS: f64 = 1e-7;
    if samples.is_empty() {
        return Vec::new();
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| f64::from(s)).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&s| (f64::from(s) - mean).powi(2))
        .sum::<f64>()
        / n;
    let scale = (var + EPS).sqrt();
    samples
        .iter()
        .map(|&s| ((f64::from(s) - mean) / scale) as f32)
        .collect()
}

/// Average a row-major `[frames, hidden]` buffer over frames
pub fn mean_pool(hidden_states: &[f32], frames: usize, hidden: usize) -> Result<Vec<f32>> {
    if frames == 0 || hidden == 0 || hidden_states.len() != frames * hidden {
        return Err(ScorerError::Encoder(format!(
            "cannot pool {} values as [{}, {}]",
            hidden_states.len(),
            frames,
            hidden
        )));
    }
    let mut pooled = vec![0.0f64; hidden];
    for row in hidden_states.chunks_exact(hidden) {
        for (acc, &v) in pooled.iter_mut().zip(row) {
            *acc += f64::from(v);
        }
    }
    Ok(pooled.into_iter().map(|v| (v / frames as f64) as f32).collect())
}

type EncoderFactory = Box<dyn Fn() -> Result<Arc<dyn AudioEncoder>> + Send + Sync>;

/// Lazily initialised, shared encoder handle
///
/// Clones share the same cell, so the factory runs at most once no matter
/// how many extractors hold the handle.
#[derive(Clone)]
pub struct SharedEncoder {
    cell: Arc<OnceCell<Arc<dyn AudioEncoder>>>,
    factory: Arc<EncoderFactory>,
}

impl SharedEncoder {
    /// Defer construction to the first [`get`](Self::get)
    pub fn lazy<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn AudioEncoder>> + Send + Sync + 'static,
    {
        Self {
            cell: Arc::new(OnceCell::new()),
            factory: Arc::new(Box::new(factory)),
        }
    }

    /// Wrap an already-built encoder
    pub fn from_encoder(encoder: Arc<dyn AudioEncoder>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(encoder);
        Self {
            cell: Arc::new(cell),
            factory: Arc::new(Box::new(|| {
                Err(ScorerError::Encoder("encoder already initialised".to_string()))
            })),
        }
    }

    /// The encoder, building it on first call
    pub fn get(&self) -> Result<&Arc<dyn AudioEncoder>> {
        self.cell.get_or_try_init(|| {
            let encoder = (self.factory)()?;
            tracing::info!(encoder = encoder.name(), "Audio encoder initialised");
            Ok(encoder)
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl fmt::Debug for SharedEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEncoder")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
