//! ONNX Runtime wav2vec2-style encoder (feature-gated behind `onnx`).
//!
//! Expects a model exported with one `[batch, samples]` f32 input and the
//! final hidden states `[batch, frames, hidden]` as its first output.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use super::encoder::{mean_pool, AudioEncoder, Device};
use crate::error::{Result, ScorerError};

pub struct OnnxEncoder {
    session: Mutex<ort::session::Session>,
    model_path: PathBuf,
}

impl OnnxEncoder {
    /// Load the model and create an inference session
    pub fn load(model_path: &Path, device: Device, intra_threads: usize) -> Result<Self> {
        if !model_path.exists() {
            return Err(ScorerError::Encoder(format!(
                "encoder model not found: {}",
                model_path.display()
            )));
        }

        match device {
            Device::Cpu => {}
            Device::Cuda(index) => warn!(
                device = %device,
                index,
                "CUDA execution provider not registered in this build, running on CPU"
            ),
            Device::Auto => debug!("No accelerator registered, running encoder on CPU"),
        }

        let session = build_session(model_path, intra_threads)
            .map_err(|e| ScorerError::Encoder(format!("session init: {e}")))?;

        info!(model = %model_path.display(), intra_threads, "ONNX encoder loaded");
        Ok(Self {
            session: Mutex::new(session),
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

fn build_session(
    model_path: &Path,
    intra_threads: usize,
) -> std::result::Result<ort::session::Session, Box<dyn std::error::Error + Send + Sync>> {
    let session = ort::session::Session::builder()?
        .with_intra_threads(intra_threads.max(1))?
        .commit_from_file(model_path)?;
    Ok(session)
}

fn run_inference(
    session: &mut ort::session::Session,
    samples: &[f32],
) -> std::result::Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
    #[allow(clippy::cast_possible_wrap)]
    let shape = vec![1i64, samples.len() as i64];
    let input = ort::value::Tensor::from_array((shape, samples.to_vec()))?;

    let outputs = session.run(ort::inputs![input])?;
    let (output_shape, data) = outputs[0].try_extract_tensor::<f32>()?;

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let dims: Vec<usize> = output_shape.iter().map(|&d| d as usize).collect();
    if dims.len() != 3 || dims[0] != 1 {
        return Err(format!("unexpected output shape: {output_shape:?}").into());
    }

    Ok(mean_pool(data, dims[1], dims[2])?)
}

impl AudioEncoder for OnnxEncoder {
    fn encode(&self, samples: &[f32]) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Err(ScorerError::Encoder("empty input".to_string()));
        }
        let mut session = self
            .session
            .lock()
            .map_err(|_| ScorerError::Encoder("encoder session lock poisoned".to_string()))?;
        run_inference(&mut session, samples).map_err(|e| ScorerError::Encoder(e.to_string()))
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
