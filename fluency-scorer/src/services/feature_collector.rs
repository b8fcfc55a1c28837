//! Feature extraction over a whole sample list
//!
//! Handcrafted extraction is CPU-bound and independent per file, so it fans
//! out over a rayon pool. Embedding extraction goes through one encoder
//! session and runs serially. The two jobs run side by side on blocking
//! threads. Both outputs keep the input sample order.

use crate::error::{Result, ScorerError};
use crate::extractors::{EmbeddingFeatureExtractor, HandcraftedFeatureExtractor, SharedEncoder};
use crate::types::{EmbeddingVector, HandcraftedVector};
use fluency_common::config::ExtractionConfig;
use fluency_common::dataset::Sample;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Log a progress line every this many files
const PROGRESS_INTERVAL: usize = 50;

/// Row-aligned features of one sample list
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub handcrafted: Vec<HandcraftedVector>,
    pub embeddings: Vec<EmbeddingVector>,
    pub embedding_dim: usize,
    pub sentinel_count: usize,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.handcrafted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handcrafted.is_empty()
    }
}

#[derive(Clone)]
pub struct FeatureCollector {
    handcrafted: Arc<HandcraftedFeatureExtractor>,
    embedding: Arc<EmbeddingFeatureExtractor>,
    pool: Arc<rayon::ThreadPool>,
}

impl FeatureCollector {
    pub fn new(config: &ExtractionConfig, encoder: SharedEncoder) -> Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("handcrafted-{}", i));
        if let Some(workers) = config.workers {
            builder = builder.num_threads(workers.max(1));
        }
        let pool = builder.build().map_err(|e| {
            ScorerError::Common(fluency_common::Error::Config(format!(
                "failed to build extraction pool: {}",
                e
            )))
        })?;

        Ok(Self {
            handcrafted: Arc::new(HandcraftedFeatureExtractor::new(config.sample_rate)),
            embedding: Arc::new(EmbeddingFeatureExtractor::new(encoder, config.sample_rate)),
            pool: Arc::new(pool),
        })
    }

    /// Parallel handcrafted extraction; failures become sentinels
    pub fn collect_handcrafted(&self, paths: &[PathBuf]) -> Vec<HandcraftedVector> {
        let total = paths.len();
        let processed = AtomicUsize::new(0);
        let extractor = &self.handcrafted;

        self.pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    let vector = extractor.extract_or_sentinel(path);
                    let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % PROGRESS_INTERVAL == 0 {
                        tracing::debug!(done, total, "Handcrafted extraction progress");
                    }
                    vector
                })
                .collect()
        })
    }

    /// Single-threaded handcrafted extraction
    pub fn collect_handcrafted_sequential(&self, paths: &[PathBuf]) -> Vec<HandcraftedVector> {
        paths
            .iter()
            .map(|path| self.handcrafted.extract_or_sentinel(path))
            .collect()
    }

    /// Serial embedding extraction
    ///
    /// The first vector fixes the run's dimensionality unless `expected_dim`
    /// (from a trained model) is given; any later mismatch aborts.
    pub fn collect_embeddings(
        &self,
        paths: &[PathBuf],
        expected_dim: Option<usize>,
    ) -> Result<(Vec<EmbeddingVector>, usize)> {
        let mut dim = expected_dim;
        let mut out = Vec::with_capacity(paths.len());

        for (i, path) in paths.iter().enumerate() {
            let vector = self.embedding.extract(path)?;
            match dim {
                None => dim = Some(vector.dim()),
                Some(expected) if expected != vector.dim() => {
                    return Err(ScorerError::Dimension {
                        expected,
                        actual: vector.dim(),
                        context: format!("embedding of {}", path.display()),
                    });
                }
                Some(_) => {}
            }
            out.push(vector);
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                tracing::debug!(done = i + 1, total = paths.len(), "Embedding extraction progress");
            }
        }

        let dim = dim.ok_or_else(|| ScorerError::Fit("no samples to embed".to_string()))?;
        Ok((out, dim))
    }

    /// Run both extractors concurrently over `samples`
    pub async fn collect(&self, samples: &[Sample], expected_dim: Option<usize>) -> Result<FeatureSet> {
        if samples.is_empty() {
            return Err(ScorerError::Fit("no samples to extract".to_string()));
        }
        let paths: Arc<Vec<PathBuf>> =
            Arc::new(samples.iter().map(|s| s.audio_path.clone()).collect());
        let start = Instant::now();
        tracing::info!(samples = paths.len(), "Extracting features");

        let handcrafted_job = {
            let collector = self.clone();
            let paths = Arc::clone(&paths);
            tokio::task::spawn_blocking(move || collector.collect_handcrafted(&paths))
        };
        let embedding_job = {
            let collector = self.clone();
            let paths = Arc::clone(&paths);
            tokio::task::spawn_blocking(move || collector.collect_embeddings(&paths, expected_dim))
        };

        let (handcrafted, embeddings) = tokio::join!(handcrafted_job, embedding_job);
        let handcrafted =
            handcrafted.map_err(|e| ScorerError::Join(format!("handcrafted extraction: {}", e)))?;
        let (embeddings, embedding_dim) =
            embeddings.map_err(|e| ScorerError::Join(format!("embedding extraction: {}", e)))??;

        let sentinel_count = handcrafted.iter().filter(|v| v.is_sentinel()).count();
        if sentinel_count > 0 {
            tracing::warn!(
                sentinel_count,
                total = handcrafted.len(),
                "Some handcrafted vectors fell back to zeros"
            );
        }
        tracing::info!(
            samples = handcrafted.len(),
            embedding_dim,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Feature extraction complete"
        );

        Ok(FeatureSet {
            handcrafted,
            embeddings,
            embedding_dim,
            sentinel_count,
        })
    }
}
