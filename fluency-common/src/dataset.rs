//! Sample index reading and score table writing
//!
//! Training index: CSV with at least `filename` and `label` columns.
//! Test index: CSV with at least a `filename` column.
//! Score output: CSV `filename,label`, one row per test sample in index order.

use crate::config::ScaleConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One audio sample from an index file
///
/// Immutable once loaded; `label` is present only for training samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Filename as written in the index (also the output key)
    pub id: String,
    /// Resolved path under the audio root
    pub audio_path: PathBuf,
    /// Proficiency label
    pub label: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TrainRow {
    filename: String,
    label: f64,
}

#[derive(Debug, Deserialize)]
struct TestRow {
    filename: String,
}

#[derive(Debug, Serialize)]
struct ScoreRow<'a> {
    filename: &'a str,
    label: f64,
}

/// Read a labelled index, resolving filenames against `audio_root`
///
/// Labels must be finite and lie on `scale`.
pub fn read_train_index(
    index_path: &Path,
    audio_root: &Path,
    scale: &ScaleConfig,
) -> Result<Vec<Sample>> {
    let mut reader = open_index(index_path)?;
    let mut samples = Vec::new();

    for (row_idx, record) in reader.deserialize::<TrainRow>().enumerate() {
        let row = record.map_err(|e| {
            Error::Dataset(format!("{} row {}: {}", index_path.display(), row_idx + 1, e))
        })?;
        if !row.label.is_finite() {
            return Err(Error::InvalidInput(format!(
                "{} row {}: label for {} is not finite",
                index_path.display(),
                row_idx + 1,
                row.filename
            )));
        }
        if row.label < scale.min || row.label > scale.max {
            return Err(Error::InvalidInput(format!(
                "{} row {}: label {} for {} is outside [{}, {}]",
                index_path.display(),
                row_idx + 1,
                row.label,
                row.filename,
                scale.min,
                scale.max
            )));
        }
        samples.push(Sample {
            audio_path: audio_root.join(&row.filename),
            id: row.filename,
            label: Some(row.label),
        });
    }

    debug!(path = %index_path.display(), rows = samples.len(), "Read training index");
    Ok(samples)
}

/// Read an unlabelled index, resolving filenames against `audio_root`
pub fn read_test_index(index_path: &Path, audio_root: &Path) -> Result<Vec<Sample>> {
    let mut reader = open_index(index_path)?;
    let mut samples = Vec::new();

    for (row_idx, record) in reader.deserialize::<TestRow>().enumerate() {
        let row = record.map_err(|e| {
            Error::Dataset(format!("{} row {}: {}", index_path.display(), row_idx + 1, e))
        })?;
        samples.push(Sample {
            audio_path: audio_root.join(&row.filename),
            id: row.filename,
            label: None,
        });
    }

    debug!(path = %index_path.display(), rows = samples.len(), "Read test index");
    Ok(samples)
}

/// Write `filename,label` rows in the given order
pub fn write_scores(output_path: &Path, ids: &[String], scores: &[f64]) -> Result<()> {
    if ids.len() != scores.len() {
        return Err(Error::InvalidInput(format!(
            "{} ids but {} scores",
            ids.len(),
            scores.len()
        )));
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(output_path)?;
    for (id, &score) in ids.iter().zip(scores) {
        writer.serialize(ScoreRow {
            filename: id,
            label: score,
        })?;
    }
    writer.flush()?;

    debug!(path = %output_path.display(), rows = ids.len(), "Wrote score table");
    Ok(())
}

fn open_index(index_path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !index_path.exists() {
        return Err(Error::NotFound(format!(
            "Sample index {}",
            index_path.display()
        )));
    }
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(index_path)
        .map_err(Error::from)
}
