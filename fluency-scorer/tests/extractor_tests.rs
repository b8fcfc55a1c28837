//! Feature extraction on real files: vector shape, failure policies and
//! row-order preservation

mod helpers;

use fluency_common::config::ExtractionConfig;
use fluency_scorer::extractors::{
    EmbeddingFeatureExtractor, HandcraftedFeatureExtractor, SharedEncoder,
};
use fluency_scorer::services::FeatureCollector;
use fluency_scorer::types::{HandcraftedVector, HANDCRAFTED_DIM};
use fluency_scorer::ScorerError;
use helpers::*;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn extraction_config() -> ExtractionConfig {
    ExtractionConfig {
        workers: Some(3),
        ..ExtractionConfig::default()
    }
}

#[test]
fn test_handcrafted_vector_from_resampled_stereo() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stereo.wav");
    let config = AudioConfig {
        sample_rate: 44_100,
        channels: 2,
        duration_seconds: 1.5,
        ..Default::default()
    };
    generate_test_wav(&path, &config).unwrap();

    let extractor = HandcraftedFeatureExtractor::new(16_000);
    let vector = extractor.extract(&path).unwrap();

    assert_eq!(vector.as_slice().len(), HANDCRAFTED_DIM);
    assert!(vector.as_slice().iter().all(|v| v.is_finite()));
    // 440 Hz tone: about 880 crossings per second at 16 kHz
    let zcr_mean = vector.0[4];
    assert!((zcr_mean - 880.0 / 16_000.0).abs() < 0.01, "zcr_mean {}", zcr_mean);
}

#[test]
fn test_broken_inputs_give_zero_sentinel() {
    let temp_dir = TempDir::new().unwrap();
    let corrupt = generate_corrupt_file(&temp_dir.path().join("corrupt.wav")).unwrap();
    let zero_bytes = generate_zero_byte_file(&temp_dir.path().join("zero.wav")).unwrap();
    let no_frames = generate_empty_wav(&temp_dir.path().join("empty.wav")).unwrap();
    let missing = temp_dir.path().join("missing.wav");

    let extractor = HandcraftedFeatureExtractor::new(16_000);
    for path in [&corrupt, &zero_bytes, &no_frames, &missing] {
        let vector = extractor.extract_or_sentinel(path);
        assert_eq!(vector, HandcraftedVector::SENTINEL, "{}", path.display());
        assert_eq!(vector.as_slice().len(), HANDCRAFTED_DIM);
        assert!(extractor.extract(path).is_err());
    }
}

#[test]
fn test_embedding_failure_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let corrupt = generate_corrupt_file(&temp_dir.path().join("corrupt.wav")).unwrap();
    let zero_bytes = generate_zero_byte_file(&temp_dir.path().join("zero.wav")).unwrap();

    let extractor = EmbeddingFeatureExtractor::new(mock_encoder(8), 16_000);
    for path in [&corrupt, &zero_bytes] {
        match extractor.extract(path) {
            Err(ScorerError::Extraction { sample, .. }) => {
                assert_eq!(sample, path.file_name().unwrap().to_string_lossy());
            }
            other => panic!("expected extraction error, got {:?}", other),
        }
    }
}

#[test]
fn test_embedding_has_encoder_width() {
    let temp_dir = TempDir::new().unwrap();
    let path = generate_test_wav(&temp_dir.path().join("a.wav"), &AudioConfig::default()).unwrap();

    let extractor = EmbeddingFeatureExtractor::new(mock_encoder(16), 16_000);
    let embedding = extractor.extract(&path).unwrap();
    assert_eq!(embedding.dim(), 16);
}

#[test]
fn test_parallel_and_sequential_paths_preserve_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut paths: Vec<PathBuf> = Vec::new();
    for i in 0..12 {
        let path = temp_dir.path().join(format!("clip_{:02}.wav", i));
        if i % 5 == 3 {
            generate_corrupt_file(&path).unwrap();
        } else {
            let config = AudioConfig {
                frequency: 150.0 + 60.0 * i as f32,
                duration_seconds: 0.5,
                ..Default::default()
            };
            generate_test_wav(&path, &config).unwrap();
        }
        paths.push(path);
    }

    let collector = FeatureCollector::new(&extraction_config(), mock_encoder(4)).unwrap();
    let parallel = collector.collect_handcrafted(&paths);
    let sequential = collector.collect_handcrafted_sequential(&paths);

    assert_eq!(parallel, sequential);
    for (i, vector) in parallel.iter().enumerate() {
        assert_eq!(vector.is_sentinel(), i % 5 == 3, "row {}", i);
    }
    // Pitch rises with the index, and so does the zero-crossing rate
    let zcr: Vec<f64> = parallel
        .iter()
        .filter(|v| !v.is_sentinel())
        .map(|v| v.0[4])
        .collect();
    assert!(zcr.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_embedding_dimension_mismatch_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut paths = Vec::new();
    // 16000 and 8000 samples: widths 3 and 4
    for (i, seconds) in [1.0, 0.5].iter().enumerate() {
        let config = AudioConfig {
            duration_seconds: *seconds,
            ..Default::default()
        };
        paths.push(generate_test_wav(&temp_dir.path().join(format!("{}.wav", i)), &config).unwrap());
    }

    let encoder = SharedEncoder::from_encoder(Arc::new(UnstableEncoder));
    let collector = FeatureCollector::new(&extraction_config(), encoder).unwrap();
    assert!(matches!(
        collector.collect_embeddings(&paths, None),
        Err(ScorerError::Dimension { .. })
    ));
}

#[test]
fn test_expected_dimension_enforced() {
    let temp_dir = TempDir::new().unwrap();
    let path = generate_test_wav(&temp_dir.path().join("a.wav"), &AudioConfig::default()).unwrap();

    let collector = FeatureCollector::new(&extraction_config(), mock_encoder(8)).unwrap();
    match collector.collect_embeddings(&[path], Some(12)) {
        Err(ScorerError::Dimension {
            expected, actual, ..
        }) => {
            assert_eq!((expected, actual), (12, 8));
        }
        other => panic!("expected dimension error, got {:?}", other.map(|(_, d)| d)),
    }
}
