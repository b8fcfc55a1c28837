//! Property tests for the range contract, the split and the regressors

use fluency_scorer::dsp::mean_std;
use fluency_scorer::regressors::{GradientBoostingRegressor, Regressor, RidgeRegressor};
use fluency_scorer::services::TrainValSplit;
use fluency_scorer::types::{FinalScores, MetaFeature};
use fluency_common::config::BoostingConfig;
use ndarray::Array2;
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    #[test]
    fn clamped_scores_stay_in_scale(raw in prop::collection::vec(-1e6f64..1e6, 0..64)) {
        let scores = FinalScores::clamp(&raw, 0.0, 5.0);
        prop_assert_eq!(scores.0.len(), raw.len());
        for (s, r) in scores.0.iter().zip(&raw) {
            prop_assert!((0.0..=5.0).contains(s));
            if (0.0..=5.0).contains(r) {
                prop_assert_eq!(s, r);
            }
        }
    }

    #[test]
    fn split_partitions_all_rows(n in 2usize..300, fraction in 0.05f64..0.6, seed in any::<u64>()) {
        let expected_val = (fraction * n as f64).ceil() as usize;
        prop_assume!(expected_val < n);

        let split = TrainValSplit::new(n, fraction, seed).unwrap();
        prop_assert_eq!(split.validation.len(), expected_val);
        prop_assert_eq!(split.train.len() + split.validation.len(), n);

        let all: HashSet<usize> = split.train.iter().chain(&split.validation).copied().collect();
        prop_assert_eq!(all.len(), n);
        prop_assert!(all.iter().all(|&i| i < n));
    }

    #[test]
    fn predictions_match_row_count(rows in 3usize..30, seed in 0u64..1000) {
        let x = Array2::from_shape_fn((rows, 3), |(i, j)| {
            ((i as u64 * 31 + j as u64 * 17 + seed) % 23) as f64 / 7.0
        });
        let y: Vec<f64> = (0..rows).map(|i| 1.0 + (i % 4) as f64).collect();

        let ridge = RidgeRegressor::fit(&x, &y, 1.0).unwrap();
        prop_assert_eq!(ridge.predict(&x).unwrap().len(), rows);

        let cfg = BoostingConfig { n_estimators: 5, ..BoostingConfig::default() };
        let boosted = GradientBoostingRegressor::fit(&x, &y, &cfg).unwrap();
        let pred = boosted.predict(&x).unwrap();
        prop_assert_eq!(pred.len(), rows);
        prop_assert!(pred.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn meta_matrix_keeps_row_order(pairs in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 1..40)) {
        let (hc, emb): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
        let m = MetaFeature::matrix(&hc, &emb);
        for (i, (h, e)) in pairs.iter().enumerate() {
            prop_assert_eq!(m[[i, 0]], *h);
            prop_assert_eq!(m[[i, 1]], *e);
        }
    }

    #[test]
    fn std_is_non_negative(values in prop::collection::vec(-1e3f64..1e3, 1..100)) {
        let (mean, std) = mean_std(&values);
        prop_assert!(std >= 0.0);
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(mean >= lo - 1e-9 && mean <= hi + 1e-9);
    }
}
