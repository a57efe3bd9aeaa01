//! Confidence
//!
//! Estimates how consistently a detector would make the same prediction if
//! its training set were perturbed (Perini et al., "Quantifying the
//! confidence of anomaly detectors in their example-wise predictions").
//!
//! For a test score `x` with `k` training scores at or below it, the outlier
//! probability is the Laplace smoothed `(1 + k) / (2 + n)`. The confidence
//! in an outlier call is the Binomial(n, p) tail above
//! `m = n - floor(n * contamination)`. Inlier calls report the complement.
use crate::errors::DetectorError;
use crate::scoring::FittedScores;
use crate::utils::count_less_equal;
use log::debug;
use statrs::distribution::{Binomial, DiscreteCDF};

/// `floor(n * contamination)`, the number of training outliers implied by the
/// contamination. The floating point product is truncated as computed, so
/// `100 * 0.29` gives 28.
pub fn expected_outliers(n: usize, contamination: f64) -> u64 {
    ((n as f64) * contamination) as u64
}

/// Posterior outlier probability of a score given the sorted training scores.
#[inline]
pub fn posterior_outlier_probability(sorted_train: &[f64], x: f64) -> f64 {
    let n = sorted_train.len() as f64;
    let k = count_less_equal(sorted_train, x) as f64;
    (1.0 + k) / (2.0 + n)
}

/// Per-sample confidence of the predictions for `scores`.
///
/// * `fitted` - Training state of the detector.
/// * `scores` - Decision scores of the samples to assess.
/// * `contamination` - Contamination the detector was configured with.
pub fn prediction_confidence(
    fitted: &FittedScores,
    scores: &[f64],
    contamination: f64,
) -> Result<Vec<f64>, DetectorError> {
    let n = fitted.n_samples();
    let m = n as u64 - expected_outliers(n, contamination);
    let threshold = fitted.threshold();
    debug!(
        "Estimating confidence of {} predictions against {} training scores, m = {}.",
        scores.len(),
        n,
        m
    );

    scores
        .iter()
        .map(|x| {
            let p = posterior_outlier_probability(fitted.sorted_scores(), *x);
            let binom = Binomial::new(p, n as u64).map_err(|e| DetectorError::Statistics(e.to_string()))?;
            // P(X > m), the outlier call survives the perturbation.
            let confidence = binom.sf(m).clamp(0.0, 1.0);
            if *x > threshold {
                Ok(confidence)
            } else {
                Ok(1.0 - confidence)
            }
        })
        .collect()
}
