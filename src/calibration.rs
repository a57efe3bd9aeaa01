//! Calibration
//!
//! Conversion of raw decision scores into two-class probabilities. Each row
//! of the output is `[p_inlier, p_outlier]` and sums to one.
//!
//! * `Linear`: min-max scaling fitted on the training scores.
//! * `Unify`: Gaussian error function over scores standardized with the
//!   training mean and standard deviation (Kriegel et al., "Interpreting
//!   and unifying outlier scores").
use crate::config::ProbabilityMethod;
use crate::errors::DetectorError;
use crate::scoring::FittedScores;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use statrs::function::erf::erf;
use std::f64::consts::SQRT_2;

/// Rows of `[p_inlier, p_outlier]`.
pub type Probabilities = Vec<[f64; 2]>;

/// Min-max scaler mapping the fitted range onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: f64,
    pub data_max: f64,
    scale: f64,
}

impl MinMaxScaler {
    /// Fit the scaler on the training scores.
    pub fn fit(values: &[f64]) -> Result<Self, DetectorError> {
        if values.is_empty() {
            return Err(DetectorError::EmptyScores);
        }
        let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = data_max - data_min;
        // A constant feature keeps unit scale, values are only shifted.
        let scale = if range == 0.0 { 1.0 } else { 1.0 / range };
        Ok(MinMaxScaler {
            data_min,
            data_max,
            scale,
        })
    }

    /// Scale a single value, unclipped.
    #[inline]
    pub fn transform_one(&self, v: f64) -> f64 {
        (v - self.data_min) * self.scale
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.transform_one(*v)).collect()
    }
}

fn to_probabilities(outlier: impl Iterator<Item = f64>) -> Probabilities {
    outlier
        .map(|p| {
            let p = p.clamp(0.0, 1.0);
            [1.0 - p, p]
        })
        .collect()
}

/// Linear conversion, the scaler is fitted on the training scores only.
pub fn linear_probabilities(fitted: &FittedScores, scores: &[f64]) -> Result<Probabilities, DetectorError> {
    let scaler = MinMaxScaler::fit(fitted.decision_scores())?;
    debug!(
        "Linear calibration of {} scores over training range [{}, {}].",
        scores.len(),
        scaler.data_min,
        scaler.data_max
    );
    Ok(to_probabilities(scores.iter().map(|s| scaler.transform_one(*s))))
}

/// Unify conversion: `erf((score - mu) / (sigma * sqrt(2)))`, clipped.
///
/// With zero training spread every score above the mean is an outlier with
/// probability one and every other score with probability zero.
pub fn unify_probabilities(fitted: &FittedScores, scores: &[f64]) -> Probabilities {
    let mu = fitted.mu();
    let sigma = fitted.sigma();
    if sigma == 0.0 {
        warn!("Training decision scores have zero standard deviation, unify probabilities degenerate to a step.");
        return to_probabilities(scores.iter().map(|s| if *s > mu { 1.0 } else { 0.0 }));
    }
    debug!("Unify calibration of {} scores, mu {}, sigma {}.", scores.len(), mu, sigma);
    to_probabilities(scores.iter().map(|s| erf((s - mu) / (sigma * SQRT_2))))
}

/// Dispatch on the conversion method.
pub fn probabilities(
    fitted: &FittedScores,
    scores: &[f64],
    method: ProbabilityMethod,
) -> Result<Probabilities, DetectorError> {
    match method {
        ProbabilityMethod::Linear => linear_probabilities(fitted, scores),
        ProbabilityMethod::Unify => Ok(unify_probabilities(fitted, scores)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fitted(scores: Vec<f64>) -> FittedScores {
        FittedScores::from_decision_scores(scores, 0.1).unwrap()
    }

    #[test]
    fn test_min_max_scaler() {
        let scaler = MinMaxScaler::fit(&[2., 4., 6.]).unwrap();
        assert_eq!(scaler.transform(&[2., 3., 6., 8.]), vec![0., 0.25, 1., 1.5]);
    }

    #[test]
    fn test_min_max_scaler_constant() {
        let scaler = MinMaxScaler::fit(&[3., 3.]).unwrap();
        assert_eq!(scaler.transform(&[3., 3.5]), vec![0., 0.5]);
        assert_eq!(MinMaxScaler::fit(&[]).unwrap_err(), DetectorError::EmptyScores);
    }

    #[test]
    fn test_linear_clips_out_of_range() {
        let f = fitted((0..=10).map(|x| x as f64).collect());
        let probs = linear_probabilities(&f, &[-5., 0., 2.5, 10., 50.]).unwrap();
        assert_eq!(probs[0], [1., 0.]);
        assert_eq!(probs[1], [1., 0.]);
        assert_relative_eq!(probs[2][1], 0.25);
        assert_eq!(probs[3], [0., 1.]);
        assert_eq!(probs[4], [0., 1.]);
    }

    #[test]
    fn test_unify_shape() {
        let f = fitted(vec![-1., 1.]);
        // mu = 0, sigma = 1
        let probs = unify_probabilities(&f, &[-2., 0., 1., 3.]);
        assert_eq!(probs[0], [1., 0.]);
        assert_eq!(probs[1], [1., 0.]);
        assert_relative_eq!(probs[2][1], erf(1.0 / SQRT_2), epsilon = 1e-12);
        assert!(probs[3][1] > 0.99);
        for row in probs {
            assert_relative_eq!(row[0] + row[1], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_unify_zero_sigma() {
        let f = fitted(vec![1.; 5]);
        let probs = unify_probabilities(&f, &[0.5, 1.0, 1.5]);
        assert_eq!(probs, vec![[1., 0.], [1., 0.], [0., 1.]]);
    }

    #[test]
    fn test_dispatch() {
        let f = fitted((0..=4).map(|x| x as f64).collect());
        let linear = probabilities(&f, &[2.], ProbabilityMethod::Linear).unwrap();
        assert_relative_eq!(linear[0][1], 0.5);
        let unify = probabilities(&f, &[2.], ProbabilityMethod::Unify).unwrap();
        assert_relative_eq!(unify[0][1], 0.0);
    }
}
