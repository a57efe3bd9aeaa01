//! Scoring
//!
//! Turns the training decision scores of a detector into a threshold, binary
//! labels and the calibration statistics used later by `predict_proba`.
use crate::errors::DetectorError;
use crate::utils::{mean, percentile_sorted, sorted, std};
use log::info;

/// Fitted state of a detector.
///
/// All fields are derived together from one score vector, so the threshold
/// and labels can never disagree with the scores they came from. Persisted
/// detectors store the decision scores only and rebuild the rest on load.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedScores {
    decision_scores: Vec<f64>,
    /// Training scores in ascending order, used for rank lookups.
    sorted_scores: Vec<f64>,
    threshold: f64,
    labels: Vec<u8>,
    mu: f64,
    sigma: f64,
}

impl FittedScores {
    /// Post-process training scores.
    ///
    /// * `decision_scores` - One score per training node, higher is more anomalous.
    /// * `contamination` - Expected share of outliers, the threshold is the
    ///   `100 * (1 - contamination)` percentile of the scores.
    pub fn from_decision_scores(decision_scores: Vec<f64>, contamination: f64) -> Result<Self, DetectorError> {
        if decision_scores.is_empty() {
            return Err(DetectorError::EmptyScores);
        }
        if let Some((i, s)) = decision_scores.iter().enumerate().find(|(_, s)| !s.is_finite()) {
            return Err(DetectorError::NonFiniteScore(i, *s));
        }

        let sorted_scores = sorted(&decision_scores);
        let threshold = percentile_sorted(&sorted_scores, 100.0 * (1.0 - contamination));
        let labels = label_scores(&decision_scores, threshold);
        let mu = mean(&decision_scores);
        let sigma = std(&decision_scores);

        info!(
            "Processed {} decision scores, threshold {:.6}, {} outliers.",
            decision_scores.len(),
            threshold,
            labels.iter().filter(|l| **l == 1).count()
        );

        Ok(FittedScores {
            decision_scores,
            sorted_scores,
            threshold,
            labels,
            mu,
            sigma,
        })
    }

    /// Outlier scores of the training nodes, in training node order.
    pub fn decision_scores(&self) -> &[f64] {
        &self.decision_scores
    }

    /// Training scores in ascending order.
    pub fn sorted_scores(&self) -> &[f64] {
        &self.sorted_scores
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Binary labels of the training nodes, 1 for outliers.
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Mean of the training scores.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Population standard deviation of the training scores.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn n_samples(&self) -> usize {
        self.decision_scores.len()
    }

    /// Label new scores against the fitted threshold.
    pub fn label(&self, scores: &[f64]) -> Vec<u8> {
        label_scores(scores, self.threshold)
    }
}

/// 1 where the score is strictly above the threshold, 0 otherwise.
pub fn label_scores(scores: &[f64], threshold: f64) -> Vec<u8> {
    scores.iter().map(|s| u8::from(*s > threshold)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_threshold_uniform_scores() {
        let scores: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        let fitted = FittedScores::from_decision_scores(scores, 0.1).unwrap();
        assert_relative_eq!(fitted.threshold(), 90.1, epsilon = 1e-9);
        assert_eq!(fitted.labels().iter().filter(|l| **l == 1).count(), 10);
        assert_eq!(fitted.labels()[89], 0);
        assert_eq!(fitted.labels()[90], 1);
        assert_relative_eq!(fitted.mu(), 50.5, epsilon = 1e-12);
    }

    #[test]
    fn test_labels_match_threshold() {
        let mut rng = StdRng::seed_from_u64(7);
        let scores: Vec<f64> = (0..500).map(|_| rng.gen::<f64>() * 10.0).collect();
        for contamination in [0.01, 0.05, 0.1, 0.3, 0.5] {
            let fitted = FittedScores::from_decision_scores(scores.clone(), contamination).unwrap();
            for (s, l) in fitted.decision_scores().iter().zip(fitted.labels()) {
                assert_eq!(*l == 1, *s > fitted.threshold());
            }
        }
    }

    #[test]
    fn test_preserves_training_order() {
        let scores = vec![3., 1., 2.];
        let fitted = FittedScores::from_decision_scores(scores.clone(), 0.3).unwrap();
        assert_eq!(fitted.decision_scores(), &scores[..]);
        assert_eq!(fitted.sorted_scores(), &[1., 2., 3.]);
        assert_eq!(fitted.labels(), &[1, 0, 0]);
    }

    #[test]
    fn test_constant_scores_have_no_outliers() {
        let fitted = FittedScores::from_decision_scores(vec![2.0; 20], 0.1).unwrap();
        assert_eq!(fitted.threshold(), 2.0);
        assert!(fitted.labels().iter().all(|l| *l == 0));
        assert_eq!(fitted.sigma(), 0.0);
    }

    #[test]
    fn test_rejects_empty_and_nan() {
        assert_eq!(
            FittedScores::from_decision_scores(vec![], 0.1).unwrap_err(),
            DetectorError::EmptyScores
        );
        let err = FittedScores::from_decision_scores(vec![1.0, f64::NAN], 0.1).unwrap_err();
        assert!(matches!(err, DetectorError::NonFiniteScore(1, _)));
    }
}
