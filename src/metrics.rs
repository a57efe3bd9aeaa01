//! Metrics
//!
//! Evaluation of decision scores against ground truth outlier labels.
use crate::errors::DetectorError;

fn trapezoid_area(x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    (x0 - x1).abs() * (y0 + y1) * 0.5
}

/// Area under the ROC curve of `yhat` scores for binary labels `y`
/// (1 = outlier). Ties in the scores are handled as a single step.
/// Returns NaN when only one class is present.
///
/// * `y` - Ground truth, 0 or 1.
/// * `yhat` - Scores, higher means more likely an outlier.
/// * `sample_weight` - Optional instance weights, unit weights when `None`.
pub fn roc_auc_score(y: &[f64], yhat: &[f64], sample_weight: Option<&[f64]>) -> Result<f64, DetectorError> {
    if y.is_empty() {
        return Err(DetectorError::EmptyScores);
    }
    if y.len() != yhat.len() {
        return Err(DetectorError::ScoreLengthMismatch(y.len(), yhat.len()));
    }
    if let Some(w) = sample_weight {
        if w.len() != y.len() {
            return Err(DetectorError::ScoreLengthMismatch(y.len(), w.len()));
        }
    }
    let weight = |i: usize| sample_weight.map_or(1.0, |w| w[i]);

    let mut indices = (0..y.len()).collect::<Vec<_>>();
    indices.sort_unstable_by(|&a, &b| yhat[b].total_cmp(&yhat[a]));
    let mut auc: f64 = 0.0;

    let mut label = y[indices[0]];
    let mut w = weight(indices[0]);
    let mut fp = (1.0 - label) * w;
    let mut tp: f64 = label * w;
    let mut tp_prev: f64 = 0.0;
    let mut fp_prev: f64 = 0.0;

    for i in 1..indices.len() {
        if yhat[indices[i]] != yhat[indices[i - 1]] {
            auc += trapezoid_area(fp_prev, fp, tp_prev, tp);
            tp_prev = tp;
            fp_prev = fp;
        }
        label = y[indices[i]];
        w = weight(indices[i]);
        fp += (1.0 - label) * w;
        tp += label * w;
    }

    auc += trapezoid_area(fp_prev, fp, tp_prev, tp);
    if fp <= 0.0 || tp <= 0.0 {
        return Ok(f64::NAN);
    }
    Ok(auc / (tp * fp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_auc_perfect_and_inverted() {
        let y = vec![0., 0., 1., 1.];
        assert_relative_eq!(roc_auc_score(&y, &[0.1, 0.2, 0.8, 0.9], None).unwrap(), 1.0);
        assert_relative_eq!(roc_auc_score(&y, &[0.9, 0.8, 0.2, 0.1], None).unwrap(), 0.0);
    }

    #[test]
    fn test_auc_known_value() {
        let y = vec![0., 0., 1., 1.];
        let yhat = vec![0.1, 0.4, 0.35, 0.8];
        assert_relative_eq!(roc_auc_score(&y, &yhat, None).unwrap(), 0.75);
    }

    #[test]
    fn test_auc_ties() {
        let y = vec![0., 1.];
        assert_relative_eq!(roc_auc_score(&y, &[0.5, 0.5], None).unwrap(), 0.5);
    }

    #[test]
    fn test_auc_weighted() {
        let y = vec![0., 0., 1., 1.];
        let yhat = vec![0.1, 0.4, 0.35, 0.8];
        let w = vec![1., 1., 1., 1.];
        assert_relative_eq!(roc_auc_score(&y, &yhat, Some(&w)).unwrap(), 0.75);
    }

    #[test]
    fn test_auc_degenerate() {
        assert!(roc_auc_score(&[1., 1.], &[0.1, 0.2], None).unwrap().is_nan());
        assert_eq!(roc_auc_score(&[], &[], None).unwrap_err(), DetectorError::EmptyScores);
        assert!(roc_auc_score(&[1.], &[0.1, 0.2], None).is_err());
    }
}
