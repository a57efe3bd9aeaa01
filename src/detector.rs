//! Detector
//!
//! The contract implemented by every outlier detector on graphs, and the
//! shared state and post-processing behind it.
//!
//! A concrete detector embeds a [`BaseDetector`], implements `fit`,
//! `decision_function` and `process_graph`, and calls
//! [`BaseDetector::process_decision_scores`] at the end of `fit`. Prediction,
//! probability calibration and confidence estimation are provided.
use crate::calibration::{self, Probabilities};
use crate::config::{validate_contamination, DetectorConfig, DetectorIO, ProbabilityMethod};
use crate::confidence::prediction_confidence;
use crate::data::Graph;
use crate::errors::DetectorError;
use crate::metrics::roc_auc_score;
use crate::params::{Estimator, ParamValue};
use crate::scoring::FittedScores;
use log::warn;
use serde::{Deserialize, Serialize};

/// Attributes populated by `fit`, reported when a detector is used unfitted.
pub const FITTED_ATTRIBUTES: [&str; 3] = ["decision_scores", "threshold", "labels"];

/// Labels predicted for a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// One label per node, 1 for outliers.
    pub labels: Vec<u8>,
    /// Per-node confidence, when requested.
    pub confidence: Option<Vec<f64>>,
}

/// Outlier probabilities predicted for a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbaPrediction {
    /// Rows of `[p_inlier, p_outlier]`.
    pub probabilities: Probabilities,
    /// Per-node confidence, when requested.
    pub confidence: Option<Vec<f64>>,
}

impl ProbaPrediction {
    /// Outlier probability of every node.
    pub fn outlier_probabilities(&self) -> Vec<f64> {
        self.probabilities.iter().map(|row| row[1]).collect()
    }
}

/// Configuration and fitted state shared by all detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "BaseDetectorData", try_from = "BaseDetectorData")]
pub struct BaseDetector {
    pub cfg: DetectorConfig,
    fitted: Option<FittedScores>,
    n_classes: usize,
}

/// Persisted form of a [`BaseDetector`]. Only the training scores are kept,
/// threshold, labels and statistics are derived again when loading.
#[derive(Serialize, Deserialize)]
struct BaseDetectorData {
    cfg: DetectorConfig,
    decision_scores: Option<Vec<f64>>,
    n_classes: usize,
}

impl From<BaseDetector> for BaseDetectorData {
    fn from(base: BaseDetector) -> Self {
        BaseDetectorData {
            cfg: base.cfg,
            decision_scores: base.fitted.map(|f| f.decision_scores().to_vec()),
            n_classes: base.n_classes,
        }
    }
}

impl TryFrom<BaseDetectorData> for BaseDetector {
    type Error = DetectorError;

    fn try_from(data: BaseDetectorData) -> Result<Self, Self::Error> {
        let fitted = data
            .decision_scores
            .map(|scores| FittedScores::from_decision_scores(scores, data.cfg.contamination))
            .transpose()?;
        Ok(BaseDetector {
            cfg: data.cfg,
            fitted,
            n_classes: data.n_classes,
        })
    }
}

impl Default for BaseDetector {
    fn default() -> Self {
        BaseDetector {
            cfg: DetectorConfig::default(),
            fitted: None,
            n_classes: 2,
        }
    }
}

impl BaseDetector {
    /// Base detector object.
    ///
    /// * `contamination` - The amount of contamination of the data set, i.e.
    ///   the proportion of outliers. Used when fitting to define the threshold
    ///   on the decision function. Must be in (0, 0.5].
    pub fn new(contamination: f64) -> Result<Self, DetectorError> {
        Ok(BaseDetector {
            cfg: DetectorConfig::new(contamination)?,
            ..Default::default()
        })
    }

    pub fn contamination(&self) -> f64 {
        self.cfg.contamination
    }

    /// Change the contamination. Fitted state is kept until the next `fit`.
    pub fn set_contamination(&mut self, contamination: f64) -> Result<(), DetectorError> {
        validate_contamination(contamination)?;
        self.cfg.contamination = contamination;
        Ok(())
    }

    /// Derive threshold, labels and calibration statistics from the training
    /// scores, replacing any previous fitted state.
    pub fn process_decision_scores(&mut self, decision_scores: Vec<f64>) -> Result<(), DetectorError> {
        self.fitted = Some(FittedScores::from_decision_scores(
            decision_scores,
            self.cfg.contamination,
        )?);
        Ok(())
    }

    /// Fitted state, or a not-fitted error.
    pub fn fitted(&self) -> Result<&FittedScores, DetectorError> {
        self.fitted
            .as_ref()
            .ok_or_else(|| DetectorError::NotFitted(FITTED_ATTRIBUTES.iter().map(|a| a.to_string()).collect()))
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Drop the fitted state.
    pub fn reset(&mut self) {
        self.fitted = None;
    }

    /// Record the number of classes. Detectors are unsupervised, so labels
    /// are not expected; when given, their distinct values are counted and a
    /// warning is logged.
    pub fn set_n_classes(&mut self, y: Option<&[f64]>) -> Result<(), DetectorError> {
        self.n_classes = 2;
        if let Some(y) = y {
            if let Some((i, v)) = y.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(DetectorError::InvalidParameterValue(
                    format!("y[{}]", i),
                    "finite class label".to_string(),
                    v.to_string(),
                ));
            }
            let mut classes = y.to_vec();
            classes.sort_unstable_by(|a, b| a.total_cmp(b));
            classes.dedup();
            self.n_classes = classes.len();
            warn!("y should not be presented in unsupervised learning.");
        }
        Ok(())
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Read the shared `contamination` parameter.
    pub fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "contamination" => Some(ParamValue::Float(self.cfg.contamination)),
            _ => None,
        }
    }

    /// Write the shared `contamination` parameter.
    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), DetectorError> {
        match name {
            "contamination" => self.set_contamination(value.to_f64(name)?),
            _ => Err(DetectorError::InvalidParameter {
                key: name.to_string(),
                estimator: "BaseDetector".to_string(),
            }),
        }
    }
}

impl DetectorIO for BaseDetector {}

/// Outlier detector on graphs.
///
/// Scores follow one convention regardless of the underlying algorithm:
/// higher means more anomalous, one score per node, in node order.
pub trait Detector: Estimator {
    /// Detector specific view of a graph, e.g. features and connectivity.
    type Processed;

    fn base(&self) -> &BaseDetector;

    fn base_mut(&mut self) -> &mut BaseDetector;

    /// Fit the detector on a graph. Implementations compute the training
    /// scores and finish with `self.base_mut().process_decision_scores(..)`.
    fn fit(&mut self, graph: &Graph) -> Result<&mut Self, DetectorError>;

    /// Raw anomaly scores of the nodes of `graph`.
    fn decision_function(&self, graph: &Graph) -> Result<Vec<f64>, DetectorError>;

    /// Extract the sub-data of `graph` this detector works on.
    fn process_graph(&self, graph: &Graph) -> Result<Self::Processed, DetectorError>;

    fn contamination(&self) -> f64 {
        self.base().contamination()
    }

    /// Outlier scores of the training nodes.
    fn decision_scores(&self) -> Result<&[f64], DetectorError> {
        Ok(self.base().fitted()?.decision_scores())
    }

    fn threshold(&self) -> Result<f64, DetectorError> {
        Ok(self.base().fitted()?.threshold())
    }

    /// Binary labels of the training nodes.
    fn labels(&self) -> Result<&[u8], DetectorError> {
        Ok(self.base().fitted()?.labels())
    }

    /// `decision_function`, checked to return one score per node.
    fn checked_decision_function(&self, graph: &Graph) -> Result<Vec<f64>, DetectorError> {
        let scores = self.decision_function(graph)?;
        if scores.len() != graph.n_nodes() {
            return Err(DetectorError::ScoreLengthMismatch(graph.n_nodes(), scores.len()));
        }
        Ok(scores)
    }

    /// Predict whether each node is an outlier.
    ///
    /// * `graph` - The input graph.
    /// * `return_confidence` - Also estimate the confidence of each label.
    fn predict(&self, graph: &Graph, return_confidence: bool) -> Result<Prediction, DetectorError> {
        let fitted = self.base().fitted()?;
        let scores = self.checked_decision_function(graph)?;
        let labels = fitted.label(&scores);
        let confidence = if return_confidence {
            Some(prediction_confidence(fitted, &scores, self.contamination())?)
        } else {
            None
        };
        Ok(Prediction { labels, confidence })
    }

    /// Predict the probability of each node being an outlier.
    ///
    /// * `graph` - The input graph.
    /// * `method` - `Linear` min-max scaling or `Unify` error function conversion.
    /// * `return_confidence` - Also estimate the confidence of each prediction.
    fn predict_proba(
        &self,
        graph: &Graph,
        method: ProbabilityMethod,
        return_confidence: bool,
    ) -> Result<ProbaPrediction, DetectorError> {
        let fitted = self.base().fitted()?;
        let scores = self.checked_decision_function(graph)?;
        let probabilities = calibration::probabilities(fitted, &scores, method)?;
        let confidence = if return_confidence {
            Some(prediction_confidence(fitted, &scores, self.contamination())?)
        } else {
            None
        };
        Ok(ProbaPrediction {
            probabilities,
            confidence,
        })
    }

    /// How consistently the detector would make the same prediction for each
    /// node under a perturbed training set, in [0, 1].
    fn predict_confidence(&self, graph: &Graph) -> Result<Vec<f64>, DetectorError> {
        let fitted = self.base().fitted()?;
        let scores = self.checked_decision_function(graph)?;
        prediction_confidence(fitted, &scores, self.contamination())
    }

    /// ROC AUC of the decision scores against the graph's ground truth.
    fn roc_auc(&self, graph: &Graph) -> Result<f64, DetectorError> {
        self.base().fitted()?;
        let y = graph.labels().ok_or(DetectorError::MissingLabels)?;
        let scores = self.checked_decision_function(graph)?;
        roc_auc_score(y, &scores, None)
    }
}
