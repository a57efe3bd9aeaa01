//! Errors
//!
//! Custom error types used throughout the `graphod` crate.
use thiserror::Error;

/// Errors that can occur while configuring, fitting or scoring a detector.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    /// Contamination outside of (0, 0.5].
    #[error("contamination must be in (0, 0.5], got: {0}")]
    InvalidContamination(f64),
    /// A scoring call was made before `fit` completed.
    #[error("This detector is not fitted yet. Call 'fit' before using it; missing attributes: {}.", .0.join(", "))]
    NotFitted(Vec<String>),
    /// Unknown probability conversion method.
    #[error("{0} is not a valid probability conversion method, expected one of {1}.")]
    InvalidMethod(String, String),
    /// Unknown parameter name passed to `set_params`.
    #[error("Invalid parameter {key} for estimator {estimator}. Check the list of available parameters with `get_params`.")]
    InvalidParameter { key: String, estimator: String },
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameterValue(String, String, String),
    /// An estimator declared a variadic positional parameter.
    #[error("Estimators should always specify their parameters explicitly (no varargs). {0} doesn't follow this convention.")]
    VariadicConstructor(String),
    /// The input graph is inconsistent.
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),
    /// No decision scores to post-process.
    #[error("Cannot process an empty set of decision scores.")]
    EmptyScores,
    /// NaN or infinite decision score.
    #[error("Decision score {1} at position {0} is not finite.")]
    NonFiniteScore(usize, f64),
    /// A detector returned the wrong number of scores.
    #[error("Expected {0} decision scores, one per node, but {1} were returned.")]
    ScoreLengthMismatch(usize, usize),
    /// Failure inside a statistical primitive.
    #[error("Statistics error: {0}")]
    Statistics(String),
    /// Ground truth labels were required but the graph has none.
    #[error("The graph carries no ground truth labels.")]
    MissingLabels,
    /// Unable to write detector to file.
    #[error("Unable to write detector to file: {0}")]
    UnableToWrite(String),
    /// Unable to read detector from file.
    #[error("Unable to read detector from a file {0}")]
    UnableToRead(String),
}
