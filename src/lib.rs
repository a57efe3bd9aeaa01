// Modules
pub mod calibration;
pub mod confidence;
pub mod config;
pub mod data;
pub mod detector;
pub mod errors;
pub mod metrics;
pub mod params;
pub mod scoring;
pub mod utils;

// Individual classes, and functions
pub use config::{DetectorConfig, DetectorIO, ProbabilityMethod};
pub use data::{Graph, Matrix};
pub use detector::{BaseDetector, Detector, Prediction, ProbaPrediction};
pub use errors::DetectorError;
pub use params::{Estimator, ParamDescriptor, ParamKey, ParamValue, Params};
pub use scoring::FittedScores;
