//! Detector Configuration
//!
//! Defines the configuration shared by every detector, the probability
//! conversion methods, and the JSON IO trait used to persist detectors.
use crate::errors::DetectorError;
use crate::utils::items_to_strings;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default share of outliers assumed in the training population.
pub const DEFAULT_CONTAMINATION: f64 = 0.1;

/// Methods for converting raw decision scores into outlier probabilities.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ProbabilityMethod {
    /// Min-max scaling fitted on the training scores.
    #[default]
    Linear,
    /// Gaussian error function over standardized scores.
    Unify,
}

impl FromStr for ProbabilityMethod {
    type Err = DetectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(ProbabilityMethod::Linear),
            "unify" => Ok(ProbabilityMethod::Unify),
            _ => Err(DetectorError::InvalidMethod(
                s.to_string(),
                items_to_strings(vec!["linear", "unify"]),
            )),
        }
    }
}

fn default_contamination() -> f64 {
    DEFAULT_CONTAMINATION
}

/// Configuration common to all detectors.
///
/// Deserialization goes through [`DetectorConfig::new`], so a loaded
/// configuration is validated like a constructed one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DetectorConfigData")]
pub struct DetectorConfig {
    /// Fraction of the training population assumed to be outliers, in (0, 0.5].
    pub contamination: f64,
}

/// Unvalidated form of [`DetectorConfig`] as read from JSON.
#[derive(Deserialize)]
struct DetectorConfigData {
    #[serde(default = "default_contamination")]
    contamination: f64,
}

impl TryFrom<DetectorConfigData> for DetectorConfig {
    type Error = DetectorError;

    fn try_from(data: DetectorConfigData) -> Result<Self, Self::Error> {
        DetectorConfig::new(data.contamination)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            contamination: DEFAULT_CONTAMINATION,
        }
    }
}

impl DetectorConfig {
    /// Build a validated configuration.
    pub fn new(contamination: f64) -> Result<Self, DetectorError> {
        validate_contamination(contamination)?;
        Ok(DetectorConfig { contamination })
    }
}

/// Contamination must lie in (0, 0.5]. NaN is rejected.
pub fn validate_contamination(contamination: f64) -> Result<(), DetectorError> {
    if contamination > 0.0 && contamination <= 0.5 {
        Ok(())
    } else {
        Err(DetectorError::InvalidContamination(contamination))
    }
}

/// IO
pub trait DetectorIO: Serialize + DeserializeOwned + Sized {
    /// Save a detector as a json object to a file.
    ///
    /// * `path` - Path to save detector.
    fn save_detector<P: AsRef<Path>>(&self, path: P) -> Result<(), DetectorError> {
        fs::write(path, self.json_dump()?).map_err(|e| DetectorError::UnableToWrite(e.to_string()))
    }

    /// Dump a detector as a json object
    fn json_dump(&self) -> Result<String, DetectorError> {
        serde_json::to_string(self).map_err(|e| DetectorError::UnableToWrite(e.to_string()))
    }

    /// Load a detector from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, DetectorError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| DetectorError::UnableToRead(e.to_string()))
    }

    /// Load a detector from a path to a json detector object.
    ///
    /// * `path` - Path to load detector from.
    fn load_detector<P: AsRef<Path>>(path: P) -> Result<Self, DetectorError> {
        let json_str = fs::read_to_string(path).map_err(|e| DetectorError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl DetectorIO for DetectorConfig {}
