//! Static configuration, loaded once at process start.
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagcrop_ocr::CommandDetector;
use thiserror::Error;

use crate::area_filter::{DEFAULT_MAX_AREA_FRACTION, DEFAULT_MIN_AREA_FRACTION};
use crate::candidates::Keywords;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

/// How crops are re-encoded. `quality` only applies to JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputEncoding {
    pub format: OutputFormat,
    pub quality: u8,
}

impl Default for OutputEncoding {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 95,
        }
    }
}

/// Knobs of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub keywords: Keywords,
    pub min_area_fraction: f64,
    pub max_area_fraction: f64,
    pub output: OutputEncoding,
    /// Upper bound on one detector call, in seconds. `None` waits indefinitely.
    pub detection_timeout_secs: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keywords: Keywords::default(),
            min_area_fraction: DEFAULT_MIN_AREA_FRACTION,
            max_area_fraction: DEFAULT_MAX_AREA_FRACTION,
            output: OutputEncoding::default(),
            detection_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Detector deadline. Values that do not form a positive [`Duration`] mean no deadline;
    /// [`PipelineConfig::validate`] rejects them.
    pub fn detection_timeout(&self) -> Option<Duration> {
        self.detection_timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|limit| !limit.is_zero())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.is_empty() {
            return Err(ConfigError::Invalid("keyword set is empty".into()));
        }
        let (min, max) = (self.min_area_fraction, self.max_area_fraction);
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min >= max {
            return Err(ConfigError::Invalid(format!(
                "area fractions must satisfy 0 <= min < max, got min={min} max={max}"
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Invalid(format!(
                "output quality must be within 1..=100, got {}",
                self.output.quality
            )));
        }
        if let Some(secs) = self.detection_timeout_secs {
            let representable = Duration::try_from_secs_f64(secs).is_ok_and(|d| !d.is_zero());
            if !representable {
                return Err(ConfigError::Invalid(format!(
                    "detection timeout must be a positive number of seconds, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

/// External recognizer launched per image; see [`CommandDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_max_parallel() -> usize {
    1
}

impl DetectorConfig {
    pub fn build(&self) -> CommandDetector {
        CommandDetector::new(&self.program)
            .with_args(self.args.iter().cloned())
            .with_max_parallel(self.max_parallel)
    }
}

/// Process-wide settings for the event host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub raw_container: String,
    pub processed_container: String,
    pub max_concurrent_blobs: usize,
    pub detector: Option<DetectorConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            raw_container: "raw-images".to_string(),
            processed_container: "processed-images".to_string(),
            max_concurrent_blobs: 4,
            detector: None,
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;
        if self.max_concurrent_blobs == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_blobs must be at least 1".into(),
            ));
        }
        if self.raw_container == self.processed_container {
            return Err(ConfigError::Invalid(format!(
                "raw and processed containers must differ, both are {:?}",
                self.raw_container
            )));
        }
        Ok(())
    }
}
