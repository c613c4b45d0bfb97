//! Tracker tuning parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, TrackError};

/// Noise parameters of the constant-velocity motion model.
///
/// Every array is the diagonal of the corresponding covariance matrix.
/// Measurement order is `(cx, cy, area, aspect)`; state order appends the
/// velocities `(vcx, vcy, varea)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionNoise {
    /// Measurement noise `R`.
    pub measurement: [f64; 4],
    /// Process noise `Q` added on every prediction.
    pub process: [f64; 7],
    /// Covariance of a freshly initiated track. Velocities are unobserved,
    /// hence the large trailing entries.
    pub initial: [f64; 7],
}

impl Default for MotionNoise {
    fn default() -> Self {
        Self {
            measurement: [1.0, 1.0, 10.0, 10.0],
            process: [1.0, 1.0, 1.0, 1.0, 0.01, 0.01, 1e-4],
            initial: [10.0, 10.0, 10.0, 10.0, 1e4, 1e4, 1e4],
        }
    }
}

/// Configuration for the [`McSort`](crate::McSort) engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum IoU for a solved track/detection pair to count as a match.
    pub iou_threshold: f32,
    /// Consecutive matches needed before a track is confirmed and reported.
    pub min_hits: u32,
    /// Misses a confirmed track survives; it is deleted once
    /// `time_since_update` exceeds this.
    pub max_age: u32,
    /// Same horizon for tentative tracks. The default of 0 deletes an
    /// unconfirmed track on its first miss.
    pub tentative_max_age: u32,
    pub noise: MotionNoise,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            min_hits: 3,
            max_age: 3,
            tentative_max_age: 0,
            noise: MotionNoise::default(),
        }
    }
}

impl TrackerConfig {
    /// Check that every parameter is in its usable range.
    pub fn validate(&self) -> Result<(), TrackError> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(TrackError::invalid_config(
                "iou_threshold",
                format!("must be in [0, 1], got {}", self.iou_threshold),
            ));
        }
        if self.min_hits == 0 {
            return Err(TrackError::invalid_config("min_hits", "must be > 0"));
        }
        if !all_positive(&self.noise.measurement) {
            return Err(TrackError::invalid_config(
                "noise.measurement",
                "entries must be finite and > 0",
            ));
        }
        if !all_positive(&self.noise.process) {
            return Err(TrackError::invalid_config(
                "noise.process",
                "entries must be finite and > 0",
            ));
        }
        if !all_positive(&self.noise.initial) {
            return Err(TrackError::invalid_config(
                "noise.initial",
                "entries must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing fields take their
    /// defaults; the result is validated.
    pub fn from_json(path: &Path) -> Result<Self, PipelineError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| PipelineError::FileOpenFailure {
                path: path.to_path_buf(),
                source,
            })?;
        let config: TrackerConfig = serde_json::from_str(&contents)
            .map_err(|e| TrackError::invalid_config("(file)", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn all_positive(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let config = TrackerConfig {
            iou_threshold: 1.5,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TrackError::InvalidConfig {
                field: "iou_threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_zero_min_hits() {
        let config = TrackerConfig {
            min_hits: 0,
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_noise() {
        let mut config = TrackerConfig::default();
        config.noise.measurement[2] = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{ "max_age": 7, "iou_threshold": 0.5 }"#).unwrap();
        assert_eq!(config.max_age, 7);
        assert_eq!(config.iou_threshold, 0.5);
        assert_eq!(config.min_hits, 3);
        assert_eq!(config.noise, MotionNoise::default());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, r#"{ "min_hits": 1 }"#).unwrap();

        let config = TrackerConfig::from_json(&path).unwrap();
        assert_eq!(config.min_hits, 1);
    }

    #[test]
    fn test_from_json_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = TrackerConfig::from_json(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(PipelineError::FileOpenFailure { .. })));
    }

    #[test]
    fn test_from_json_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, r#"{ "min_hits": 0 }"#).unwrap();
        assert!(matches!(
            TrackerConfig::from_json(&path),
            Err(PipelineError::Config(TrackError::InvalidConfig { .. }))
        ));
    }
}
