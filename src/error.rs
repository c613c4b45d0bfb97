//! Error types for the tracker core and the frame pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error reported by a detector.
pub type DetectorError = Box<dyn std::error::Error + Send + Sync>;

/// Conditions raised by the tracking core.
///
/// None of these are fatal: the engine filters invalid detections before
/// association and skips motion updates that would fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("invalid geometry: width {width}, height {height}")]
    InvalidGeometry { width: f32, height: f32 },
    #[error("invalid value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl TrackError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised around the core: reading frames, writing records and
/// walking sequence lists.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not open directory {0}")]
    DirectoryNotFound(PathBuf),
    #[error("could not open file {path}: {source}")]
    FileOpenFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("output file {0} already exists; don't overwrite")]
    OutputAlreadyExists(PathBuf),
    #[error("could not decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("detector error: {0}")]
    Detector(#[source] DetectorError),
    #[error(transparent)]
    Config(#[from] TrackError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
