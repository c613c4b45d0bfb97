//! Multi-class SORT (MCSORT) multi-object tracking.
//!
//! The [`tracker`] module holds the engine: a constant-velocity Kalman filter
//! per track, IoU association solved per class label, and the
//! Tentative/Confirmed/Deleted track lifecycle. The [`integration`] module
//! connects a detector and an image directory to the engine and writes the
//! resulting records.

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::{DetectorError, PipelineError, TrackError};
pub use integration::{DetectionSource, SequenceRunner, TrackerPipeline};
pub use tracker::{Detection, McSort, Rect, TrackState, TrackerConfig, TrackingRecord};
