//! Integration module for connecting object detection backends with the tracker.
//!
//! This module provides the detector trait, a pipeline pairing a detector with
//! an [`McSort`](crate::McSort) engine, and the file-level plumbing around it:
//! ordered image directories, record files and a runner for whole sequences.

mod builder;
mod detector;
mod frame_source;
mod pipeline;
mod runner;
mod sink;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use frame_source::{Frame, ImageDirectory};
pub use pipeline::TrackerPipeline;
pub use runner::{RunSummary, SequenceOutcome, SequenceRunner, SequenceStats, read_sequence_list};
pub use sink::RecordWriter;

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnDetector, BurnDetectorError, BurnModel, RawDetection};
