//! TrackerPipeline for combining detection with tracking.

use crate::tracker::{McSort, TrackerConfig, TrackingRecord};

use super::frame_source::Frame;
use super::{DetectionSource, IntoDetections};

/// A combined tracker that bundles detection inference with the MCSORT engine.
///
/// Frames must be fed in sequence order: each call advances the engine by
/// one frame and predictions depend on the previous frame's state.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: McSort,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Self {
        Self {
            detector,
            tracker: McSort::new(config),
        }
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, TrackerConfig::default())
    }

    /// Process a single frame and return the confirmed tracks' records.
    ///
    /// # Arguments
    /// * `input` - RGB8 image bytes
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<TrackingRecord>, D::Error> {
        let detections = self.detector.detect(input, width, height)?;
        Ok(self.process_detections(detections))
    }

    /// Process a decoded frame from a frame source.
    pub fn process(&mut self, frame: &Frame) -> Result<Vec<TrackingRecord>, D::Error> {
        self.process_frame(&frame.data, frame.width, frame.height)
    }

    /// Advance the tracker with detections obtained elsewhere, bypassing the
    /// detector.
    pub fn process_detections<I: IntoDetections>(&mut self, detections: I) -> Vec<TrackingRecord> {
        self.tracker.step(detections.into_detections())
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &McSort {
        &self.tracker
    }

    /// Release the detector, dropping the tracker state.
    pub fn into_detector(self) -> D {
        self.detector
    }
}
