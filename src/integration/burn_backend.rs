//! Burn inference backend for object detection.
//!
//! This module provides a `BurnDetector` that implements `DetectionSource`
//! for running object detection models built with the Burn framework.
//!
//! # Example
//!
//! ```ignore
//! use mcsort_rs::integration::{BurnDetector, BurnModel, RawDetection};
//! use burn::backend::NdArray;
//!
//! // Implement BurnModel for your detection model
//! struct MyYoloModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MyYoloModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<RawDetection> {
//!         // Run inference
//!     }
//! }
//!
//! let model = MyYoloModel::load("model.bin");
//! let detector = BurnDetector::new(model, Default::default())
//!     .with_labels(["person", "car", "bicycle"]);
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use thiserror::Error;

use super::{DetectionBuilder, DetectionSource};
use crate::tracker::Detection;

/// Label given to detections the model reports without a class.
const UNLABELLED: &str = "object";

/// Error type for Burn detection failures.
#[derive(Debug, Clone, Error)]
pub enum BurnDetectorError {
    /// Input image has invalid dimensions.
    #[error("Invalid input dimensions: expected {expected:?}, got {got:?}")]
    InvalidInputDimensions {
        expected: (u32, u32, u32),
        got: (u32, u32, u32),
    },
    /// Preprocessing failed.
    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),
}

/// Raw detection output from the model before NMS.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Bounding box: [x1, y1, x2, y2] or [cx, cy, w, h] depending on model
    pub bbox: [f32; 4],
    /// Confidence score
    pub score: f32,
    /// Class ID, resolved to a label through the detector's label table
    pub class_id: Option<usize>,
}

/// Trait for Burn-based detection models.
///
/// Implement this trait for your specific model architecture.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Run forward pass on the input tensor of shape [batch, channels, height, width].
    fn forward(&self, input: Tensor<B, 4>) -> Vec<RawDetection>;

    /// Get the expected input size (channels, height, width).
    fn input_size(&self) -> (u32, u32, u32) {
        (3, 640, 640) // Default YOLO input size
    }

    /// Whether bbox output is in XYWH format (vs TLBR).
    fn bbox_is_xywh(&self) -> bool {
        true // Most YOLO variants use XYWH
    }
}

/// Burn-based object detector implementing `DetectionSource`.
pub struct BurnDetector<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
    conf_threshold: f32,
    labels: Vec<String>,
}

impl<B: Backend, M: BurnModel<B>> BurnDetector<B, M> {
    /// Create a new Burn detector with the given model and device.
    pub fn new(model: M, device: B::Device) -> Self {
        Self {
            model,
            device,
            conf_threshold: 0.25,
            labels: Vec::new(),
        }
    }

    /// Set the confidence threshold for filtering detections.
    pub fn with_conf_threshold(mut self, threshold: f32) -> Self {
        self.conf_threshold = threshold;
        self
    }

    /// Set the class names, indexed by class ID. IDs outside the table are
    /// labelled with their number.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Preprocess RGB8 image bytes to a Burn tensor.
    pub fn preprocess(
        &self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Tensor<B, 4>, BurnDetectorError> {
        let (channels, target_h, target_w) = self.model.input_size();
        let expected_len = (width * height * channels) as usize;

        if input.len() != expected_len {
            return Err(BurnDetectorError::InvalidInputDimensions {
                expected: (channels, height, width),
                got: (channels, height, input.len() as u32 / (height * channels).max(1)),
            });
        }

        if height != target_h || width != target_w {
            return Err(BurnDetectorError::PreprocessingError(format!(
                "Input size {}x{} doesn't match model size {}x{}. Resize not implemented.",
                width, height, target_w, target_h
            )));
        }

        // HWC bytes to normalized CHW floats.
        let plane = (width * height) as usize;
        let mut data = vec![0.0f32; input.len()];
        for (i, &value) in input.iter().enumerate() {
            let pixel = i / channels as usize;
            let channel = i % channels as usize;
            data[channel * plane + pixel] = value as f32 / 255.0;
        }

        let tensor = Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([
            1,
            channels as usize,
            height as usize,
            width as usize,
        ]);

        Ok(tensor)
    }

    fn label_for(&self, class_id: Option<usize>) -> String {
        match class_id {
            Some(id) => self
                .labels
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.to_string()),
            None => UNLABELLED.to_string(),
        }
    }

    /// Convert raw model outputs to Detection objects.
    fn postprocess(&self, raw_detections: Vec<RawDetection>) -> Vec<Detection> {
        raw_detections
            .into_iter()
            .filter(|d| d.score >= self.conf_threshold)
            .map(|d| {
                let builder = DetectionBuilder::new()
                    .label(self.label_for(d.class_id))
                    .score(d.score);
                if self.model.bbox_is_xywh() {
                    builder
                        .xywh(d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3])
                        .build()
                } else {
                    builder
                        .tlbr(d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3])
                        .build()
                }
            })
            .collect()
    }
}

impl<B: Backend, M: BurnModel<B>> DetectionSource for BurnDetector<B, M> {
    type Error = BurnDetectorError;

    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error> {
        let tensor = self.preprocess(input, width, height)?;
        let raw_detections = self.model.forward(tensor);
        Ok(self.postprocess(raw_detections))
    }
}
