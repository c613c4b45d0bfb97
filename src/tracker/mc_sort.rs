//! Multi-class SORT tracker.

use crate::error::TrackError;
use crate::tracker::config::TrackerConfig;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::rect::Rect;
use crate::tracker::track::{Lifecycle, Track};

/// One reported track position for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRecord {
    /// 0-based index of the frame the record belongs to
    pub frame_index: u32,
    pub label: String,
    pub track_id: u64,
    /// Bounding box in TLWH format
    pub bbox: Rect,
}

/// Multi-class SORT engine.
///
/// One instance tracks one sequence. Tracks only ever match detections of
/// their own label, and IDs are allocated from a per-instance counter that
/// starts at 1 and is never rewound.
pub struct McSort {
    tracks: Vec<Track>,
    next_id: u64,
    frame_index: u32,
    config: TrackerConfig,
    lifecycle: Lifecycle,
    kalman_filter: KalmanFilter,
}

impl Default for McSort {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl McSort {
    pub fn new(config: TrackerConfig) -> Self {
        let lifecycle = Lifecycle {
            min_hits: config.min_hits,
            max_age: config.max_age,
            tentative_max_age: config.tentative_max_age,
        };
        Self {
            tracks: Vec::new(),
            next_id: 1,
            frame_index: 0,
            kalman_filter: KalmanFilter::new(&config.noise),
            lifecycle,
            config,
        }
    }

    /// Like [`McSort::new`], but rejects an out-of-range configuration.
    pub fn try_new(config: TrackerConfig) -> Result<Self, TrackError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Active (non-deleted) tracks, in creation order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Index the next call to [`McSort::step`] will tag its records with.
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// ID the next spawned track will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Process one frame of detections and return the records of every
    /// confirmed track.
    pub fn step(&mut self, detections: Vec<Detection>) -> Vec<TrackingRecord> {
        let frame_index = self.frame_index;
        self.frame_index += 1;

        // Step 1: Drop detections the filter cannot take
        let detections: Vec<Detection> = detections
            .into_iter()
            .filter(|det| {
                let valid = det.bbox.is_valid();
                if !valid {
                    tracing::debug!(
                        frame_index,
                        label = %det.label,
                        bbox = ?det.bbox,
                        "dropping detection with invalid geometry"
                    );
                }
                valid
            })
            .collect();

        // Step 2: Predict every active track
        let predicted: Vec<Rect> = self
            .tracks
            .iter_mut()
            .map(|track| track.predict(&self.kalman_filter))
            .collect();

        // Step 3: Associate within each label
        let track_labels: Vec<&str> = self.tracks.iter().map(|t| t.label.as_str()).collect();
        let det_labels: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();

        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::associate_by_label(
            &track_labels,
            &predicted,
            &det_labels,
            &det_rects,
            self.config.iou_threshold,
        );

        // Step 4: Update matched tracks, age the rest
        for (itrack, idet) in matches {
            let track = &mut self.tracks[itrack];
            if let Err(err) = track.update(&detections[idet], &self.kalman_filter, &self.lifecycle)
            {
                tracing::warn!(track_id = track.track_id, "skipping track update: {err}");
                track.mark_missed(&self.lifecycle);
            }
        }
        for itrack in unmatched_tracks {
            self.tracks[itrack].mark_missed(&self.lifecycle);
        }

        self.tracks.retain(|track| {
            if track.is_deleted() {
                tracing::debug!(
                    frame_index,
                    track_id = track.track_id,
                    label = %track.label,
                    "track deleted"
                );
            }
            !track.is_deleted()
        });

        // Step 5: Init new tracks
        for idet in unmatched_detections {
            let det = &detections[idet];
            match Track::new(self.next_id, det, &self.kalman_filter, &self.lifecycle) {
                Ok(track) => {
                    tracing::debug!(
                        frame_index,
                        track_id = track.track_id,
                        label = %track.label,
                        "track spawned"
                    );
                    self.next_id += 1;
                    self.tracks.push(track);
                }
                Err(err) => tracing::warn!(frame_index, "not spawning track: {err}"),
            }
        }

        // Step 6: Report confirmed tracks
        self.tracks
            .iter()
            .filter(|t| t.is_confirmed())
            .map(|t| TrackingRecord {
                frame_index,
                label: t.label.clone(),
                track_id: t.track_id,
                bbox: t.rect(),
            })
            .collect()
    }
}
