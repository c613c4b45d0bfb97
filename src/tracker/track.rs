//! Single object track for multi-class tracking.

use ndarray::{Array1, Array2};

use crate::error::TrackError;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Lifecycle thresholds a track checks its counters against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lifecycle {
    pub min_hits: u32,
    pub max_age: u32,
    pub tentative_max_age: u32,
}

/// Single object track.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique track identifier
    pub track_id: u64,
    /// Class label, fixed at creation
    pub label: String,
    /// Current track state
    pub state: TrackState,
    /// Confidence of the last matched detection
    pub score: f32,
    /// Consecutive frames with a matched detection
    pub hits: u32,
    /// Frames since creation
    pub age: u32,
    /// Frames since the last matched detection
    pub time_since_update: u32,
    /// Kalman filter state mean (7-dim)
    pub mean: Array1<f64>,
    /// Kalman filter state covariance (7x7)
    pub covariance: Array2<f64>,
}

impl Track {
    /// Start a new track from an unmatched detection.
    ///
    /// The creating detection counts as the first hit, so with `min_hits <= 1`
    /// the track is confirmed straight away.
    pub(crate) fn new(
        track_id: u64,
        detection: &Detection,
        kalman_filter: &KalmanFilter,
        lifecycle: &Lifecycle,
    ) -> Result<Self, TrackError> {
        let measurement = measure(&detection.bbox)?;
        let (mean, covariance) = kalman_filter.initiate(measurement);
        let state = if lifecycle.min_hits <= 1 {
            TrackState::Confirmed
        } else {
            TrackState::Tentative
        };

        Ok(Self {
            track_id,
            label: detection.label.clone(),
            state,
            score: detection.score,
            hits: 1,
            age: 0,
            time_since_update: 0,
            mean,
            covariance,
        })
    }

    /// Get the current bounding box in TLWH format.
    pub fn rect(&self) -> Rect {
        Rect::from_z([self.mean[0], self.mean[1], self.mean[2], self.mean[3]])
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    pub fn is_deleted(&self) -> bool {
        self.state == TrackState::Deleted
    }

    /// Advance the motion model one frame and return the predicted box.
    pub fn predict(&mut self, kalman_filter: &KalmanFilter) -> Rect {
        if !self.is_deleted() {
            let (mean, covariance) = kalman_filter.predict(&self.mean, &self.covariance);
            self.mean = mean;
            self.covariance = covariance;
            self.age += 1;
        }
        self.rect()
    }

    /// Correct the track with a matched detection.
    pub(crate) fn update(
        &mut self,
        detection: &Detection,
        kalman_filter: &KalmanFilter,
        lifecycle: &Lifecycle,
    ) -> Result<(), TrackError> {
        if self.is_deleted() {
            return Ok(());
        }
        let measurement = measure(&detection.bbox)?;

        if let Some((mean, covariance)) =
            kalman_filter.update(&self.mean, &self.covariance, measurement)
        {
            self.mean = mean;
            self.covariance = covariance;
        } else {
            tracing::warn!(
                track_id = self.track_id,
                "singular innovation covariance, keeping prediction"
            );
        }

        self.hits += 1;
        self.time_since_update = 0;
        self.score = detection.score;

        if self.state == TrackState::Tentative && self.hits >= lifecycle.min_hits {
            self.state = TrackState::Confirmed;
            tracing::debug!(track_id = self.track_id, label = %self.label, "track confirmed");
        }
        Ok(())
    }

    /// Record a frame without a matching detection; the prediction stands.
    pub(crate) fn mark_missed(&mut self, lifecycle: &Lifecycle) {
        let horizon = match self.state {
            TrackState::Tentative => lifecycle.tentative_max_age,
            TrackState::Confirmed => lifecycle.max_age,
            TrackState::Deleted => return,
        };

        self.hits = 0;
        self.time_since_update += 1;
        if self.time_since_update > horizon {
            self.mark_deleted();
        }
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.state = TrackState::Deleted;
    }
}

fn measure(bbox: &Rect) -> Result<[f64; 4], TrackError> {
    if !bbox.is_valid() {
        return Err(TrackError::InvalidGeometry {
            width: bbox.width,
            height: bbox.height,
        });
    }
    Ok(bbox.to_z())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle() -> Lifecycle {
        Lifecycle {
            min_hits: 3,
            max_age: 2,
            tentative_max_age: 0,
        }
    }

    fn det(x: f32, y: f32) -> Detection {
        Detection::new("car", Rect::new(x, y, 20.0, 20.0), 0.9)
    }

    #[test]
    fn test_new_track_is_tentative() {
        let kf = KalmanFilter::default();
        let track = Track::new(1, &det(10.0, 10.0), &kf, &lifecycle()).unwrap();
        assert_eq!(track.state, TrackState::Tentative);
        assert_eq!(track.hits, 1);
        assert_eq!(track.label, "car");
        let rect = track.rect();
        assert!((rect.x - 10.0).abs() < 1e-3);
        assert!((rect.width - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_new_track_rejects_degenerate_box() {
        let kf = KalmanFilter::default();
        let bad = Detection::new("car", Rect::new(0.0, 0.0, 0.0, 5.0), 0.9);
        assert!(matches!(
            Track::new(1, &bad, &kf, &lifecycle()),
            Err(TrackError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_confirms_after_min_hits() {
        let kf = KalmanFilter::default();
        let lc = lifecycle();
        let mut track = Track::new(1, &det(10.0, 10.0), &kf, &lc).unwrap();

        track.predict(&kf);
        track.update(&det(10.0, 10.0), &kf, &lc).unwrap();
        assert_eq!(track.state, TrackState::Tentative);

        track.predict(&kf);
        track.update(&det(10.0, 10.0), &kf, &lc).unwrap();
        assert_eq!(track.state, TrackState::Confirmed);
        assert_eq!(track.hits, 3);
        assert_eq!(track.age, 2);
    }

    #[test]
    fn test_tentative_dies_on_first_miss() {
        let kf = KalmanFilter::default();
        let lc = lifecycle();
        let mut track = Track::new(1, &det(10.0, 10.0), &kf, &lc).unwrap();
        track.predict(&kf);
        track.mark_missed(&lc);
        assert!(track.is_deleted());
    }

    #[test]
    fn test_confirmed_survives_up_to_max_age() {
        let kf = KalmanFilter::default();
        let lc = Lifecycle {
            min_hits: 1,
            ..lifecycle()
        };
        let mut track = Track::new(1, &det(10.0, 10.0), &kf, &lc).unwrap();
        assert!(track.is_confirmed());

        for _ in 0..lc.max_age {
            track.predict(&kf);
            track.mark_missed(&lc);
            assert!(track.is_confirmed());
        }
        track.predict(&kf);
        track.mark_missed(&lc);
        assert!(track.is_deleted());
    }

    #[test]
    fn test_miss_ages_and_grows_uncertainty() {
        let kf = KalmanFilter::default();
        let lc = Lifecycle {
            min_hits: 1,
            ..lifecycle()
        };
        let mut track = Track::new(1, &det(10.0, 10.0), &kf, &lc).unwrap();

        track.predict(&kf);
        track.mark_missed(&lc);
        let first = track.covariance[[0, 0]];
        assert_eq!(track.time_since_update, 1);

        track.predict(&kf);
        track.mark_missed(&lc);
        assert!(track.covariance[[0, 0]] >= first);
        assert_eq!(track.time_since_update, 2);
        assert_eq!(track.hits, 0);
    }

    #[test]
    fn test_deleted_is_terminal() {
        let kf = KalmanFilter::default();
        let lc = lifecycle();
        let mut track = Track::new(1, &det(10.0, 10.0), &kf, &lc).unwrap();
        track.mark_deleted();
        track.update(&det(10.0, 10.0), &kf, &lc).unwrap();
        track.mark_missed(&lc);
        assert!(track.is_deleted());
        assert_eq!(track.hits, 1);
    }
}
