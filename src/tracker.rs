mod config;
mod kalman_filter;
mod matching;
mod mc_sort;
mod rect;
mod track;
mod track_state;

pub use config::{MotionNoise, TrackerConfig};
pub use kalman_filter::KalmanFilter;
pub use matching::{
    AssignmentResult, Detection, associate_by_label, iou_assignment, iou_distance,
    linear_assignment,
};
pub use mc_sort::{McSort, TrackingRecord};
pub use rect::{Rect, iou_batch};
pub use track::Track;
pub use track_state::TrackState;
