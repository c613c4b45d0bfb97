//! Constant-velocity Kalman filter for bounding box tracking using ndarray and a
//! nalgebra-based 4x4 inverse.
//!
//! State is `[cx, cy, area, aspect, vcx, vcy, varea]`; the aspect ratio is
//! modelled as constant. Measurements are `[cx, cy, area, aspect]`.

use ndarray::{Array1, Array2};

use crate::tracker::config::MotionNoise;

const NDIM_X: usize = 7;
const NDIM_Z: usize = 4;
/// Index of the area component and of its velocity in the state vector.
const AREA: usize = 2;
const AREA_VELOCITY: usize = 6;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    process_cov: Array2<f64>,
    measurement_cov: Array2<f64>,
    initial_cov: Array2<f64>,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(&MotionNoise::default())
    }
}

impl KalmanFilter {
    pub fn new(noise: &MotionNoise) -> Self {
        // Position components 0..3 advance by their velocities 4..7.
        let mut motion_mat = Array2::eye(NDIM_X);
        for i in 0..3 {
            motion_mat[[i, NDIM_Z + i]] = 1.0;
        }

        let mut update_mat = Array2::zeros((NDIM_Z, NDIM_X));
        for i in 0..NDIM_Z {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            process_cov: diagonal(&noise.process),
            measurement_cov: diagonal(&noise.measurement),
            initial_cov: diagonal(&noise.initial),
        }
    }

    /// Create a track state from an unassociated measurement.
    pub fn initiate(&self, measurement: [f64; 4]) -> (Array1<f64>, Array2<f64>) {
        let mut mean = Array1::zeros(NDIM_X);
        for i in 0..NDIM_Z {
            mean[i] = measurement[i];
        }
        (mean, self.initial_cov.clone())
    }

    /// Advance the state one step.
    ///
    /// If the area velocity would drive the area to zero or below, it is
    /// dropped before the step so the prediction stays renderable.
    pub fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let mut mean = mean.clone();
        if mean[AREA] + mean[AREA_VELOCITY] <= 0.0 {
            mean[AREA_VELOCITY] = 0.0;
        }

        let new_mean = self.motion_mat.dot(&mean);
        let new_covariance =
            self.motion_mat.dot(covariance).dot(&self.motion_mat.t()) + &self.process_cov;

        (new_mean, new_covariance)
    }

    /// Project the state into measurement space.
    pub fn project(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + &self.measurement_cov;

        (mean_proj, covariance_proj)
    }

    /// Run the correction step.
    ///
    /// Returns `None` when the innovation covariance cannot be inverted; the
    /// caller keeps its predicted state in that case.
    pub fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 4],
    ) -> Option<(Array1<f64>, Array2<f64>)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let measurement_arr = Array1::from_vec(measurement.to_vec());
        let innovation = measurement_arr - projected_mean;

        // K = P * H^T * S^-1, H is [I 0] so P * H^T is the first 4 columns of P.
        let s_inv = invert_4x4(&projected_cov)?;

        let pht = covariance.dot(&self.update_mat.t()); // 7x4
        let kalman_gain = pht.dot(&s_inv); // 7x4

        let new_mean = mean + &kalman_gain.dot(&innovation);
        let new_covariance = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());

        Some((new_mean, new_covariance))
    }
}

fn diagonal(values: &[f64]) -> Array2<f64> {
    Array2::from_diag(&Array1::from_vec(values.to_vec()))
}

/// Invert a 4x4 matrix with nalgebra (pure Rust, no BLAS/LAPACK).
fn invert_4x4(m: &Array2<f64>) -> Option<Array2<f64>> {
    let mut nm = nalgebra::Matrix4::zeros();
    for i in 0..4 {
        for j in 0..4 {
            nm[(i, j)] = m[[i, j]];
        }
    }
    let inv = nm.try_inverse()?;
    let mut res = Array2::zeros((4, 4));
    for i in 0..4 {
        for j in 0..4 {
            res[[i, j]] = inv[(i, j)];
        }
    }
    Some(res)
}
