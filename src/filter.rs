//! Constant-acceleration Kalman filter for a single 3D point target.
//!
//! State is the 9-vector `[px, py, pz, vx, vy, vz, ax, ay, az]`; the
//! measurement is the 3D position. All matrices are fixed-size, allocated
//! once per filter.

use nalgebra::{SMatrix, SVector, Vector3};

/// State dimension: position, velocity, acceleration per axis.
pub const DIM_X: usize = 9;
/// Measurement dimension: position only.
pub const DIM_Z: usize = 3;

/// Full filter state vector (position, velocity, acceleration).
pub type StateVector = SVector<f64, DIM_X>;
type StateMatrix = SMatrix<f64, DIM_X, DIM_X>;
type MeasurementMatrix = SMatrix<f64, DIM_Z, DIM_X>;
type MeasurementCovariance = SMatrix<f64, DIM_Z, DIM_Z>;

/// Kalman filter with a constant-acceleration motion model.
///
/// Uses a unit time step: over one frame, position integrates velocity plus
/// half the acceleration, and velocity integrates acceleration.
#[derive(Clone, Debug)]
pub struct ConstantAccelerationKalman {
    /// State vector (9x1)
    pub x: StateVector,
    /// State covariance matrix (9x9)
    pub p: StateMatrix,
    /// State transition matrix (9x9)
    f: StateMatrix,
    /// Measurement matrix (3x9)
    h: MeasurementMatrix,
    /// Process noise covariance (9x9)
    q: StateMatrix,
    /// Measurement noise covariance (3x3)
    r: MeasurementCovariance,
}

impl ConstantAccelerationKalman {
    /// Create a filter seeded with an initial kinematic state.
    ///
    /// # Arguments
    /// * `position`, `velocity`, `acceleration` - initial state per axis
    /// * `measurement_noise` - scale applied to the identity `R`
    /// * `process_noise` - scale applied to the identity `Q`
    /// * `covariance` - scale applied to the identity initial `P`
    pub fn new(
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        acceleration: &Vector3<f64>,
        measurement_noise: f64,
        process_noise: f64,
        covariance: f64,
    ) -> Self {
        // Unit-step constant-acceleration integrator:
        // p' = p + v + a/2, v' = v + a, a' = a
        let mut f = StateMatrix::identity();
        for axis in 0..3 {
            f[(axis, axis + 3)] = 1.0;
            f[(axis, axis + 6)] = 0.5;
            f[(axis + 3, axis + 6)] = 1.0;
        }

        // Observe position only
        let mut h = MeasurementMatrix::zeros();
        for axis in 0..3 {
            h[(axis, axis)] = 1.0;
        }

        let mut x = StateVector::zeros();
        x.fixed_rows_mut::<3>(0).copy_from(position);
        x.fixed_rows_mut::<3>(3).copy_from(velocity);
        x.fixed_rows_mut::<3>(6).copy_from(acceleration);

        Self {
            x,
            p: StateMatrix::identity() * covariance,
            f,
            h,
            q: StateMatrix::identity() * process_noise,
            r: MeasurementCovariance::identity() * measurement_noise,
        }
    }

    /// Predict the next state.
    ///
    /// `x = F @ x`; `P = F @ P @ F.T + Q`
    pub fn predict(&mut self) {
        self.x = self.f * self.x;
        self.p = self.f * self.p * self.f.transpose() + self.q;
    }

    /// Update the state with a position measurement.
    ///
    /// `y = z - H @ x`; `S = H @ P @ H.T + R`; `K = P @ H.T @ S^-1`;
    /// `x = x + K @ y`; `P = (I - K @ H) @ P`
    ///
    /// # Panics
    /// Panics if the innovation covariance is singular; with a positive
    /// measurement noise and finite state this cannot occur.
    pub fn update(&mut self, z: &Vector3<f64>) {
        let y = z - self.h * self.x;
        let s = self.h * self.p * self.h.transpose() + self.r;
        let s_inv = s
            .try_inverse()
            .expect("innovation covariance singular despite positive measurement noise");
        let k = self.p * self.h.transpose() * s_inv;

        self.x += k * y;
        self.p = (StateMatrix::identity() - k * self.h) * self.p;
    }

    /// Position components of the state.
    #[inline]
    pub fn position(&self) -> Vector3<f64> {
        self.x.fixed_rows::<3>(0).into()
    }

    /// Velocity components of the state.
    #[inline]
    pub fn velocity(&self) -> Vector3<f64> {
        self.x.fixed_rows::<3>(3).into()
    }

    /// Acceleration components of the state.
    #[inline]
    pub fn acceleration(&self) -> Vector3<f64> {
        self.x.fixed_rows::<3>(6).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_filter(position: Vector3<f64>) -> ConstantAccelerationKalman {
        ConstantAccelerationKalman::new(
            &position,
            &Vector3::zeros(),
            &Vector3::zeros(),
            1.0,
            0.01,
            10.0,
        )
    }

    #[test]
    fn test_initial_state() {
        let kf = ConstantAccelerationKalman::new(
            &Vector3::new(1.0, 2.0, 3.0),
            &Vector3::new(0.1, 0.2, 0.3),
            &Vector3::new(0.01, 0.02, 0.03),
            1.0,
            0.01,
            10.0,
        );

        assert_relative_eq!(kf.position().x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(kf.velocity().y, 0.2, epsilon = 1e-12);
        assert_relative_eq!(kf.acceleration().z, 0.03, epsilon = 1e-12);
        assert_relative_eq!(kf.p[(0, 0)], 10.0, epsilon = 1e-12);
        assert_relative_eq!(kf.p[(0, 1)], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_predict_integrates_velocity_and_acceleration() {
        let mut kf = ConstantAccelerationKalman::new(
            &Vector3::new(0.0, 0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Vector3::new(0.0, 2.0, 0.0),
            1.0,
            0.01,
            10.0,
        );

        kf.predict();

        // p' = p + v + a/2
        assert_relative_eq!(kf.position().x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(kf.position().y, 1.0, epsilon = 1e-12);
        // v' = v + a
        assert_relative_eq!(kf.velocity().x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(kf.velocity().y, 2.0, epsilon = 1e-12);
        // a' = a
        assert_relative_eq!(kf.acceleration().y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_predict_grows_covariance() {
        let mut kf = make_filter(Vector3::zeros());
        let trace_before: f64 = kf.p.trace();

        kf.predict();

        assert!(kf.p.trace() > trace_before);
    }

    #[test]
    fn test_update_moves_state_toward_measurement() {
        let mut kf = make_filter(Vector3::zeros());

        kf.update(&Vector3::new(10.0, 0.0, 0.0));

        // With P0 = 10*I and R = I, the gain is 10/11
        assert!(kf.position().x > 5.0);
        assert!(kf.position().x < 10.0);
        assert_relative_eq!(kf.position().y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_update_shrinks_position_covariance() {
        let mut kf = make_filter(Vector3::zeros());
        let var_before = kf.p[(0, 0)];

        kf.update(&Vector3::new(1.0, 1.0, 1.0));

        assert!(kf.p[(0, 0)] < var_before);
    }

    #[test]
    fn test_repeated_updates_converge_on_stationary_target() {
        let mut kf = make_filter(Vector3::new(5.0, -3.0, 2.0));
        let z = Vector3::new(5.0, -3.0, 2.0);

        for _ in 0..20 {
            kf.predict();
            kf.update(&z);
        }

        assert_relative_eq!(kf.position().x, 5.0, epsilon = 1e-6);
        assert_relative_eq!(kf.position().y, -3.0, epsilon = 1e-6);
        assert_relative_eq!(kf.position().z, 2.0, epsilon = 1e-6);
        // A target measured in the same place has no sustained velocity
        assert!(kf.velocity().norm() < 1e-3);
    }
}
