//! Track state for a single identified target.

use std::collections::VecDeque;
use std::fmt;

use nalgebra::Vector3;

use crate::filter::{ConstantAccelerationKalman, StateVector};
use crate::tracker::TrackSettings;

/// Number of trailing measured positions kept for smoothing.
const HISTORY_LEN: usize = 5;

/// Lifecycle stage of a track.
///
/// Tracks are born `Initialized` and are promoted to `Confirmed` once they
/// have accumulated enough updates; only confirmed tracks are reported.
/// The transition is one-way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackStage {
    Initialized,
    Confirmed,
}

impl fmt::Display for TrackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackStage::Initialized => write!(f, "INITIALIZED"),
            TrackStage::Confirmed => write!(f, "CONFIRMED"),
        }
    }
}

/// A persistent identified target with filtered state and lifecycle
/// counters. Owned and mutated exclusively by its [`Tracker`].
///
/// [`Tracker`]: crate::Tracker
#[derive(Clone, Debug)]
pub struct Track {
    /// Identifier, unique within one tracker run; never reused.
    pub id: u64,

    /// Lifecycle stage.
    pub stage: TrackStage,

    /// Frames since creation; incremented on every predict.
    pub age: u32,

    /// Total successful updates; starts at 1 on creation.
    pub hits: u32,

    /// Consecutive frames with a successful update.
    pub hit_streak: u32,

    /// Frames since the last successful update, as counted by the tracker
    /// for unassigned tracks.
    pub time_since_update: u32,

    /// Frames since the last update, as counted by predict.
    pub consecutive_misses: u32,

    /// The Kalman filter maintaining this target's state.
    kf: ConstantAccelerationKalman,

    /// Trailing measured positions, newest last.
    position_history: VecDeque<Vector3<f64>>,
}

impl Track {
    /// Create a track from an unassigned detection.
    pub fn new(
        id: u64,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        acceleration: Vector3<f64>,
        settings: &TrackSettings,
    ) -> Self {
        let kf = ConstantAccelerationKalman::new(
            &position,
            &velocity,
            &acceleration,
            settings.measurement_noise,
            settings.process_noise,
            settings.covariance,
        );

        let mut position_history = VecDeque::with_capacity(HISTORY_LEN);
        position_history.push_back(position);

        Self {
            id,
            stage: TrackStage::Initialized,
            age: 0,
            hits: 1,
            hit_streak: 0,
            time_since_update: 0,
            consecutive_misses: 0,
            kf,
            position_history,
        }
    }

    /// Advance the filter one frame and age the track.
    ///
    /// `time_since_update` is deliberately not touched here; the tracker
    /// increments it only for tracks left unassigned after association.
    ///
    /// # Returns
    /// The predicted full state vector.
    pub fn predict(&mut self) -> StateVector {
        self.kf.predict();
        self.age += 1;
        self.consecutive_misses += 1;
        self.kf.x
    }

    /// Fold a matched measurement into the filter and reset miss counters.
    pub fn update(&mut self, measurement: &Vector3<f64>) {
        self.kf.update(measurement);
        self.time_since_update = 0;
        self.hits += 1;
        self.hit_streak += 1;
        self.consecutive_misses = 0;

        self.position_history.push_back(*measurement);
        if self.position_history.len() > HISTORY_LEN {
            self.position_history.pop_front();
        }
    }

    /// Filtered position estimate.
    #[inline]
    pub fn position(&self) -> Vector3<f64> {
        self.kf.position()
    }

    /// Filtered velocity estimate.
    #[inline]
    pub fn velocity(&self) -> Vector3<f64> {
        self.kf.velocity()
    }

    /// Filtered acceleration estimate.
    #[inline]
    pub fn acceleration(&self) -> Vector3<f64> {
        self.kf.acceleration()
    }

    /// Arithmetic mean of the trailing measured positions.
    ///
    /// The history always holds between 1 and 5 entries.
    pub fn smoothed_position(&self) -> Vector3<f64> {
        let sum: Vector3<f64> = self.position_history.iter().sum();
        sum / self.position_history.len() as f64
    }

    /// Number of positions currently held by the smoother.
    pub fn history_len(&self) -> usize {
        self.position_history.len()
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.position();
        let v = self.velocity();
        let a = self.acceleration();
        write!(
            f,
            "Track {}: [{:.3}, {:.3}, {:.3}] | Velocity: [{:.3}, {:.3}, {:.3}] \
             | Acceleration: [{:.3}, {:.3}, {:.3}] | Stage: {} | Age: {} | Hits: {} \
             | HitStreak: {} | TimeSinceUpdate: {} | ConsecutiveMisses: {}",
            self.id,
            p.x,
            p.y,
            p.z,
            v.x,
            v.y,
            v.z,
            a.x,
            a.y,
            a.z,
            self.stage,
            self.age,
            self.hits,
            self.hit_streak,
            self.time_since_update,
            self.consecutive_misses,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settings() -> TrackSettings {
        TrackSettings {
            measurement_noise: 1.0,
            process_noise: 0.01,
            covariance: 10.0,
            distance_threshold: 5.0,
            max_age: 3,
            min_hits: 3,
            max_consecutive_misses: 3,
        }
    }

    fn new_track(position: Vector3<f64>) -> Track {
        Track::new(
            0,
            position,
            Vector3::zeros(),
            Vector3::zeros(),
            &settings(),
        )
    }

    #[test]
    fn test_new_track_counters() {
        let track = new_track(Vector3::new(1.0, 2.0, 3.0));

        assert_eq!(track.stage, TrackStage::Initialized);
        assert_eq!(track.age, 0);
        assert_eq!(track.hits, 1);
        assert_eq!(track.hit_streak, 0);
        assert_eq!(track.time_since_update, 0);
        assert_eq!(track.consecutive_misses, 0);
        assert_eq!(track.history_len(), 1);
        assert_relative_eq!(track.position().x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_predict_ages_track() {
        let mut track = new_track(Vector3::zeros());

        track.predict();
        track.predict();

        assert_eq!(track.age, 2);
        assert_eq!(track.consecutive_misses, 2);
        // predict never advances time_since_update
        assert_eq!(track.time_since_update, 0);
    }

    #[test]
    fn test_update_resets_miss_counters() {
        let mut track = new_track(Vector3::zeros());
        track.predict();
        track.time_since_update = 2;

        track.update(&Vector3::new(0.1, 0.0, 0.0));

        assert_eq!(track.hits, 2);
        assert_eq!(track.hit_streak, 1);
        assert_eq!(track.time_since_update, 0);
        assert_eq!(track.consecutive_misses, 0);
    }

    #[test]
    fn test_history_capped_at_five() {
        let mut track = new_track(Vector3::zeros());

        for i in 0..10 {
            track.update(&Vector3::new(i as f64, 0.0, 0.0));
        }

        assert_eq!(track.history_len(), 5);
        // Oldest retained measurement is x = 5
        assert_relative_eq!(track.smoothed_position().x, 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_smoothed_position_is_mean() {
        let mut track = new_track(Vector3::new(0.0, 0.0, 0.0));
        track.update(&Vector3::new(2.0, 4.0, 6.0));

        let smoothed = track.smoothed_position();

        assert_relative_eq!(smoothed.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(smoothed.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(smoothed.z, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hits_never_below_hit_streak() {
        let mut track = new_track(Vector3::zeros());

        for _ in 0..4 {
            track.predict();
            track.update(&Vector3::zeros());
            assert!(track.hits >= track.hit_streak);
        }
    }

    #[test]
    fn test_display_contains_id_and_stage() {
        let track = new_track(Vector3::zeros());
        let line = track.to_string();

        assert!(line.contains("Track 0"));
        assert!(line.contains("INITIALIZED"));
    }
}
