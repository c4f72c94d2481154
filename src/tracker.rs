//! Frame-level tracking pipeline.
//!
//! The [`Tracker`] owns the live track set and, for each frame, runs
//! predict -> associate -> gate -> spawn -> cull -> promote, then emits
//! the confirmed tracks.

use nalgebra::{DMatrix, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assignment::minimum_cost_assignment;
use crate::track::{Track, TrackStage};
use crate::{Error, Point3, Result};

/// Immutable tracker configuration.
///
/// All scalar knobs of the engine; validated once at [`Tracker::new`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TrackSettings {
    /// Scale applied to the measurement covariance `R`.
    pub measurement_noise: f64,

    /// Scale applied to the process covariance `Q`.
    pub process_noise: f64,

    /// Scale of the initial state covariance `P`.
    pub covariance: f64,

    /// Maximum accepted Euclidean distance for an assignment (strict `<`).
    pub distance_threshold: f64,

    /// Frames of missed updates before a track is deleted.
    pub max_age: u32,

    /// Cumulative updates required for promotion to CONFIRMED.
    pub min_hits: u32,

    /// Run of consecutive misses before a track is deleted.
    pub max_consecutive_misses: u32,
}

impl TrackSettings {
    fn validate(&self) -> Result<()> {
        if self.measurement_noise <= 0.0 {
            return Err(Error::InvalidSettings(
                "measurement_noise must be positive".to_string(),
            ));
        }
        if self.process_noise <= 0.0 {
            return Err(Error::InvalidSettings(
                "process_noise must be positive".to_string(),
            ));
        }
        if self.covariance <= 0.0 {
            return Err(Error::InvalidSettings(
                "covariance must be positive".to_string(),
            ));
        }
        if self.distance_threshold <= 0.0 {
            return Err(Error::InvalidSettings(
                "distance_threshold must be positive".to_string(),
            ));
        }
        if self.min_hits == 0 {
            return Err(Error::InvalidSettings(
                "min_hits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Snapshot of one confirmed track, reported per frame by value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackReport {
    /// Track identifier.
    pub id: u64,
    /// Smoothed position (trailing-window mean of measurements).
    pub position: [f64; 3],
    /// Filtered velocity.
    pub velocity: [f64; 3],
    /// Filtered acceleration.
    pub acceleration: [f64; 3],
}

/// Multi-object tracker over a stream of per-frame 3D detections.
///
/// One instance tracks one independent stream; distinct instances share
/// nothing and may run in parallel.
#[derive(Debug)]
pub struct Tracker {
    /// Live tracks, in creation order modulo deletions.
    tracks: Vec<Track>,
    /// Next identity to assign; monotonically increasing, never reused.
    next_id: u64,
    /// Engine configuration.
    settings: TrackSettings,
}

impl Tracker {
    /// Create a tracker with the given settings.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSettings`] if any noise scale or the
    /// distance threshold is non-positive, or `min_hits` is zero.
    pub fn new(settings: TrackSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            tracks: Vec::new(),
            next_id: 0,
            settings,
        })
    }

    /// Process one frame of detections and report the confirmed tracks.
    ///
    /// The pipeline per frame: predict every live track, associate tracks
    /// to detections by minimum total Euclidean distance, accept pairs
    /// strictly inside the gate, spawn tracks for leftover detections, age
    /// and cull tracks that went unmatched, then promote tracks that have
    /// accumulated `min_hits` updates. Detection order is preserved and
    /// breaks ties, so the result is deterministic for a given input.
    pub fn step(&mut self, detections: &[Point3]) -> Vec<TrackReport> {
        for track in &mut self.tracks {
            track.predict();
        }

        let (unassigned_tracks, unassigned_detections) = self.associate(detections);

        for &j in &unassigned_detections {
            let track = Track::new(
                self.next_id,
                detections[j],
                Vector3::zeros(),
                Vector3::zeros(),
                &self.settings,
            );
            debug!(id = track.id, x = detections[j].x, y = detections[j].y, z = detections[j].z, "spawned track");
            self.tracks.push(track);
            self.next_id += 1;
        }

        // Descending order keeps the remaining indices valid across removals
        for &i in unassigned_tracks.iter().rev() {
            self.tracks[i].time_since_update += 1;
            let track = &self.tracks[i];
            if track.time_since_update > self.settings.max_age
                || track.consecutive_misses > self.settings.max_consecutive_misses
            {
                debug!(
                    id = track.id,
                    time_since_update = track.time_since_update,
                    consecutive_misses = track.consecutive_misses,
                    "deleted track"
                );
                self.tracks.remove(i);
            }
        }

        for track in &mut self.tracks {
            if track.stage == TrackStage::Initialized && track.hits >= self.settings.min_hits {
                track.stage = TrackStage::Confirmed;
                debug!(id = track.id, hits = track.hits, "confirmed track");
            }
            if track.time_since_update > 1 {
                track.hit_streak = 0;
            }
        }

        self.tracks
            .iter()
            .filter(|track| track.stage == TrackStage::Confirmed)
            .map(|track| TrackReport {
                id: track.id,
                position: track.smoothed_position().into(),
                velocity: track.velocity().into(),
                acceleration: track.acceleration().into(),
            })
            .collect()
    }

    /// Match live tracks to detections; matched tracks are updated in
    /// place. Returns the leftover track and detection indices, both
    /// ascending.
    fn associate(&mut self, detections: &[Point3]) -> (Vec<usize>, Vec<usize>) {
        if self.tracks.is_empty() {
            return (Vec::new(), (0..detections.len()).collect());
        }

        // Costs read the post-predict filter state
        let cost = DMatrix::from_fn(self.tracks.len(), detections.len(), |i, j| {
            (self.tracks[i].position() - detections[j]).norm()
        });

        let assignment = minimum_cost_assignment(&cost);

        let mut track_assigned = vec![false; self.tracks.len()];
        let mut detection_assigned = vec![false; detections.len()];
        for (i, assigned) in assignment.iter().enumerate() {
            if let Some(j) = *assigned {
                if cost[(i, j)] < self.settings.distance_threshold {
                    self.tracks[i].update(&detections[j]);
                    track_assigned[i] = true;
                    detection_assigned[j] = true;
                }
            }
        }

        let unassigned_tracks = (0..self.tracks.len())
            .filter(|&i| !track_assigned[i])
            .collect();
        let unassigned_detections = (0..detections.len())
            .filter(|&j| !detection_assigned[j])
            .collect();
        (unassigned_tracks, unassigned_detections)
    }

    /// All live tracks, including unconfirmed ones.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Total number of identities issued so far.
    pub fn total_track_count(&self) -> u64 {
        self.next_id
    }

    /// The settings this tracker was built with.
    pub fn settings(&self) -> &TrackSettings {
        &self.settings
    }
}
