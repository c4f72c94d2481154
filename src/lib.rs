//! # Pointtrack - Multi-Object Tracking for 3D Point Detections
//!
//! Pointtrack consumes, per discrete frame, an unordered set of 3D position
//! measurements (LiDAR clusters, radar targets, detected object centroids)
//! and produces a stream of persistent, identified tracks annotated with
//! smoothed position, velocity, and acceleration.
//!
//! ## Features
//!
//! - Per-track constant-acceleration Kalman filtering (9D state, 3D measurement)
//! - Global nearest-neighbor association (rectangular Hungarian algorithm)
//! - Gated assignment with a Euclidean distance threshold
//! - Track lifecycle management (birth, confirmation, coasting, death)
//! - Trailing-window position smoothing
//!
//! ## Example
//!
//! ```rust
//! use nalgebra::Vector3;
//! use pointtrack::{Tracker, TrackSettings};
//!
//! let settings = TrackSettings {
//!     measurement_noise: 1.0,
//!     process_noise: 0.01,
//!     covariance: 10.0,
//!     distance_threshold: 5.0,
//!     max_age: 3,
//!     min_hits: 3,
//!     max_consecutive_misses: 3,
//! };
//! let mut tracker = Tracker::new(settings).unwrap();
//!
//! // Process one frame of detections
//! let detections = vec![Vector3::new(1.0, 2.0, 0.5)];
//! let confirmed = tracker.step(&detections);
//! assert!(confirmed.is_empty()); // not confirmed until min_hits updates
//! ```

// Public modules
pub mod assignment;
pub mod filter;
pub mod io;
pub mod track;
pub mod tracker;

// Re-exports for convenience
pub use filter::ConstantAccelerationKalman;
pub use track::{Track, TrackStage};
pub use tracker::{TrackReport, TrackSettings, Tracker};

/// A single 3D point detection for one frame; carries no identity.
pub type Point3 = nalgebra::Vector3<f64>;

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the pointtrack library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid settings: {0}")]
        InvalidSettings(String),

        #[error("Invalid frame key `{0}`: frame identifiers must be integers")]
        InvalidFrameKey(String),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),

        #[error("JSON error: {0}")]
        JsonError(#[from] serde_json::Error),
    }

    /// Result type for pointtrack operations
    pub type Result<T> = std::result::Result<T, Error>;
}
