//! Frame-keyed JSON stream serialization.
//!
//! External collaborator around the tracking core: maps persistent
//! detection records onto per-frame inputs for [`Tracker::step`] and the
//! resulting reports back into persistent form.
//!
//! The on-disk shape is an object keyed by frame identifier (an integer in
//! string form), each value carrying a `tracks` array:
//!
//! ```json
//! { "0": { "tracks": [ { "x": 1.0, "y": 2.0, "z": 0.5 } ] } }
//! ```
//!
//! Frames are processed ascending by integer key value; output keys keep
//! their original string form and appear in processing order.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::{debug, trace};

use crate::tracker::{TrackReport, TrackSettings, Tracker};
use crate::{Error, Point3, Result};

/// One detected 3D position as stored on disk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Detections of a single frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub tracks: Vec<DetectionRecord>,
}

/// One confirmed track as stored on disk: identity, smoothed position,
/// velocity, acceleration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

impl From<&TrackReport> for TrackRecord {
    fn from(report: &TrackReport) -> Self {
        let [x, y, z] = report.position;
        let [vx, vy, vz] = report.velocity;
        let [ax, ay, az] = report.acceleration;
        Self {
            id: report.id,
            x,
            y,
            z,
            vx,
            vy,
            vz,
            ax,
            ay,
            az,
        }
    }
}

/// Confirmed tracks of a single frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFrame {
    pub tracks: Vec<TrackRecord>,
}

/// A whole detection stream, keyed by frame identifier.
pub type DetectionStream = HashMap<String, DetectionFrame>;

/// Frame keys sorted ascending by integer value, original strings kept.
///
/// # Errors
/// Returns [`Error::InvalidFrameKey`] for a key that does not parse as an
/// integer.
pub fn sorted_frame_keys(stream: &DetectionStream) -> Result<Vec<String>> {
    let mut frames: Vec<(i64, &String)> = stream
        .keys()
        .map(|key| {
            key.parse::<i64>()
                .map(|frame| (frame, key))
                .map_err(|_| Error::InvalidFrameKey(key.clone()))
        })
        .collect::<Result<_>>()?;
    frames.sort_unstable_by_key(|(frame, _)| *frame);
    Ok(frames.into_iter().map(|(_, key)| key.clone()).collect())
}

/// Run a fresh tracker over a detection stream.
///
/// Frames are visited ascending by integer key; every input frame appears
/// in the output, with an empty `tracks` array when nothing is confirmed.
pub fn run_stream(
    settings: TrackSettings,
    stream: &DetectionStream,
) -> Result<Vec<(String, TrackFrame)>> {
    let mut tracker = Tracker::new(settings)?;
    let mut output = Vec::with_capacity(stream.len());

    for key in sorted_frame_keys(stream)? {
        let detections: Vec<Point3> = stream[&key]
            .tracks
            .iter()
            .map(|d| Vector3::new(d.x, d.y, d.z))
            .collect();

        let reports = tracker.step(&detections);
        debug!(
            frame = %key,
            detections = detections.len(),
            confirmed = reports.len(),
            "processed frame"
        );
        for track in tracker.tracks() {
            trace!(frame = %key, "{track}");
        }

        let records = reports.iter().map(TrackRecord::from).collect();
        output.push((key, TrackFrame { tracks: records }));
    }
    Ok(output)
}

/// Read tracker settings from a JSON file.
pub fn read_settings(path: &Path) -> Result<TrackSettings> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a detection stream from a JSON file.
pub fn read_detections(path: &Path) -> Result<DetectionStream> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write tracked frames to a JSON file, keys in the given order, indented
/// with four spaces.
pub fn write_tracks(path: &Path, frames: &[(String, TrackFrame)]) -> Result<()> {
    let mut root = serde_json::Map::with_capacity(frames.len());
    for (key, frame) in frames {
        root.insert(key.clone(), serde_json::to_value(frame)?);
    }

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde_json::Value::Object(root).serialize(&mut serializer)?;

    fs::write(path, buf)?;
    Ok(())
}
