//! Time-indexed lookup over a dive profile.

use serde::{Deserialize, Serialize};

use crate::models::Waypoint;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum TimeFormat {
    HhMmSs,
    #[default]
    MmSs,
}

/// Index of the waypoint whose `dive_time` is closest to `time`.
///
/// Ties resolve to the earliest waypoint in sequence order. The sequence is
/// scanned in full, so unordered input still yields the closest sample.
pub fn nearest_index(waypoints: &[Waypoint], time: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, wp) in waypoints.iter().enumerate() {
        let distance = (wp.dive_time - time).abs();
        let closer = match best {
            Some((_, best_distance)) => distance < best_distance,
            None => true,
        };
        if closer {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}

/// Waypoint closest to `time`, or `None` for an empty profile.
pub fn nearest_waypoint(waypoints: &[Waypoint], time: f64) -> Option<&Waypoint> {
    nearest_index(waypoints, time).map(|i| &waypoints[i])
}

/// Format elapsed seconds as `MM:SS`, with unbounded minutes.
///
/// ```
/// use diveoverlay_core::timeline::format_dive_time;
///
/// assert_eq!(format_dive_time(125.0), "02:05");
/// assert_eq!(format_dive_time(3661.0), "61:01");
/// ```
pub fn format_dive_time(seconds: f64) -> String {
    let total = if seconds.is_finite() { seconds } else { 0.0 };
    let minutes = (total / 60.0).floor() as i64;
    let secs = (total % 60.0).floor() as i64;
    format!("{:02}:{:02}", minutes, secs)
}

pub fn format_duration(seconds: f64, format: TimeFormat) -> String {
    match format {
        TimeFormat::MmSs => format_dive_time(seconds),
        TimeFormat::HhMmSs => {
            let total = if seconds.is_finite() { seconds } else { 0.0 };
            let hours = (total / 3600.0).floor() as i64;
            let minutes = ((total % 3600.0) / 60.0).floor() as i64;
            let secs = (total % 60.0).floor() as i64;
            format!("{}:{:02}:{:02}", hours, minutes, secs)
        }
    }
}
