//! Metrics computation for dive profiles.
//!
//! Every function here is a pure reducer over a waypoint slice. An empty
//! profile is not an error: each metric is `0` in that case.
//!
//! Average ascent and descent rates use the aggregate definition: pairs are
//! picked by depth direction alone, then total depth change is divided by the
//! summed time change of those pairs. A total time of zero or less yields `0`.

use serde::{Deserialize, Serialize};

use crate::models::Waypoint;

/// Vertical movement between two consecutive waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct SegmentRate {
    /// Dive time at the start of the segment (seconds)
    pub start_time: f64,
    /// Dive time at the end of the segment (seconds)
    pub end_time: f64,
    /// Descent speed in m/s, `0` when ascending or level
    pub descent_rate: f64,
    /// Ascent speed in m/s, `0` when descending or level
    pub ascent_rate: f64,
}

/// Computed statistics for a dive profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct DiveStats {
    /// Time span covered by the samples (seconds)
    pub duration: f64,
    pub max_depth: f64,
    /// Sample mean of depth
    pub average_depth: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub average_temperature: f64,
    /// Aggregate descent rate (m/s)
    pub average_descent_rate: f64,
    /// Aggregate ascent rate (m/s)
    pub average_ascent_rate: f64,
    /// Fastest single-segment descent (m/s)
    pub max_descent_rate: f64,
    /// Fastest single-segment ascent (m/s)
    pub max_ascent_rate: f64,
    pub sample_count: u64,
}

impl DiveStats {
    /// Compute statistics from a waypoint sequence.
    pub fn compute(waypoints: &[Waypoint]) -> Self {
        if waypoints.is_empty() {
            return Self::default();
        }

        let segments = segment_rates(waypoints);
        let (min_temperature, max_temperature) = temperature_range(waypoints);

        DiveStats {
            duration: dive_duration(waypoints),
            max_depth: max_depth(waypoints),
            average_depth: average_depth(waypoints),
            min_temperature,
            max_temperature,
            average_temperature: average_temperature(waypoints),
            average_descent_rate: average_descent_rate(waypoints),
            average_ascent_rate: average_ascent_rate(waypoints),
            max_descent_rate: segments.iter().map(|s| s.descent_rate).fold(0.0, f64::max),
            max_ascent_rate: segments.iter().map(|s| s.ascent_rate).fold(0.0, f64::max),
            sample_count: waypoints.len() as u64,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn average_temperature(waypoints: &[Waypoint]) -> f64 {
    mean(waypoints.iter().map(|w| w.temperature))
}

pub fn average_depth(waypoints: &[Waypoint]) -> f64 {
    mean(waypoints.iter().map(|w| w.depth))
}

/// Deepest sample, or `0` for an empty profile.
pub fn max_depth(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .iter()
        .map(|w| w.depth)
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// `(min, max)` temperature in Celsius.
pub fn temperature_range(waypoints: &[Waypoint]) -> (f64, f64) {
    let mut temps = waypoints.iter().map(|w| w.temperature);
    let Some(first) = temps.next() else {
        return (0.0, 0.0);
    };
    temps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)))
}

/// Span between the earliest and latest sample times.
pub fn dive_duration(waypoints: &[Waypoint]) -> f64 {
    let mut times = waypoints.iter().map(|w| w.dive_time);
    let Some(first) = times.next() else {
        return 0.0;
    };
    let (lo, hi) = times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
    hi - lo
}

/// Consecutive pairs as `(depth_delta, time_delta)`.
fn steps(waypoints: &[Waypoint]) -> impl Iterator<Item = (f64, f64)> + '_ {
    waypoints.windows(2).map(|pair| {
        (
            pair[1].depth - pair[0].depth,
            pair[1].dive_time - pair[0].dive_time,
        )
    })
}

/// Total depth gained divided by total time of the descending pairs (m/s).
pub fn average_descent_rate(waypoints: &[Waypoint]) -> f64 {
    let (depth, time) = steps(waypoints)
        .filter(|(dd, _)| *dd > 0.0)
        .fold((0.0, 0.0), |(depth, time), (dd, dt)| (depth + dd, time + dt));
    if time > 0.0 {
        depth / time
    } else {
        0.0
    }
}

/// Total depth lost divided by total time of the ascending pairs (m/s).
pub fn average_ascent_rate(waypoints: &[Waypoint]) -> f64 {
    let (depth, time) = steps(waypoints)
        .filter(|(dd, _)| *dd < 0.0)
        .fold((0.0, 0.0), |(depth, time), (dd, dt)| (depth - dd, time + dt));
    if time > 0.0 {
        depth / time
    } else {
        0.0
    }
}

/// Per-segment vertical speeds.
///
/// Pairs whose time does not advance are dropped.
pub fn segment_rates(waypoints: &[Waypoint]) -> Vec<SegmentRate> {
    waypoints
        .windows(2)
        .filter_map(|pair| {
            let dt = pair[1].dive_time - pair[0].dive_time;
            if dt <= 0.0 {
                return None;
            }
            let (descent_rate, ascent_rate) = split_speed((pair[1].depth - pair[0].depth) / dt);
            Some(SegmentRate {
                start_time: pair[0].dive_time,
                end_time: pair[1].dive_time,
                descent_rate,
                ascent_rate,
            })
        })
        .collect()
}

/// Rates of the segment arriving at `waypoints[index]`.
///
/// The first sample, or one whose time does not advance from its
/// predecessor, has no arriving segment and reports `(0, 0)`.
pub fn rates_at(waypoints: &[Waypoint], index: usize) -> (f64, f64) {
    if index == 0 || index >= waypoints.len() {
        return (0.0, 0.0);
    }
    let (prev, curr) = (&waypoints[index - 1], &waypoints[index]);
    let dt = curr.dive_time - prev.dive_time;
    if dt <= 0.0 {
        return (0.0, 0.0);
    }
    split_speed((curr.depth - prev.depth) / dt)
}

/// Signed vertical speed as `(descent, ascent)`, both non-negative.
fn split_speed(speed: f64) -> (f64, f64) {
    if speed > 0.0 {
        (speed, 0.0)
    } else if speed < 0.0 {
        (0.0, -speed)
    } else {
        (0.0, 0.0)
    }
}

pub fn max_descent_rate(waypoints: &[Waypoint]) -> f64 {
    segment_rates(waypoints)
        .iter()
        .map(|s| s.descent_rate)
        .fold(0.0, f64::max)
}

pub fn max_ascent_rate(waypoints: &[Waypoint]) -> f64 {
    segment_rates(waypoints)
        .iter()
        .map(|s| s.ascent_rate)
        .fold(0.0, f64::max)
}
