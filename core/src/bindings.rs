//! Functions exported to the UI host through uniffi.
//!
//! Records cross the boundary by value, so every export takes owned
//! arguments and returns a fresh value. State such as the sync offset or
//! the overlay configuration lives in the host and is passed back in.

use crate::config::LoggingConfig;
use crate::error::UddfError;
use crate::metrics::DiveStats;
use crate::models::{ParsedDive, Waypoint};
use crate::overlay::{OverlayConfig, OverlayField, OverlayFrame};
use crate::sync::SyncOffset;
use crate::{logging, timeline, uddf};

#[uniffi::export]
pub fn parse_uddf(xml: String) -> Result<ParsedDive, UddfError> {
    uddf::parse(&xml)
}

#[uniffi::export]
pub fn nearest_waypoint(waypoints: Vec<Waypoint>, time: f64) -> Option<Waypoint> {
    timeline::nearest_waypoint(&waypoints, time).cloned()
}

#[uniffi::export]
pub fn format_dive_time(seconds: f64) -> String {
    timeline::format_dive_time(seconds)
}

#[uniffi::export]
pub fn dive_stats(waypoints: Vec<Waypoint>) -> DiveStats {
    DiveStats::compute(&waypoints)
}

#[uniffi::export]
pub fn dive_time_for_video_time(sync: SyncOffset, video_time: f64) -> f64 {
    sync.dive_time_for_video_time(video_time)
}

#[uniffi::export]
pub fn video_time_for_dive_time(sync: SyncOffset, dive_time: f64) -> f64 {
    sync.video_time_for_dive_time(dive_time)
}

#[uniffi::export]
pub fn set_sync_offset(mut sync: SyncOffset, offset: f64) -> SyncOffset {
    sync.set(offset);
    sync
}

#[uniffi::export]
pub fn reset_sync_offset(mut sync: SyncOffset) -> SyncOffset {
    sync.reset();
    sync
}

#[uniffi::export]
pub fn resolve_overlay_frame(
    dive: ParsedDive,
    sync: SyncOffset,
    config: OverlayConfig,
    video_time: f64,
) -> OverlayFrame {
    OverlayFrame::resolve(&dive, &sync, &config, video_time)
}

#[uniffi::export]
pub fn default_overlay_config() -> OverlayConfig {
    OverlayConfig::default()
}

#[uniffi::export]
pub fn toggle_overlay_field(mut config: OverlayConfig, field: OverlayField) -> OverlayConfig {
    config.toggle_field(field);
    config
}

#[uniffi::export]
pub fn dive_to_json(dive: ParsedDive) -> Result<String, UddfError> {
    Ok(dive.to_json()?)
}

/// Route core log output through a global subscriber. Returns `false` if
/// one was already installed.
#[uniffi::export]
pub fn init_logging(level: String, json: bool) -> bool {
    logging::init_logging(&LoggingConfig { level, json })
}
