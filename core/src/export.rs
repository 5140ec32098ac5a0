//! Export settings, output frame schedule and progress reporting.
//!
//! Encoding itself happens outside this crate. The host walks
//! [`frame_times`], resolves an overlay for each timestamp, hands frames to
//! its encoder and reports completion through a [`ProgressReporter`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::overlay::OverlayPosition;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct ExportConfig {
    /// Output size as `WIDTHxHEIGHT`
    pub resolution: String,
    /// Output frames per second
    pub frame_rate: u32,
    /// Encoder bitrate, e.g. `5000k`
    pub bitrate: String,
    pub overlay_position: OverlayPosition,
    pub overlay_opacity: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            resolution: "1920x1080".to_string(),
            frame_rate: 30,
            bitrate: "5000k".to_string(),
            overlay_position: OverlayPosition::Bottom,
            overlay_opacity: 0.8,
        }
    }
}

impl ExportConfig {
    /// Parsed `(width, height)` of [`ExportConfig::resolution`].
    pub fn dimensions(&self) -> Result<(u32, u32), ConfigError> {
        let invalid = || ConfigError::InvalidResolution(self.resolution.clone());
        let (w, h) = self
            .resolution
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok((width, height))
    }

    /// Number of frames needed to cover `duration` seconds of video.
    pub fn frame_count(&self, duration: f64) -> u64 {
        frame_count(duration, self.frame_rate)
    }
}

/// Number of frames `i` with `i / frame_rate < duration`.
fn frame_count(duration: f64, frame_rate: u32) -> u64 {
    if frame_rate == 0 || !duration.is_finite() || duration <= 0.0 {
        return 0;
    }
    let fps = f64::from(frame_rate);
    // The product can land a hair above an integer, so step back until the
    // last frame falls strictly inside the clip.
    let mut count = (duration * fps).ceil() as u64;
    while count > 0 && (count - 1) as f64 / fps >= duration {
        count -= 1;
    }
    count
}

/// Presentation time of every output frame in `[0, duration)`.
pub fn frame_times(duration: f64, frame_rate: u32) -> Vec<f64> {
    let fps = f64::from(frame_rate);
    (0..frame_count(duration, frame_rate))
        .map(|i| i as f64 / fps)
        .collect()
}

/// Receives export progress as a fraction in `[0, 1]`.
pub trait ProgressListener {
    fn on_progress(&mut self, fraction: f64);
}

impl<F> ProgressListener for F
where
    F: FnMut(f64),
{
    fn on_progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Forwards encoder progress to a listener.
///
/// Values are clamped to `[0, 1]` and never move backwards; a value lower
/// than the last one reported is dropped.
pub struct ProgressReporter<L: ProgressListener> {
    listener: L,
    last: f64,
}

impl<L: ProgressListener> ProgressReporter<L> {
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            last: 0.0,
        }
    }

    pub fn report(&mut self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        let clamped = fraction.clamp(0.0, 1.0);
        if clamped < self.last {
            return;
        }
        self.last = clamped;
        self.listener.on_progress(clamped);
    }

    /// Report `done` out of `total` frames.
    pub fn report_frames(&mut self, done: u64, total: u64) {
        if total == 0 {
            return;
        }
        self.report(done as f64 / total as f64);
    }

    pub fn fraction(&self) -> f64 {
        self.last
    }

    pub fn percentage(&self) -> u32 {
        (self.last * 100.0).round() as u32
    }

    pub fn into_listener(self) -> L {
        self.listener
    }
}
