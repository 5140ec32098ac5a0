//! Alignment between the video playback clock and the dive log clock.
//!
//! A single offset `o` (seconds) relates the two axes:
//! `dive = max(0, video - o)` and `video = dive + o`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct SyncOffset {
    /// Video time at which the dive log starts (seconds)
    pub offset: f64,
    pub is_synced: bool,
}

impl SyncOffset {
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            is_synced: true,
        }
    }

    /// Offset that places dive time `dive_time` at video time `video_time`.
    pub fn from_marks(video_time: f64, dive_time: f64) -> Self {
        Self::new(video_time - dive_time)
    }

    pub fn set(&mut self, offset: f64) {
        self.offset = offset;
        self.is_synced = true;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Dive time shown at a video position. Never negative.
    pub fn dive_time_for_video_time(&self, video_time: f64) -> f64 {
        (video_time - self.offset).max(0.0)
    }

    /// Video position of a dive time. Not clamped to the media duration.
    pub fn video_time_for_dive_time(&self, dive_time: f64) -> f64 {
        dive_time + self.offset
    }
}
