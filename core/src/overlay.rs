//! Telemetry overlay selection and per-frame text resolution.
//!
//! The renderer draws whatever [`OverlayFrame::resolve`] returns for a video
//! position; this module decides which fields appear, in what order, and how
//! each value is written.

use serde::{Deserialize, Serialize};

use crate::metrics::rates_at;
use crate::models::ParsedDive;
use crate::sync::SyncOffset;
use crate::timeline::{format_dive_time, nearest_index};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "camelCase")]
pub enum OverlayField {
    Date,
    DiveNumber,
    Depth,
    Temperature,
    #[serde(rename = "divetime")]
    DiveTime,
    DescentRate,
    AscentRate,
}

impl OverlayField {
    pub const ALL: [OverlayField; 7] = [
        OverlayField::Date,
        OverlayField::DiveNumber,
        OverlayField::Depth,
        OverlayField::Temperature,
        OverlayField::DiveTime,
        OverlayField::DescentRate,
        OverlayField::AscentRate,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            OverlayField::Date => "date",
            OverlayField::DiveNumber => "diveNumber",
            OverlayField::Depth => "depth",
            OverlayField::Temperature => "temperature",
            OverlayField::DiveTime => "divetime",
            OverlayField::DescentRate => "descentRate",
            OverlayField::AscentRate => "ascentRate",
        }
    }

    /// Translation key for the field's caption.
    pub fn label_key(&self) -> String {
        format!("overlay.fields.{}", self.key())
    }

    fn enabled_by_default(&self) -> bool {
        !matches!(self, OverlayField::DescentRate | OverlayField::AscentRate)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayPosition {
    Top,
    #[default]
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct FieldToggle {
    pub field: OverlayField,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct OverlayStyle {
    pub position: OverlayPosition,
    /// 0.0 (transparent) to 1.0 (opaque)
    pub opacity: f64,
    /// Font size in pixels
    pub font_size: u32,
    /// CSS color string
    pub background_color: String,
    /// CSS color string
    pub text_color: String,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            position: OverlayPosition::Bottom,
            opacity: 0.8,
            font_size: 16,
            background_color: "rgba(0, 0, 0, 0.7)".to_string(),
            text_color: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct OverlayConfig {
    /// Display order and visibility of every field
    pub fields: Vec<FieldToggle>,
    pub style: OverlayStyle,
    pub preview_mode: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fields: OverlayField::ALL
                .iter()
                .map(|&field| FieldToggle {
                    field,
                    enabled: field.enabled_by_default(),
                })
                .collect(),
            style: OverlayStyle::default(),
            preview_mode: false,
        }
    }
}

impl OverlayConfig {
    /// Flip a field's visibility. Unknown fields are ignored.
    pub fn toggle_field(&mut self, field: OverlayField) {
        if let Some(toggle) = self.fields.iter_mut().find(|t| t.field == field) {
            toggle.enabled = !toggle.enabled;
        }
    }

    pub fn is_enabled(&self, field: OverlayField) -> bool {
        self.fields.iter().any(|t| t.field == field && t.enabled)
    }

    pub fn enabled_fields(&self) -> impl Iterator<Item = OverlayField> + '_ {
        self.fields.iter().filter(|t| t.enabled).map(|t| t.field)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct OverlayLine {
    pub field: OverlayField,
    pub label_key: String,
    pub value: String,
}

/// Everything the renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct OverlayFrame {
    pub video_time: f64,
    pub dive_time: f64,
    /// Index of the waypoint the values were read from
    pub waypoint_index: Option<u64>,
    pub lines: Vec<OverlayLine>,
}

impl OverlayFrame {
    pub fn resolve(
        dive: &ParsedDive,
        sync: &SyncOffset,
        config: &OverlayConfig,
        video_time: f64,
    ) -> Self {
        let dive_time = sync.dive_time_for_video_time(video_time);
        let index = nearest_index(&dive.waypoints, dive_time);
        let waypoint = index.map(|i| &dive.waypoints[i]);
        let (descent, ascent) = index
            .map(|i| rates_at(&dive.waypoints, i))
            .unwrap_or((0.0, 0.0));

        let lines = config
            .enabled_fields()
            .filter_map(|field| {
                let value = match field {
                    OverlayField::Date => Some(dive.metadata.datetime.clone()),
                    OverlayField::DiveNumber => Some(format!("#{}", dive.metadata.dive_number)),
                    OverlayField::Depth => waypoint.map(|w| format!("{:.1} m", w.depth)),
                    OverlayField::Temperature => {
                        waypoint.map(|w| format!("{:.1} °C", w.temperature))
                    }
                    OverlayField::DiveTime => waypoint.map(|w| format_dive_time(w.dive_time)),
                    OverlayField::DescentRate => {
                        waypoint.map(|_| format!("{:.2} m/s", descent))
                    }
                    OverlayField::AscentRate => waypoint.map(|_| format!("{:.2} m/s", ascent)),
                }?;
                Some(OverlayLine {
                    field,
                    label_key: field.label_key(),
                    value,
                })
            })
            .collect();

        OverlayFrame {
            video_time,
            dive_time,
            waypoint_index: index.map(|i| i as u64),
            lines,
        }
    }
}
