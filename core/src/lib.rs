pub mod bindings;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod overlay;
pub mod sync;
pub mod timeline;
pub mod uddf;
pub mod xml;

uniffi::setup_scaffolding!();

pub use config::{Locale, LoggingConfig, Settings, Theme};
pub use error::{ConfigError, UddfError, XmlError};
pub use export::{frame_times, ExportConfig, ProgressListener, ProgressReporter};
pub use metrics::{DiveStats, SegmentRate};
pub use models::{DiveMetadata, DiverInfo, EquipmentInfo, ParsedDive, Waypoint};
pub use overlay::{OverlayConfig, OverlayField, OverlayFrame, OverlayLine, OverlayPosition};
pub use sync::SyncOffset;
pub use timeline::{format_dive_time, format_duration, nearest_waypoint, TimeFormat};
pub use uddf::{parse, parse_file, parse_with};
pub use xml::{Document, Element, NomXmlReader, XmlReader};
