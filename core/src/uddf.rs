//! UDDF 3.2.3 dive log parsing.
//!
//! Reads the subset of UDDF written by dive computer companion apps: the
//! profile waypoints plus the summary blocks before and after the dive, the
//! owner and the dive computer. Missing optional fields quietly default to
//! `0` or an empty string; only malformed XML or a document without a `dive`
//! element is an error.
//!
//! Only the first `dive` supplies metadata, while waypoints are collected
//! from the whole document. Multi-dive files therefore merge every profile
//! into one waypoint list.

use std::fs;
use std::path::Path;

use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1},
    combinator::{opt, recognize},
    number::complete::recognize_float,
    sequence::pair,
    IResult, Parser,
};
use tracing::{debug, warn};

use crate::error::UddfError;
use crate::models::{DiveMetadata, DiverInfo, EquipmentInfo, ParsedDive, Waypoint};
use crate::xml::{Document, Element, NomXmlReader, XmlReader};

/// Offset between the Kelvin and Celsius scales.
pub const KELVIN_OFFSET: f64 = 273.15;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Parse a UDDF document with the built-in XML reader.
pub fn parse(xml: &str) -> Result<ParsedDive, UddfError> {
    parse_with(&NomXmlReader, xml)
}

/// Parse a UDDF document with a caller-supplied XML reader.
pub fn parse_with<R: XmlReader + ?Sized>(reader: &R, xml: &str) -> Result<ParsedDive, UddfError> {
    let result = reader
        .read(xml)
        .map_err(UddfError::from)
        .and_then(|doc| dive_from_document(&doc));

    match &result {
        Ok(dive) => debug!(
            waypoints = dive.waypoints.len(),
            dive_number = dive.metadata.dive_number,
            "parsed UDDF dive"
        ),
        Err(err) => warn!(error = %err, "error parsing UDDF"),
    }
    result
}

/// Read a UDDF file from disk and parse it.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedDive, UddfError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path).map_err(|err| {
        warn!(path = %path.display(), error = %err, "failed to read dive log");
        UddfError::from(err)
    })?;
    parse(&xml)
}

/// Extract a dive from an already parsed XML document.
pub fn dive_from_document(doc: &Document) -> Result<ParsedDive, UddfError> {
    let dive = doc
        .find("dive")
        .ok_or_else(|| UddfError::parse("No dive data found in UDDF file"))?;

    let waypoints = doc.find_all("waypoint").map(read_waypoint).collect();
    let metadata = read_metadata(dive);
    let diver = read_diver(doc.find("owner"));
    let equipment = read_equipment(doc.find("divecomputer"));

    Ok(ParsedDive::new(metadata, diver, equipment, waypoints))
}

fn read_waypoint(waypoint: &Element) -> Waypoint {
    let parent = Some(waypoint);
    let temperature_raw = number(parent, "temperature");
    Waypoint {
        dive_time: number(parent, "divetime"),
        depth: number(parent, "depth"),
        temperature: kelvin_to_celsius(temperature_raw),
        temperature_raw,
    }
}

fn read_metadata(dive: &Element) -> DiveMetadata {
    let after = dive.find("informationafterdive");
    let before = dive.find("informationbeforedive");

    DiveMetadata {
        dive_duration: number(after, "diveduration"),
        max_depth: number(after, "greatestdepth"),
        average_depth: number(after, "averagedepth"),
        min_temperature: kelvin_to_celsius(number(after, "lowesttemperature")),
        dive_number: integer(before, "divenumber"),
        datetime: text(before, "datetime"),
        // Stored as written; not Kelvin-converted.
        air_temperature: number(before, "airtemperature"),
        surface_pressure: number(before, "surfacepressure"),
    }
}

fn read_diver(owner: Option<&Element>) -> DiverInfo {
    DiverInfo {
        id: attribute(owner, "id"),
        first_name: text(owner, "firstname"),
        // Tag name as written by the exporting app.
        last_name: text(owner, "lastanme"),
    }
}

fn read_equipment(computer: Option<&Element>) -> EquipmentInfo {
    EquipmentInfo {
        id: attribute(computer, "id"),
        name: text(computer, "name"),
        manufacturer: computer
            .and_then(|el| el.find_path(&["manufacturer", "name"]))
            .map(Element::text_content)
            .unwrap_or_default(),
        model: text(computer, "model"),
        serial_number: text(computer, "serialnumber"),
    }
}

fn child_text(parent: Option<&Element>, name: &str) -> Option<String> {
    parent?.find(name).map(Element::text_content)
}

fn text(parent: Option<&Element>, name: &str) -> String {
    child_text(parent, name).unwrap_or_default()
}

fn attribute(element: Option<&Element>, name: &str) -> String {
    element
        .and_then(|el| el.attribute(name))
        .map(str::to_string)
        .unwrap_or_default()
}

fn number(parent: Option<&Element>, name: &str) -> f64 {
    let Some(raw) = child_text(parent, name) else {
        return 0.0;
    };
    match float_prefix(&raw) {
        Some(n) => n,
        None => {
            if !raw.trim().is_empty() {
                warn!(field = name, value = %raw, "non-numeric UDDF field, using 0");
            }
            0.0
        }
    }
}

fn integer(parent: Option<&Element>, name: &str) -> i64 {
    let Some(raw) = child_text(parent, name) else {
        return 0;
    };
    match integer_prefix(&raw) {
        Some(n) => n,
        None => {
            if !raw.trim().is_empty() {
                warn!(field = name, value = %raw, "non-integer UDDF field, using 0");
            }
            0
        }
    }
}

/// Leading floating point number of `raw`, ignoring any trailing text.
///
/// An exponent marker without digits (`"12em"`) is treated as trailing text.
pub(crate) fn float_prefix(raw: &str) -> Option<f64> {
    let input = raw.trim_start();
    let parsed: IResult<&str, &str> = recognize_float(input);
    let digits = match parsed {
        Ok((_, digits)) => digits,
        Err(_) => mantissa(input).ok()?.1,
    };
    digits.parse().ok()
}

fn mantissa(input: &str) -> IResult<&str, &str> {
    recognize((
        opt(alt((char('+'), char('-')))),
        alt((
            recognize((digit1, opt((char('.'), digit0)))),
            recognize((char('.'), digit1)),
        )),
    ))
    .parse(input)
}

/// Leading integer of `raw`, ignoring any trailing text.
pub(crate) fn integer_prefix(raw: &str) -> Option<i64> {
    let parsed: IResult<&str, &str> =
        recognize(pair(opt(alt((char('+'), char('-')))), digit1)).parse(raw.trim_start());
    parsed.ok().and_then(|(_, digits)| digits.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XmlError;
    use proptest::prelude::*;

    const SAMPLE_UDDF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<uddf version="3.2.3">
  <profiledata>
    <repetitiongroup>
      <dive>
        <informationbeforedive>
          <divenumber>1</divenumber>
          <datetime>2025-10-24T10:00:00+08:00</datetime>
          <airtemperature>25.0</airtemperature>
        </informationbeforedive>
        <informationafterdive>
          <diveduration>120</diveduration>
          <greatestdepth>20.5</greatestdepth>
          <averagedepth>15.2</averagedepth>
          <lowesttemperature>288.15</lowesttemperature>
        </informationafterdive>
        <samples>
          <waypoint>
            <divetime>0</divetime>
            <depth>0</depth>
            <temperature>293.15</temperature>
          </waypoint>
          <waypoint>
            <divetime>30</divetime>
            <depth>10.5</depth>
            <temperature>290.15</temperature>
          </waypoint>
          <waypoint>
            <divetime>60</divetime>
            <depth>20.5</depth>
            <temperature>288.15</temperature>
          </waypoint>
        </samples>
      </dive>
    </repetitiongroup>
  </profiledata>
</uddf>"#;

    const FULL_UDDF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<uddf version="3.2.3">
  <diver>
    <owner id="owner-7">
      <personal>
        <firstname>Mei</firstname>
        <lastanme>Lin</lastanme>
      </personal>
      <equipment>
        <divecomputer id="dc-1">
          <name>Atmos Mission 1</name>
          <manufacturer id="atmos">
            <name>Atmos</name>
          </manufacturer>
          <model>Mission1</model>
          <serialnumber>SN-0042</serialnumber>
        </divecomputer>
      </equipment>
    </owner>
  </diver>
  <profiledata>
    <repetitiongroup>
      <dive id="first">
        <informationbeforedive>
          <divenumber>17</divenumber>
          <datetime>2025-10-24T10:00:00+08:00</datetime>
          <airtemperature>28.5</airtemperature>
          <surfacepressure>101325</surfacepressure>
        </informationbeforedive>
        <samples>
          <waypoint><divetime>0</divetime><depth>0</depth><temperature>300.15</temperature></waypoint>
        </samples>
      </dive>
      <dive id="second">
        <informationafterdive>
          <diveduration>999</diveduration>
        </informationafterdive>
        <samples>
          <waypoint><divetime>10</divetime><depth>3</depth><temperature>299.15</temperature></waypoint>
        </samples>
      </dive>
    </repetitiongroup>
  </profiledata>
</uddf>"#;

    #[test]
    fn test_parse_sample() {
        let dive = parse(SAMPLE_UDDF).unwrap();

        assert_eq!(dive.waypoints.len(), 3);
        assert_eq!(dive.metadata.dive_duration, 120.0);
        assert_eq!(dive.metadata.max_depth, 20.5);
        assert_eq!(dive.metadata.average_depth, 15.2);
        assert_eq!(dive.metadata.dive_number, 1);
        assert_eq!(dive.metadata.datetime, "2025-10-24T10:00:00+08:00");
        assert_eq!(dive.metadata.air_temperature, 25.0);
        assert_eq!(dive.metadata.surface_pressure, 0.0);
        assert_eq!(dive.dive_duration, 120.0);
        assert_eq!(dive.max_depth, 20.5);
        assert_eq!(dive.min_temperature, 288.15 - 273.15);
    }

    #[test]
    fn test_kelvin_to_celsius_waypoints() {
        let dive = parse(SAMPLE_UDDF).unwrap();

        assert!((dive.waypoints[0].temperature - 20.0).abs() < 1e-9);
        assert!((dive.waypoints[2].temperature - 15.0).abs() < 1e-9);
        assert_eq!(dive.waypoints[0].temperature_raw, 293.15);
        assert_eq!(dive.waypoints[1].dive_time, 30.0);
        assert_eq!(dive.waypoints[1].depth, 10.5);
    }

    #[test]
    fn test_diver_and_equipment() {
        let dive = parse(FULL_UDDF).unwrap();

        assert_eq!(dive.diver.id, "owner-7");
        assert_eq!(dive.diver.first_name, "Mei");
        assert_eq!(dive.diver.last_name, "Lin");
        assert_eq!(dive.equipment.id, "dc-1");
        assert_eq!(dive.equipment.name, "Atmos Mission 1");
        assert_eq!(dive.equipment.manufacturer, "Atmos");
        assert_eq!(dive.equipment.model, "Mission1");
        assert_eq!(dive.equipment.serial_number, "SN-0042");
    }

    #[test]
    fn test_multi_dive_reads_first_metadata_and_all_waypoints() {
        let dive = parse(FULL_UDDF).unwrap();

        assert_eq!(dive.metadata.dive_number, 17);
        assert_eq!(dive.metadata.air_temperature, 28.5);
        assert_eq!(dive.metadata.surface_pressure, 101325.0);
        // The first dive has no summary block of its own.
        assert_eq!(dive.metadata.dive_duration, 0.0);
        assert_eq!(dive.waypoints.len(), 2);
        assert_eq!(dive.waypoints[1].dive_time, 10.0);
    }

    #[test]
    fn test_missing_fields_default() {
        let dive = parse("<uddf><dive><samples><waypoint><depth>4.2</depth></waypoint></samples></dive></uddf>")
            .unwrap();

        let wp = &dive.waypoints[0];
        assert_eq!(wp.dive_time, 0.0);
        assert_eq!(wp.depth, 4.2);
        assert_eq!(wp.temperature_raw, 0.0);
        assert_eq!(wp.temperature, -273.15);
        assert_eq!(dive.metadata.dive_number, 0);
        assert_eq!(dive.metadata.datetime, "");
        assert_eq!(dive.metadata.min_temperature, -273.15);
        assert_eq!(dive.diver, DiverInfo::default());
        assert_eq!(dive.equipment, EquipmentInfo::default());
    }

    #[test]
    fn test_non_numeric_fields() {
        let dive = parse(
            "<dive><waypoint><divetime>12s</divetime><depth>deep</depth></waypoint>\
             <informationbeforedive><divenumber>3.9</divenumber></informationbeforedive></dive>",
        )
        .unwrap();

        assert_eq!(dive.waypoints[0].dive_time, 12.0);
        assert_eq!(dive.waypoints[0].depth, 0.0);
        assert_eq!(dive.metadata.dive_number, 3);
    }

    #[test]
    fn test_invalid_xml() {
        let err = parse("invalid xml").unwrap_err();
        assert!(matches!(err, UddfError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to parse UDDF file: "));
    }

    #[test]
    fn test_deeply_nested_document_is_rejected() {
        let xml = format!("<dive>{}", "<a>".repeat(200_000));
        let err = parse(&xml).unwrap_err();
        assert!(matches!(err, UddfError::Parse { .. }));
    }

    #[test]
    fn test_missing_dive() {
        let err = parse("<uddf><profiledata/></uddf>").unwrap_err();
        assert_eq!(
            err,
            UddfError::Parse {
                message: "No dive data found in UDDF file".to_string()
            }
        );
    }

    #[test]
    fn test_parse_with_custom_reader() {
        let reader = |_: &str| -> Result<Document, XmlError> {
            Err(XmlError::new(0, "reader unavailable"))
        };
        let err = parse_with(&reader, SAMPLE_UDDF).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to parse UDDF file: invalid XML at byte 0: reader unavailable"
        );
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dive.uddf");
        fs::write(&path, SAMPLE_UDDF).unwrap();

        let dive = parse_file(&path).unwrap();
        assert_eq!(dive.waypoints.len(), 3);

        let err = parse_file(dir.path().join("missing.uddf")).unwrap_err();
        assert!(matches!(err, UddfError::Io { .. }));
    }

    #[test]
    fn test_number_prefixes() {
        assert_eq!(float_prefix("  10.5 m"), Some(10.5));
        assert_eq!(float_prefix("-3"), Some(-3.0));
        assert_eq!(float_prefix("1e2"), Some(100.0));
        assert_eq!(float_prefix("abc"), None);
        assert_eq!(float_prefix("12em"), Some(12.0));
        assert_eq!(float_prefix("5e"), Some(5.0));
        assert_eq!(float_prefix("-.5E+"), Some(-0.5));
        assert_eq!(float_prefix("e5"), None);
        assert_eq!(integer_prefix("42abc"), Some(42));
        assert_eq!(integer_prefix("-7"), Some(-7));
        assert_eq!(integer_prefix(""), None);
    }

    proptest! {
        #[test]
        fn prop_temperature_is_kelvin_minus_offset(kelvin in 0.0f64..400.0) {
            let xml = format!(
                "<dive><waypoint><temperature>{}</temperature></waypoint></dive>",
                kelvin
            );
            let dive = parse(&xml).unwrap();
            prop_assert_eq!(dive.waypoints[0].temperature_raw, kelvin);
            prop_assert_eq!(dive.waypoints[0].temperature, kelvin - 273.15);
        }
    }
}
