use thiserror::Error;

/// Error returned by the UDDF parser.
///
/// Every failure inside the parser is folded into one of these variants so a
/// caller only ever matches on a single error type. No partially parsed dive
/// accompanies an error.
#[derive(Error, Debug, Clone, PartialEq, uniffi::Error)]
pub enum UddfError {
    #[error("Failed to parse UDDF file: {message}")]
    Parse { message: String },

    #[error("Failed to read file: {message}")]
    Io { message: String },

    #[error("Failed to serialize dive: {message}")]
    Serialize { message: String },
}

impl UddfError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        UddfError::Parse {
            message: message.into(),
        }
    }
}

impl From<XmlError> for UddfError {
    fn from(err: XmlError) -> Self {
        UddfError::parse(err.to_string())
    }
}

impl From<serde_json::Error> for UddfError {
    fn from(err: serde_json::Error) -> Self {
        UddfError::Serialize {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for UddfError {
    fn from(err: std::io::Error) -> Self {
        UddfError::Io {
            message: err.to_string(),
        }
    }
}

/// Well-formedness error raised by the XML reader.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid XML at byte {position}: {message}")]
pub struct XmlError {
    pub position: usize,
    pub message: String,
}

impl XmlError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Error type for settings and export configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid resolution '{0}': expected WIDTHxHEIGHT")]
    InvalidResolution(String),

    #[error("invalid settings file: {0}")]
    Toml(String),

    #[error("settings IO: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uddf_error_display() {
        let err = UddfError::parse("no dive data found");
        assert_eq!(
            err.to_string(),
            "Failed to parse UDDF file: no dive data found"
        );

        let err = UddfError::Io {
            message: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to read file: permission denied");
    }

    #[test]
    fn test_xml_error_wraps_into_parse_error() {
        let err: UddfError = XmlError::new(3, "mismatched end tag").into();
        assert_eq!(
            err,
            UddfError::Parse {
                message: "invalid XML at byte 3: mismatched end tag".to_string()
            }
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidResolution("1920by1080".to_string());
        assert_eq!(
            err.to_string(),
            "invalid resolution '1920by1080': expected WIDTHxHEIGHT"
        );
    }
}
