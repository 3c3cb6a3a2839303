//! Settings and directive errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read, write or validate a settings file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write settings file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value is out of range
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: &'static str, reason: &'static str },

    /// Only `.json` and `.toml` files are understood
    #[error("Unsupported settings format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Malformed JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed TOML settings: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Cannot encode settings as TOML: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

/// A `;P2PP` directive that could not be applied
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectiveError {
    #[error("Unknown directive: {0}")]
    UnknownKey(String),

    #[error("Invalid value for directive '{key}': '{value}'")]
    InvalidValue { key: String, value: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

pub type DirectiveResult<T> = Result<T, DirectiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_error_display() {
        let err = SettingsError::Read {
            path: PathBuf::from("/tmp/missing.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(
            err.to_string(),
            "Cannot read settings file /tmp/missing.toml: not found"
        );

        let err = SettingsError::InvalidSetting {
            key: "printer.layer_height",
            reason: "must be > 0",
        };
        assert_eq!(err.to_string(), "Invalid setting 'printer.layer_height': must be > 0");
    }

    #[test]
    fn test_directive_error_display() {
        let err = DirectiveError::InvalidValue {
            key: "SPLICEOFFSET".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for directive 'SPLICEOFFSET': 'abc'");
    }
}
