//! ROM selection parsing and payload encoding.
//!
//! Dropdown options carry a small JSON record naming a ROM file; the selected
//! record is turned into a null-terminated `roms/<filename>` path, byte-encoded
//! for the runtime module's `load` entry point.

use serde::Deserialize;
use thiserror::Error;

/// Placeholder option that selects nothing.
pub const SENTINEL_OPTION: &str = "Select a ROM";

/// Directory prefix prepended to every ROM filename.
pub const ROM_DIR: &str = "roms/";

/// JSON record stored in each selectable dropdown option.
#[derive(Debug, Deserialize)]
struct RomOption {
    filename: String,
}

#[derive(Debug, Error)]
pub enum RomOptionError {
    #[error("malformed ROM option: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("ROM option has an empty filename")]
    EmptyFilename,
}

/// Null-terminated ROM path, encoded for the module's `load` entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomPayload {
    bytes: Vec<u8>,
}

impl RomPayload {
    fn from_filename(filename: &str) -> Self {
        let mut bytes = format!("{ROM_DIR}{filename}").into_bytes();
        bytes.push(0);
        RomPayload { bytes }
    }

    /// The encoded path, including the terminating null byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The path without the terminator, for logging.
    pub fn path(&self) -> &str {
        // Built from a valid string plus one null byte.
        std::str::from_utf8(&self.bytes[..self.bytes.len() - 1]).unwrap_or("")
    }
}

/// Parse a dropdown option value.
///
/// The sentinel option selects nothing and yields `Ok(None)`; any other value
/// must be a JSON record with a non-empty `filename` field.
pub fn parse_option(value: &str) -> Result<Option<RomPayload>, RomOptionError> {
    if value == SENTINEL_OPTION {
        return Ok(None);
    }

    let option: RomOption = serde_json::from_str(value)?;
    if option.filename.is_empty() {
        return Err(RomOptionError::EmptyFilename);
    }
    Ok(Some(RomPayload::from_filename(&option.filename)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_selects_nothing() {
        assert!(parse_option(SENTINEL_OPTION).unwrap().is_none());
    }

    #[test]
    fn test_valid_option_encodes_null_terminated_path() {
        let payload = parse_option(r#"{"filename":"pong"}"#).unwrap().unwrap();
        assert_eq!(payload.as_bytes(), b"roms/pong\0");
        assert_eq!(payload.path(), "roms/pong");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let payload = parse_option(r#"{"filename":"tetris","players":1}"#)
            .unwrap()
            .unwrap();
        assert_eq!(payload.as_bytes(), b"roms/tetris\0");
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            parse_option("not json"),
            Err(RomOptionError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_filename_is_an_error() {
        assert!(matches!(
            parse_option(r#"{"name":"pong"}"#),
            Err(RomOptionError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_filename_is_an_error() {
        assert!(matches!(
            parse_option(r#"{"filename":""}"#),
            Err(RomOptionError::EmptyFilename)
        ));
    }
}
