//! Foreign call interface of the runtime module.
//!
//! The emulator runtime is an Emscripten artifact reached through a generic
//! invoke-by-name surface: an entry point name, a return-kind tag, and a list
//! of kind-tagged argument values. Only three entry points are used.

use thiserror::Error;

use crate::rom::RomPayload;

pub const ENTRY_LOAD: &str = "load";
pub const ENTRY_MAIN: &str = "main";
pub const ENTRY_STOP: &str = "stop";

/// Return-kind tag for a foreign call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Void,
    Number,
    Str,
}

impl ReturnKind {
    /// The ccall type string, or `None` for a void return.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            ReturnKind::Void => None,
            ReturnKind::Number => Some("number"),
            ReturnKind::Str => Some("string"),
        }
    }
}

/// A kind-tagged argument value for a foreign call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallValue<'a> {
    Number(f64),
    Str(&'a str),
    Bytes(&'a [u8]),
}

impl CallValue<'_> {
    /// The ccall type string for this argument.
    pub fn kind(&self) -> &'static str {
        match self {
            CallValue::Number(_) => "number",
            CallValue::Str(_) => "string",
            CallValue::Bytes(_) => "array",
        }
    }
}

#[derive(Debug, Error)]
pub enum ModuleCallError {
    #[error("runtime module is not available on the page")]
    MissingModule,
    #[error("runtime module has no ccall binding")]
    MissingCcall,
    #[error("call to entry point `{entry}` failed: {message}")]
    CallFailed { entry: String, message: String },
}

/// The runtime module's entry points, as used by the bootstrap.
///
/// The production implementation dispatches through Emscripten's `ccall`; the
/// trait seam keeps the session logic testable without a page.
pub trait RuntimeModule {
    /// Load a ROM payload into the module.
    fn load(&self, payload: &RomPayload) -> Result<(), ModuleCallError>;

    /// Start the module's main loop.
    fn main(&self) -> Result<(), ModuleCallError>;

    /// Stop the module's main loop.
    fn stop(&self) -> Result<(), ModuleCallError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_kind_strings() {
        assert_eq!(ReturnKind::Void.as_str(), None);
        assert_eq!(ReturnKind::Number.as_str(), Some("number"));
        assert_eq!(ReturnKind::Str.as_str(), Some("string"));
    }

    #[test]
    fn test_call_value_kinds() {
        assert_eq!(CallValue::Number(1.0).kind(), "number");
        assert_eq!(CallValue::Str("x").kind(), "string");
        assert_eq!(CallValue::Bytes(b"x").kind(), "array");
    }
}
