// Bootstrap core modules (always compiled, natively testable)
mod log;
pub mod module;
pub mod rom;
pub mod session;
pub mod status;
pub mod transport;

// WASM glue for web builds
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::*;
