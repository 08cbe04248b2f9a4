//! Bootstrap session.
//!
//! [`Session`] is the application context tying ROM selection and the play/stop
//! control to the runtime module: it owns the module handle, the currently
//! loaded payload, and the transport state machine, and enforces that a payload
//! is loaded before the main loop may start.

use thiserror::Error;

use crate::module::{ModuleCallError, RuntimeModule};
use crate::rom::{self, RomOptionError, RomPayload};
use crate::transport::{Transport, TransportAction};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Rom(#[from] RomOptionError),
    #[error(transparent)]
    Module(#[from] ModuleCallError),
    #[error("no ROM has been loaded")]
    NoRomLoaded,
}

/// Result of handling a dropdown selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// A payload was loaded into the module.
    Loaded,
    /// The sentinel option was selected; nothing changed.
    Sentinel,
}

pub struct Session<M> {
    module: M,
    payload: Option<RomPayload>,
    transport: Transport,
}

impl<M: RuntimeModule> Session<M> {
    pub fn new(module: M) -> Self {
        Session {
            module,
            payload: None,
            transport: Transport::new(),
        }
    }

    /// Whether a payload has been loaded at least once. Drives the play
    /// control's enabled state.
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Current label for the play control.
    pub fn button_label(&self) -> &'static str {
        self.transport.button_label()
    }

    /// The payload currently loaded into the module, if any.
    pub fn payload(&self) -> Option<&RomPayload> {
        self.payload.as_ref()
    }

    /// Handle a dropdown selection: parse the option value, load the encoded
    /// payload into the module, and remember it. The payload is only stored
    /// once the module accepted it.
    pub fn select_rom(&mut self, option_value: &str) -> Result<SelectionOutcome, SessionError> {
        let Some(payload) = rom::parse_option(option_value)? else {
            return Ok(SelectionOutcome::Sentinel);
        };

        self.module.load(&payload)?;
        self.payload = Some(payload);
        Ok(SelectionOutcome::Loaded)
    }

    /// Handle a play-control activation. Invokes `main` or `stop` exactly once
    /// and flips the transport; a failed call leaves the transport unchanged.
    pub fn toggle_transport(&mut self) -> Result<TransportAction, SessionError> {
        if self.transport.is_running() {
            self.module.stop()?;
        } else {
            if self.payload.is_none() {
                return Err(SessionError::NoRomLoaded);
            }
            self.module.main()?;
        }
        Ok(self.transport.toggle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::STOP_RELOAD_DELAY_MS;
    use std::cell::RefCell;

    /// Records entry-point invocations; can be told to fail a named entry.
    #[derive(Default)]
    struct MockModule {
        calls: RefCell<Vec<String>>,
        fail_entry: Option<&'static str>,
    }

    impl MockModule {
        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn invoke(&self, entry: &str) -> Result<(), ModuleCallError> {
            if self.fail_entry == Some(entry) {
                return Err(ModuleCallError::CallFailed {
                    entry: entry.to_string(),
                    message: "injected failure".to_string(),
                });
            }
            self.calls.borrow_mut().push(entry.to_string());
            Ok(())
        }
    }

    impl RuntimeModule for MockModule {
        fn load(&self, payload: &RomPayload) -> Result<(), ModuleCallError> {
            self.invoke(&format!("load {}", payload.path()))
        }

        fn main(&self) -> Result<(), ModuleCallError> {
            self.invoke("main")
        }

        fn stop(&self) -> Result<(), ModuleCallError> {
            self.invoke("stop")
        }
    }

    #[test]
    fn test_sentinel_is_a_no_op() {
        let mut session = Session::new(MockModule::default());
        let outcome = session.select_rom("Select a ROM").unwrap();
        assert_eq!(outcome, SelectionOutcome::Sentinel);
        assert!(!session.has_payload());
        assert!(session.module.calls().is_empty());
    }

    #[test]
    fn test_selection_loads_payload_once() {
        let mut session = Session::new(MockModule::default());
        let outcome = session.select_rom(r#"{"filename":"pong"}"#).unwrap();
        assert_eq!(outcome, SelectionOutcome::Loaded);
        assert!(session.has_payload());
        assert_eq!(session.module.calls(), vec!["load roms/pong"]);
    }

    #[test]
    fn test_malformed_selection_changes_nothing() {
        let mut session = Session::new(MockModule::default());
        assert!(matches!(
            session.select_rom("garbage"),
            Err(SessionError::Rom(_))
        ));
        assert!(!session.has_payload());
        assert!(session.module.calls().is_empty());
    }

    #[test]
    fn test_failed_load_does_not_store_payload() {
        let module = MockModule {
            fail_entry: Some("load roms/pong"),
            ..Default::default()
        };
        let mut session = Session::new(module);
        assert!(matches!(
            session.select_rom(r#"{"filename":"pong"}"#),
            Err(SessionError::Module(_))
        ));
        assert!(!session.has_payload());
    }

    #[test]
    fn test_start_requires_a_loaded_payload() {
        let mut session = Session::new(MockModule::default());
        assert!(matches!(
            session.toggle_transport(),
            Err(SessionError::NoRomLoaded)
        ));
        assert!(session.module.calls().is_empty());
    }

    #[test]
    fn test_full_play_stop_cycle() {
        let mut session = Session::new(MockModule::default());
        session.select_rom(r#"{"filename":"pong"}"#).unwrap();

        assert_eq!(session.toggle_transport().unwrap(), TransportAction::Start);
        assert_eq!(session.button_label(), "Stop");

        assert_eq!(
            session.toggle_transport().unwrap(),
            TransportAction::StopAndReload {
                delay_ms: STOP_RELOAD_DELAY_MS
            }
        );
        assert_eq!(session.button_label(), "Start");

        assert_eq!(
            session.module.calls(),
            vec!["load roms/pong", "main", "stop"]
        );
    }

    #[test]
    fn test_failed_main_leaves_transport_stopped() {
        let module = MockModule {
            fail_entry: Some("main"),
            ..Default::default()
        };
        let mut session = Session::new(module);
        session.select_rom(r#"{"filename":"pong"}"#).unwrap();

        assert!(matches!(
            session.toggle_transport(),
            Err(SessionError::Module(_))
        ));
        assert!(!session.transport().is_running());
        assert_eq!(session.button_label(), "Start");
    }

    #[test]
    fn test_reselection_replaces_payload() {
        let mut session = Session::new(MockModule::default());
        session.select_rom(r#"{"filename":"pong"}"#).unwrap();
        session.select_rom(r#"{"filename":"tetris"}"#).unwrap();
        assert_eq!(session.payload().unwrap().as_bytes(), b"roms/tetris\0");
        assert_eq!(
            session.module.calls(),
            vec!["load roms/pong", "load roms/tetris"]
        );
    }
}
