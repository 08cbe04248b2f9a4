//! Play/stop control state machine.
//!
//! The runtime module has no in-place reset, so leaving the running state
//! always ends in a full page reload after a short delay.

/// Delay between invoking the module's `stop` entry point and reloading the
/// page, giving the module time to tear down its main loop.
pub const STOP_RELOAD_DELAY_MS: i32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

/// Effect the control driver must apply after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    /// The module's main loop was started.
    Start,
    /// The module was stopped; reload the page after `delay_ms`.
    StopAndReload { delay_ms: i32 },
}

pub struct Transport {
    state: TransportState,
}

impl Transport {
    pub fn new() -> Self {
        Transport {
            state: TransportState::Stopped,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    /// Flip the state and report the action to perform.
    pub fn toggle(&mut self) -> TransportAction {
        match self.state {
            TransportState::Stopped => {
                self.state = TransportState::Running;
                TransportAction::Start
            }
            TransportState::Running => {
                self.state = TransportState::Stopped;
                TransportAction::StopAndReload {
                    delay_ms: STOP_RELOAD_DELAY_MS,
                }
            }
        }
    }

    /// Label shown on the play control for the current state.
    pub fn button_label(&self) -> &'static str {
        match self.state {
            TransportState::Stopped => "Start",
            TransportState::Running => "Stop",
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_stopped() {
        let transport = Transport::new();
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.button_label(), "Start");
    }

    #[test]
    fn test_toggle_cycles_through_states() {
        let mut transport = Transport::new();

        assert_eq!(transport.toggle(), TransportAction::Start);
        assert!(transport.is_running());
        assert_eq!(transport.button_label(), "Stop");

        assert_eq!(
            transport.toggle(),
            TransportAction::StopAndReload {
                delay_ms: STOP_RELOAD_DELAY_MS
            }
        );
        assert!(!transport.is_running());
        assert_eq!(transport.button_label(), "Start");

        // No terminal state; the cycle repeats.
        assert_eq!(transport.toggle(), TransportAction::Start);
    }
}
