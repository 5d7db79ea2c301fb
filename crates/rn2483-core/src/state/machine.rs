//! Transaction state machines and engine-owned module state.

use std::fmt;
use std::time::{Duration, Instant};

use crate::protocol::PAUSE_MARGIN;

/// State of a single `mac join` transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    /// Command written, acknowledgement pending.
    Requested,
    /// Acknowledged with `ok`, polling for the network's answer.
    WaitingForAccept,
    Accepted,
    /// Any other terminal answer, `denied` included.
    Denied,
    TimedOut,
}

impl JoinState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JoinState::Accepted | JoinState::Denied | JoinState::TimedOut
        )
    }

    pub fn is_accepted(&self) -> bool {
        *self == JoinState::Accepted
    }
}

impl fmt::Display for JoinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinState::Requested => write!(f, "REQUESTED"),
            JoinState::WaitingForAccept => write!(f, "WAITING_FOR_ACCEPT"),
            JoinState::Accepted => write!(f, "ACCEPTED"),
            JoinState::Denied => write!(f, "DENIED"),
            JoinState::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}

/// State of a single `mac tx` transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UplinkState {
    /// Command written, acknowledgement pending.
    Sent,
    /// Acknowledged with `ok`, polling for the transmission result.
    WaitingForConfirmation,
    /// `mac_tx_ok`.
    Confirmed,
    /// `mac_rx`; the downlink was handed to the callback.
    DownlinkReceived,
    /// `mac_err`.
    RadioError,
    /// `invalid_data_len`.
    InvalidLength,
    /// Any other terminal line.
    Rejected,
    TimedOut,
}

impl UplinkState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UplinkState::Sent | UplinkState::WaitingForConfirmation)
    }

    /// The module completed the uplink.
    pub fn is_success(&self) -> bool {
        matches!(self, UplinkState::Confirmed | UplinkState::DownlinkReceived)
    }
}

impl fmt::Display for UplinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UplinkState::Sent => write!(f, "SENT"),
            UplinkState::WaitingForConfirmation => write!(f, "WAITING_FOR_CONFIRMATION"),
            UplinkState::Confirmed => write!(f, "CONFIRMED"),
            UplinkState::DownlinkReceived => write!(f, "DOWNLINK_RECEIVED"),
            UplinkState::RadioError => write!(f, "RADIO_ERROR"),
            UplinkState::InvalidLength => write!(f, "INVALID_LENGTH"),
            UplinkState::Rejected => write!(f, "REJECTED"),
            UplinkState::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}

/// Runtime state of the module as seen by the engine.
///
/// Owned by the engine instance and handed by reference to the operations
/// that consult or update it.
#[derive(Debug, Default)]
pub struct ModuleState {
    /// When the paused LoRaWAN stack resumes on its own.
    paused_until: Option<Instant>,
}

impl ModuleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `mac pause` that lasts `length`.
    pub fn pause(&mut self, length: Duration) {
        let until = Instant::now().checked_add(length);
        tracing::info!(length_ms = length.as_millis() as u64, "LoRaWAN stack paused");
        self.paused_until = until;
    }

    /// Record that the stack is running again.
    pub fn resume(&mut self) {
        if self.paused_until.take().is_some() {
            tracing::info!("LoRaWAN stack resumed");
        }
    }

    /// True while the stack is paused.
    pub fn is_paused(&self) -> bool {
        self.paused_until
            .is_some_and(|until| Instant::now() < until)
    }

    /// True if the pause still covers an operation of `length`, with a
    /// small safety margin.
    pub fn is_paused_for(&self, length: Duration) -> bool {
        let Some(until) = self.paused_until else {
            return false;
        };
        Instant::now()
            .checked_add(length)
            .and_then(|t| t.checked_add(PAUSE_MARGIN))
            .is_some_and(|t| t < until)
    }

    /// Time left in the current pause.
    pub fn remaining_pause(&self) -> Option<Duration> {
        self.paused_until
            .and_then(|until| until.checked_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_terminal_states() {
        assert!(!JoinState::Requested.is_terminal());
        assert!(!JoinState::WaitingForAccept.is_terminal());
        assert!(JoinState::Denied.is_terminal());
        assert!(JoinState::Accepted.is_accepted());
    }

    #[test]
    fn test_uplink_success_states() {
        assert!(UplinkState::Confirmed.is_success());
        assert!(UplinkState::DownlinkReceived.is_success());
        assert!(!UplinkState::RadioError.is_success());
        assert!(UplinkState::TimedOut.is_terminal());
        assert!(!UplinkState::Sent.is_terminal());
    }

    #[test]
    fn test_module_pause_window() {
        let mut state = ModuleState::new();
        assert!(!state.is_paused());

        state.pause(Duration::from_secs(60));
        assert!(state.is_paused());
        assert!(state.is_paused_for(Duration::from_secs(1)));
        assert!(!state.is_paused_for(Duration::from_secs(120)));

        state.resume();
        assert!(!state.is_paused());
        assert_eq!(state.remaining_pause(), None);
    }

    #[test]
    fn test_module_zero_pause() {
        let mut state = ModuleState::new();
        state.pause(Duration::ZERO);
        assert!(!state.is_paused_for(Duration::ZERO));
    }

    #[test]
    fn test_module_pause_huge_length_does_not_overflow() {
        let mut state = ModuleState::new();
        state.pause(Duration::from_secs(60));
        assert!(!state.is_paused_for(Duration::MAX));
    }
}
