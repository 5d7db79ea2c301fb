//! Uplink (`mac tx`) with downlink demultiplexing.

use tracing::{info, instrument, warn};

use super::downlink::{DownlinkMessage, demultiplex};
use super::{EngineError, EngineResult, PollResult, PollStep, Rn2483};
use crate::config::Operation;
use crate::events::{LinkEvent, LinkObserver};
use crate::protocol::{
    AsyncEvent, Command, ErrorCode, MAX_APP_PORT, MIN_APP_PORT, Outcome, UPLINK_CONFIRMED,
    UPLINK_UNCONFIRMED, classify,
};
use crate::state::UplinkState;
use crate::transport::LineTransport;

impl<T: LineTransport, O: LinkObserver> Rn2483<T, O> {
    fn goto_uplink(&self, state: &mut UplinkState, next: UplinkState) {
        info!(from = %state, to = %next, "Uplink state transition");
        self.emit(LinkEvent::UplinkStateChanged {
            from: *state,
            to: next,
        });
        *state = next;
    }

    /// Transmit `data` on application `port` (1..=223).
    ///
    /// A `mac_rx` answer ends the transaction successfully; its payload is
    /// decoded and dropped. Use [`Rn2483::transmit_with`] to receive it.
    pub fn transmit(&mut self, confirmed: bool, port: u8, data: &[u8]) -> EngineResult<UplinkState> {
        self.transmit_inner(confirmed, port, data, None)
    }

    /// Like [`Rn2483::transmit`], handing any downlink to `on_downlink`.
    ///
    /// The handler runs on the calling thread before this returns, so it
    /// must not block for long.
    pub fn transmit_with<F>(
        &mut self,
        confirmed: bool,
        port: u8,
        data: &[u8],
        mut on_downlink: F,
    ) -> EngineResult<UplinkState>
    where
        F: FnMut(DownlinkMessage),
    {
        let handler: &mut dyn FnMut(DownlinkMessage) = &mut on_downlink;
        self.transmit_inner(confirmed, port, data, Some(handler))
    }

    #[instrument(skip(self, data, on_downlink), fields(len = data.len()))]
    fn transmit_inner(
        &mut self,
        confirmed: bool,
        port: u8,
        data: &[u8],
        mut on_downlink: Option<&mut dyn FnMut(DownlinkMessage)>,
    ) -> EngineResult<UplinkState> {
        if !(MIN_APP_PORT..=MAX_APP_PORT).contains(&port) {
            return Err(EngineError::InvalidArgument(format!(
                "port {} outside [{}, {}]",
                port, MIN_APP_PORT, MAX_APP_PORT
            )));
        }
        if data.is_empty() {
            return Err(EngineError::InvalidArgument(
                "refusing to send zero bytes".into(),
            ));
        }

        let uplink_type = if confirmed {
            UPLINK_CONFIRMED
        } else {
            UPLINK_UNCONFIRMED
        };
        let command = Command::mac("tx")
            .arg(uplink_type)
            .arg(port)
            .hex_arg(data)
            .build();
        let mut state = UplinkState::Sent;

        self.expect_ok(&command)?;
        self.goto_uplink(&mut state, UplinkState::WaitingForConfirmation);

        let observer = self.observer_handle();
        let policy = self.config().poll_policy(Operation::Uplink);
        let result = self.poll_event(Operation::Uplink, policy, |line| match classify(line) {
            Outcome::NamedError(ErrorCode::MacErr) => PollStep::Done(UplinkState::RadioError),
            Outcome::NamedError(ErrorCode::InvalidDataLen) => {
                PollStep::Done(UplinkState::InvalidLength)
            }
            Outcome::Event(AsyncEvent::MacTxOk) => PollStep::Done(UplinkState::Confirmed),
            Outcome::Event(AsyncEvent::MacRx { args }) => {
                demultiplex(&args, observer.as_ref(), on_downlink.as_deref_mut());
                PollStep::Done(UplinkState::DownlinkReceived)
            }
            _ => {
                warn!(answer = %line, "Uplink rejected");
                PollStep::Done(UplinkState::Rejected)
            }
        })?;

        let terminal = match result {
            PollResult::Completed(terminal) => terminal,
            PollResult::TimedOut { .. } => UplinkState::TimedOut,
        };
        self.goto_uplink(&mut state, terminal);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::engine;
    use crate::engine::{DownlinkMessage, EngineError};
    use crate::events::LinkEvent;
    use crate::protocol::ErrorCode;
    use crate::state::UplinkState;

    #[test]
    fn test_uplink_confirmed() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "mac_tx_ok"]);

        let state = rn.transmit(true, 1, b"hello").unwrap();

        assert_eq!(state, UplinkState::Confirmed);
        assert_eq!(mock.get_writes(), vec!["mac tx cnf 1 68656C6C6F"]);
    }

    #[test]
    fn test_uplink_unconfirmed_command() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "mac_tx_ok"]);
        rn.transmit(false, 223, &[0x01, 0xAB]).unwrap();
        assert_eq!(mock.get_writes(), vec!["mac tx uncnf 223 01AB"]);
    }

    #[test]
    fn test_uplink_mac_err_skips_callback() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "mac_err"]);
        let mut calls = 0;

        let state = rn
            .transmit_with(true, 1, b"x", |_: DownlinkMessage| calls += 1)
            .unwrap();

        assert_eq!(state, UplinkState::RadioError);
        assert!(!state.is_success());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_uplink_invalid_data_len() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "invalid_data_len"]);
        assert_eq!(rn.transmit(true, 1, b"x").unwrap(), UplinkState::InvalidLength);
    }

    #[test]
    fn test_uplink_downlink_invokes_callback_once() {
        let (mut rn, mock, observer) = engine();
        mock.queue_lines(&["ok", "mac_rx 1 7265636569766564", "mac_tx_ok"]);
        let mut received = Vec::new();

        let state = rn
            .transmit_with(true, 1, b"ping", |msg: DownlinkMessage| received.push(msg))
            .unwrap();

        assert_eq!(state, UplinkState::DownlinkReceived);
        assert!(state.is_success());
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].port, 1);
        assert_eq!(received[0].payload, b"received");
        // Does not keep waiting for a confirmation after the downlink.
        assert_eq!(mock.pending(), 1);
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, LinkEvent::Downlink { port: 1, length: 8 })));
    }

    #[test]
    fn test_uplink_malformed_downlink_still_succeeds() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "mac_rx 1 NOTHEX"]);
        let mut calls = 0;

        let state = rn
            .transmit_with(true, 1, b"x", |_: DownlinkMessage| calls += 1)
            .unwrap();

        assert_eq!(state, UplinkState::DownlinkReceived);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_uplink_downlink_without_handler() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "mac_rx 5 00"]);
        assert_eq!(rn.transmit(false, 1, b"x").unwrap(), UplinkState::DownlinkReceived);
    }

    #[test]
    fn test_uplink_unknown_line_rejected() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "strange"]);
        assert_eq!(rn.transmit(true, 1, b"x").unwrap(), UplinkState::Rejected);
    }

    #[test]
    fn test_uplink_times_out() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("ok");
        mock.queue_silence(2);
        assert_eq!(rn.transmit(true, 1, b"x").unwrap(), UplinkState::TimedOut);
    }

    #[test]
    fn test_uplink_not_joined_ack() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("not_joined");
        let err = rn.transmit(true, 1, b"x").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotJoined));
        assert_eq!(mock.read_count(), 1);
    }

    #[test]
    fn test_uplink_validates_before_writing() {
        let (mut rn, mock, _) = engine();
        assert!(matches!(
            rn.transmit(true, 0, b"x"),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            rn.transmit(true, 224, b"x"),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            rn.transmit(true, 1, b""),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(mock.get_writes().is_empty());
    }
}
