//! Raw radio transmit (`radio tx`) and blocking receive (`radio rx`).
//!
//! Both need the LoRaWAN stack paused first (`mac pause`); otherwise the
//! module answers `busy`.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::downlink::parse_radio_rx;
use super::{EngineError, EngineResult, PollResult, PollStep, Rn2483};
use crate::config::Operation;
use crate::events::LinkObserver;
use crate::protocol::{AsyncEvent, Command, MAX_RADIO_PAYLOAD, Outcome, classify};
use crate::transport::LineTransport;

/// Map a line seen while waiting for a radio event. Stray acknowledgements
/// and events belonging to other operations are skipped.
fn radio_step<R>(
    command: &Command,
    line: &str,
    on_event: impl FnOnce(AsyncEvent) -> Option<EngineResult<R>>,
) -> PollStep<EngineResult<R>> {
    match classify(line) {
        Outcome::Event(event) => match on_event(event) {
            Some(result) => PollStep::Done(result),
            None => PollStep::Continue,
        },
        Outcome::NamedError(code) => PollStep::Done(Err(EngineError::Rejected {
            command: command.to_string(),
            code,
        })),
        Outcome::InvalidParameter => PollStep::Done(Err(EngineError::InvalidParameter {
            command: command.to_string(),
        })),
        Outcome::Unrecognized(line) => PollStep::Done(Err(EngineError::Unrecognized {
            command: command.to_string(),
            line,
        })),
        Outcome::Ack(_) => PollStep::Continue,
    }
}

impl<T: LineTransport, O: LinkObserver> Rn2483<T, O> {
    fn warn_if_stack_running(&self, operation: Operation) {
        if !self.state().is_paused() {
            debug!(
                operation = operation.as_str(),
                "LoRaWAN stack not paused; module may answer busy"
            );
        }
    }

    /// Transmit a raw radio packet and wait for `radio_tx_ok`.
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub fn radio_tx(&mut self, data: &[u8]) -> EngineResult<()> {
        if data.is_empty() {
            return Err(EngineError::InvalidArgument(
                "refusing to send zero bytes".into(),
            ));
        }
        if data.len() > MAX_RADIO_PAYLOAD {
            return Err(EngineError::InvalidArgument(format!(
                "payload of {} bytes exceeds {}",
                data.len(),
                MAX_RADIO_PAYLOAD
            )));
        }
        self.warn_if_stack_running(Operation::RadioTx);

        let command = Command::radio("tx").hex_arg(data).build();
        self.expect_ok(&command)?;

        let policy = self.config().poll_policy(Operation::RadioTx);
        let result = self.poll_event(Operation::RadioTx, policy, |line| {
            radio_step(&command, line, |event| match event {
                AsyncEvent::RadioTxOk => Some(Ok(())),
                _ => None,
            })
        })?;

        match result {
            PollResult::Completed(outcome) => {
                if let Err(e) = &outcome {
                    warn!(error = %e, "Radio transmit failed");
                }
                outcome
            }
            PollResult::TimedOut { elapsed } => Err(EngineError::Timeout {
                operation: Operation::RadioTx.as_str(),
                after: elapsed,
            }),
        }
    }

    /// Open the receiver for `window` and block until a packet arrives.
    ///
    /// `window` is in symbols (LoRa) or milliseconds (FSK); `0` asks the
    /// module for continuous reception. The wait is always bounded: by
    /// `deadline` when given, otherwise by the configured receive timeout.
    #[instrument(skip(self))]
    pub fn radio_rx(&mut self, window: u16, deadline: Option<Duration>) -> EngineResult<Vec<u8>> {
        self.warn_if_stack_running(Operation::RadioRx);

        let command = Command::radio("rx").arg(window).build();
        self.expect_ok(&command)?;

        let mut policy = self.config().poll_policy(Operation::RadioRx);
        if let Some(deadline) = deadline {
            policy = policy.with_deadline(deadline);
        }

        let result = self.poll_event(Operation::RadioRx, policy, |line| {
            radio_step(&command, line, |event| match event {
                AsyncEvent::RadioRx { args } => {
                    Some(parse_radio_rx(&args).map_err(EngineError::from))
                }
                _ => None,
            })
        })?;

        match result {
            PollResult::Completed(outcome) => outcome,
            PollResult::TimedOut { elapsed } => Err(EngineError::Timeout {
                operation: Operation::RadioRx.as_str(),
                after: elapsed,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::EngineError;
    use crate::engine::test_support::{SHORT, engine};
    use crate::protocol::ErrorCode;

    #[test]
    fn test_radio_tx_success() {
        let (mut rn, mock, _) = engine();
        mock.queue_raw(b"ok\r\n");
        mock.queue_raw(b"radio_tx_ok\r\n");

        assert!(rn.radio_tx(b"hi").is_ok());
        assert_eq!(mock.get_writes(), vec!["radio tx 6869"]);
    }

    #[test]
    fn test_radio_tx_radio_err() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "radio_err"]);
        let err = rn.radio_tx(b"hi").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::RadioErr));
    }

    #[test]
    fn test_radio_tx_skips_stray_ack() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "ok", "radio_tx_ok"]);
        assert!(rn.radio_tx(b"hi").is_ok());
    }

    #[test]
    fn test_radio_tx_timeout() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("ok");
        let err = rn.radio_tx(b"hi").unwrap_err();
        assert!(matches!(err, EngineError::Timeout { operation: "radio tx", .. }));
    }

    #[test]
    fn test_radio_tx_rejects_bad_length() {
        let (mut rn, mock, _) = engine();
        assert!(rn.radio_tx(&[]).is_err());
        assert!(rn.radio_tx(&[0u8; 256]).is_err());
        assert!(mock.get_writes().is_empty());
    }

    #[test]
    fn test_radio_rx_returns_payload() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("ok");
        mock.queue_silence(2);
        mock.queue_line("radio_rx  48656C6C6F");

        assert_eq!(rn.radio_rx(0, None).unwrap(), b"Hello");
        assert_eq!(mock.get_writes(), vec!["radio rx 0"]);
    }

    #[test]
    fn test_radio_rx_busy() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("busy");
        let err = rn.radio_rx(100, None).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Busy));
        assert_eq!(mock.read_count(), 1);
    }

    #[test]
    fn test_radio_rx_radio_err() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "radio_err"]);
        assert_eq!(rn.radio_rx(100, None).unwrap_err().code(), Some(ErrorCode::RadioErr));
    }

    #[test]
    fn test_radio_rx_malformed_payload() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "radio_rx  XYZ"]);
        assert!(matches!(
            rn.radio_rx(100, None),
            Err(EngineError::Malformed(_))
        ));
    }

    #[test]
    fn test_radio_rx_continuous_is_bounded_by_caller_deadline() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("ok");
        let err = rn.radio_rx(0, Some(SHORT)).unwrap_err();
        assert!(matches!(err, EngineError::Timeout { after, .. } if after >= SHORT));
    }
}
