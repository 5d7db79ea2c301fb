//! Network join (`mac join`).

use tracing::{info, instrument, warn};

use super::{EngineResult, PollResult, PollStep, Rn2483};
use crate::config::Operation;
use crate::events::{LinkEvent, LinkObserver};
use crate::protocol::{AsyncEvent, Command, JoinMode, Outcome, classify};
use crate::state::JoinState;
use crate::transport::LineTransport;

impl<T: LineTransport, O: LinkObserver> Rn2483<T, O> {
    fn goto_join(&self, state: &mut JoinState, next: JoinState) {
        info!(from = %state, to = %next, "Join state transition");
        self.emit(LinkEvent::JoinStateChanged {
            from: *state,
            to: next,
        });
        *state = next;
    }

    /// Join the configured network.
    ///
    /// Returns the terminal [`JoinState`]. An acknowledgement other than
    /// `ok` fails immediately without polling.
    #[instrument(skip(self))]
    pub fn join(&mut self, mode: JoinMode) -> EngineResult<JoinState> {
        let command = Command::mac("join").arg(mode).build();
        let mut state = JoinState::Requested;

        self.expect_ok(&command)?;
        self.goto_join(&mut state, JoinState::WaitingForAccept);

        let policy = self.config().poll_policy(Operation::Join);
        let result = self.poll_event(Operation::Join, policy, |line| match classify(line) {
            Outcome::Event(AsyncEvent::JoinAccepted) => PollStep::Done(JoinState::Accepted),
            _ => {
                warn!(answer = %line, "Join not accepted");
                PollStep::Done(JoinState::Denied)
            }
        })?;

        let terminal = match result {
            PollResult::Completed(terminal) => terminal,
            PollResult::TimedOut { .. } => JoinState::TimedOut,
        };
        self.goto_join(&mut state, terminal);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::EngineError;
    use crate::engine::test_support::engine;
    use crate::events::LinkEvent;
    use crate::protocol::{ErrorCode, JoinMode};
    use crate::state::JoinState;

    #[test]
    fn test_join_accepted() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "accepted"]);

        assert_eq!(rn.join(JoinMode::Otaa).unwrap(), JoinState::Accepted);
        assert_eq!(mock.get_writes(), vec!["mac join otaa"]);
    }

    #[test]
    fn test_join_denied() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "denied"]);
        assert_eq!(rn.join(JoinMode::Abp).unwrap(), JoinState::Denied);
    }

    #[test]
    fn test_join_unknown_answer_is_denied() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["ok", "something_else"]);
        assert_eq!(rn.join(JoinMode::Otaa).unwrap(), JoinState::Denied);
    }

    #[test]
    fn test_join_waits_through_silence() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("ok");
        mock.queue_silence(3);
        mock.queue_line("accepted");
        assert_eq!(rn.join(JoinMode::Otaa).unwrap(), JoinState::Accepted);
    }

    #[test]
    fn test_join_times_out() {
        let (mut rn, mock, observer) = engine();
        mock.queue_line("ok");

        assert_eq!(rn.join(JoinMode::Otaa).unwrap(), JoinState::TimedOut);
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, LinkEvent::TimedOut { operation: "mac join", .. })));
    }

    #[test]
    fn test_join_invalid_param_skips_poll() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["invalid_param", "accepted"]);

        let err = rn.join(JoinMode::Otaa).unwrap_err();

        assert!(matches!(err, EngineError::InvalidParameter { .. }));
        assert_eq!(mock.read_count(), 1);
        assert_eq!(mock.pending(), 1);
    }

    #[test]
    fn test_join_rejected_ack() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("keys_not_init");
        let err = rn.join(JoinMode::Otaa).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::KeysNotInit));
    }

    #[test]
    fn test_join_reports_transitions() {
        let (mut rn, mock, observer) = engine();
        mock.queue_lines(&["ok", "accepted"]);
        rn.join(JoinMode::Otaa).unwrap();

        let transitions: Vec<_> = observer
            .events()
            .into_iter()
            .filter_map(|e| match e {
                LinkEvent::JoinStateChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            transitions,
            vec![
                (JoinState::Requested, JoinState::WaitingForAccept),
                (JoinState::WaitingForAccept, JoinState::Accepted),
            ]
        );
    }
}
