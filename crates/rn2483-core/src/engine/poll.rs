//! Poll-until-event loop.
//!
//! Long-running operations (join, uplink, radio transmit and receive) share
//! one polling shape: after the immediate acknowledgement, poll the
//! transport once per tick until a line classifies as terminal or the
//! deadline passes. The deadline is measured from loop entry on the
//! monotonic clock, independent of tick phase.

use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::protocol::sanitize_text;
use crate::transport::{LineTransport, TransportError};

/// Polling cadence and overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub tick: Duration,
    pub deadline: Duration,
}

impl PollPolicy {
    pub fn new(tick: Duration, deadline: Duration) -> Self {
        Self { tick, deadline }
    }

    /// Same cadence, different deadline.
    pub fn with_deadline(self, deadline: Duration) -> Self {
        Self { deadline, ..self }
    }
}

/// Verdict of the per-line step function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<R> {
    /// Terminal: stop polling with this result.
    Done(R),
    /// Not terminal: keep polling.
    Continue,
}

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult<R> {
    Completed(R),
    TimedOut { elapsed: Duration },
}

/// Poll `transport` until `step` returns [`PollStep::Done`] or the deadline
/// elapses.
///
/// Each iteration sleeps one tick (clamped to the time left), then performs
/// one read. Empty reads never reach `step`. A read error ends the loop.
pub fn poll_until<T, R, F>(
    transport: &mut T,
    policy: PollPolicy,
    mut step: F,
) -> Result<PollResult<R>, TransportError>
where
    T: LineTransport + ?Sized,
    F: FnMut(&str) -> PollStep<R>,
{
    let started = Instant::now();
    let mut polls = 0u64;

    loop {
        let remaining = policy.deadline.saturating_sub(started.elapsed());
        thread::sleep(policy.tick.min(remaining));

        polls += 1;
        let raw = transport.read_line()?;
        if !raw.is_empty() {
            let line = sanitize_text(&raw);
            trace!(poll = polls, line = %line, "Poll read");
            if let PollStep::Done(result) = step(&line) {
                return Ok(PollResult::Completed(result));
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.deadline {
            trace!(polls, elapsed_ms = elapsed.as_millis() as u64, "Poll deadline reached");
            return Ok(PollResult::TimedOut { elapsed });
        }
    }
}
