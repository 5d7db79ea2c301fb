//! Transaction engine - one command at a time over an exclusively owned transport.
//!
//! [`Rn2483::execute`] is the single primitive every operation is built on:
//! one write, one read, no retries. Long-running operations then hand off to
//! the poll loop in [`poll`].

pub mod downlink;
pub mod error;
pub mod join;
pub mod poll;
pub mod receive;
pub mod uplink;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ModuleConfig, Operation};
use crate::events::{LinkEvent, LinkObserver, LogLevel, TracingObserver};
use crate::protocol::{Command, Outcome, RESP_INVALID_PARAM, RESP_OK, classify, sanitize_text};
use crate::state::ModuleState;
use crate::transport::{LineTransport, ObservableTransport};

pub use downlink::{DownlinkMessage, MalformedEvent};
pub use error::{EngineError, EngineResult};
pub use poll::{PollPolicy, PollResult, PollStep, poll_until};

/// Driver for one RN2483 module.
pub struct Rn2483<T: LineTransport, O: LinkObserver = TracingObserver> {
    transport: T,
    observer: Arc<O>,
    config: ModuleConfig,
    state: ModuleState,
}

impl<T: LineTransport> Rn2483<T, TracingObserver> {
    /// Create an engine with the default tracing observer.
    pub fn new(transport: T, config: ModuleConfig) -> Self {
        Self::with_observer(transport, config, Arc::new(TracingObserver))
    }
}

impl<T: LineTransport, O: LinkObserver> Rn2483<T, O> {
    /// Create an engine with a custom observer.
    pub fn with_observer(transport: T, config: ModuleConfig, observer: Arc<O>) -> Self {
        Self {
            transport,
            observer,
            config,
            state: ModuleState::new(),
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Module state tracked by this engine.
    pub fn state(&self) -> &ModuleState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Give the transport back, e.g. to close the port.
    pub fn into_inner(self) -> T {
        self.transport
    }

    pub(crate) fn emit(&self, event: LinkEvent) {
        self.observer.on_event(&event);
    }

    pub(crate) fn diagnostic(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(LinkEvent::Diagnostic {
            level,
            message: message.into(),
        });
    }

    /// Send one command and read its immediate acknowledgement.
    ///
    /// Exactly one write and one read. A failed write skips the read.
    /// Returns the sanitized reply text for the caller to interpret.
    pub fn execute(&mut self, command: &Command) -> EngineResult<String> {
        let mut transport = ObservableTransport::new(&mut self.transport, self.observer.as_ref());

        if let Err(e) = transport.write_line(command.as_str()) {
            warn!(command = %command.name(), error = %e, "Write failed");
            return Err(e.into());
        }
        debug!(command = %command, "Command sent");

        let raw = transport.read_line()?;
        if raw.is_empty() {
            warn!(command = %command.name(), "No response");
            return Err(EngineError::NoResponse {
                command: command.to_string(),
            });
        }

        let text = sanitize_text(&raw);
        if text == RESP_INVALID_PARAM {
            warn!(command = %command, "Invalid parameter");
            return Err(EngineError::InvalidParameter {
                command: command.to_string(),
            });
        }

        debug!(command = %command.name(), reply = %text, "Reply received");
        Ok(text)
    }

    /// Read a parameter: the raw reply text.
    pub fn get_parameter(&mut self, command: &Command) -> EngineResult<String> {
        self.execute(command)
    }

    /// Read a parameter and convert it with `parse`.
    pub fn get_parsed<V>(
        &mut self,
        command: &Command,
        parse: impl FnOnce(&str) -> Option<V>,
    ) -> EngineResult<V> {
        let text = self.get_parameter(command)?;
        parse(&text).ok_or_else(|| {
            warn!(command = %command.name(), value = %text, "Unparsable reply");
            EngineError::Parse {
                command: command.to_string(),
                value: text,
            }
        })
    }

    /// Write a parameter; the module must answer `ok`.
    pub fn set_parameter(&mut self, command: &Command) -> EngineResult<()> {
        self.expect_ok(command)
    }

    /// Execute and require the `ok` acknowledgement.
    pub(crate) fn expect_ok(&mut self, command: &Command) -> EngineResult<()> {
        let reply = self.execute(command)?;
        if reply == RESP_OK {
            return Ok(());
        }

        match classify(&reply) {
            Outcome::NamedError(code) => {
                warn!(command = %command.name(), code = %code, "Command rejected");
                Err(EngineError::Rejected {
                    command: command.to_string(),
                    code,
                })
            }
            _ => {
                warn!(command = %command.name(), reply = %reply, "Unexpected acknowledgement");
                Err(EngineError::Unrecognized {
                    command: command.to_string(),
                    line: reply,
                })
            }
        }
    }

    /// Run the poll loop for `operation` against the owned transport.
    pub(crate) fn poll_event<R>(
        &mut self,
        operation: Operation,
        policy: PollPolicy,
        step: impl FnMut(&str) -> PollStep<R>,
    ) -> EngineResult<PollResult<R>> {
        let mut transport = ObservableTransport::new(&mut self.transport, self.observer.as_ref());
        let result = poll_until(&mut transport, policy, step)?;

        if let PollResult::TimedOut { elapsed } = &result {
            self.emit(LinkEvent::TimedOut {
                operation: operation.as_str(),
                after_ms: elapsed.as_millis() as u64,
            });
        }
        Ok(result)
    }

    /// Observer handle for closures that run inside the poll loop.
    pub(crate) fn observer_handle(&self) -> Arc<O> {
        Arc::clone(&self.observer)
    }

    pub(crate) fn state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use super::Rn2483;
    use crate::config::ModuleConfig;
    use crate::events::RecordingObserver;
    use crate::transport::MockTransport;

    /// Config with millisecond-scale timings.
    pub fn fast_config() -> ModuleConfig {
        ModuleConfig {
            tick_interval_ms: 1,
            join_timeout_ms: 40,
            uplink_timeout_ms: 40,
            radio_tx_timeout_ms: 40,
            rx_timeout_ms: 40,
            ..ModuleConfig::default()
        }
    }

    pub fn engine() -> (
        Rn2483<MockTransport, RecordingObserver>,
        MockTransport,
        Arc<RecordingObserver>,
    ) {
        let mock = MockTransport::new();
        let observer = Arc::new(RecordingObserver::new());
        let engine = Rn2483::with_observer(mock.clone(), fast_config(), Arc::clone(&observer));
        (engine, mock, observer)
    }

    pub const SHORT: Duration = Duration::from_millis(20);
}
