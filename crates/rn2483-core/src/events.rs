//! Event system for UI decoupling.
//!
//! Allows CLI/GUI front-ends to subscribe to link events without
//! tight coupling to the engine.

use std::fmt;

use crate::state::{JoinState, UplinkState};

/// Log level for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Line direction on the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDirection {
    Tx, // Host -> Module
    Rx, // Module -> Host
}

impl fmt::Display for LineDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineDirection::Tx => write!(f, "TX"),
            LineDirection::Rx => write!(f, "RX"),
        }
    }
}

/// Events emitted by the engine.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// A line crossed the serial link (sanitized, without terminator).
    Line { direction: LineDirection, text: String },
    /// Join state machine transition.
    JoinStateChanged { from: JoinState, to: JoinState },
    /// Uplink state machine transition.
    UplinkStateChanged { from: UplinkState, to: UplinkState },
    /// A downlink was decoded and handed to the caller.
    Downlink { port: u8, length: usize },
    /// A poll loop hit its deadline.
    TimedOut { operation: &'static str, after_ms: u64 },
    /// Free-form diagnostic.
    Diagnostic { level: LogLevel, message: String },
}

/// Observer trait for receiving link events.
///
/// Implement this trait in your UI layer to receive updates.
pub trait LinkObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &LinkEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl LinkObserver for NullObserver {
    fn on_event(&self, _event: &LinkEvent) {}
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl LinkObserver for TracingObserver {
    fn on_event(&self, event: &LinkEvent) {
        match event {
            LinkEvent::Line { direction, text } => {
                tracing::debug!(dir = %direction, line = %text, "Serial line");
            }
            LinkEvent::JoinStateChanged { from, to } => {
                tracing::info!(from = %from, to = %to, "Join state changed");
            }
            LinkEvent::UplinkStateChanged { from, to } => {
                tracing::info!(from = %from, to = %to, "Uplink state changed");
            }
            LinkEvent::Downlink { port, length } => {
                tracing::info!(port = port, len = length, "Downlink received");
            }
            LinkEvent::TimedOut {
                operation,
                after_ms,
            } => {
                tracing::warn!(operation = operation, after_ms = after_ms, "Timed out");
            }
            LinkEvent::Diagnostic { level, message } => match level {
                LogLevel::Trace => tracing::trace!("{}", message),
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
        }
    }
}

/// Observer that records every event, for tests and UIs that replay history.
#[derive(Default)]
pub struct RecordingObserver {
    events: std::sync::Mutex<Vec<LinkEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<LinkEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl LinkObserver for RecordingObserver {
    fn on_event(&self, event: &LinkEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
