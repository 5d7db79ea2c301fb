//! Response line sanitizing and classification.
//!
//! Every line read from the module passes through [`sanitize`] before any
//! comparison, and [`classify`] maps the resulting text onto a closed set of
//! outcome categories. Both are pure functions.

use std::fmt;

use super::constants::*;

/// Strip the two-byte line terminator from a raw response.
///
/// Inputs shorter than the terminator are returned unchanged.
pub fn sanitize(raw: &[u8]) -> &[u8] {
    if raw.len() >= LINE_TERMINATOR_LEN {
        &raw[..raw.len() - LINE_TERMINATOR_LEN]
    } else {
        raw
    }
}

/// Sanitize a raw response and render it as text.
///
/// Non-UTF-8 bytes are replaced rather than rejected; such a line will
/// simply classify as [`Outcome::Unrecognized`].
pub fn sanitize_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(sanitize(raw)).into_owned()
}

/// Terminal failure tokens the module can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MacErr,
    InvalidDataLen,
    RadioErr,
    Busy,
    NotJoined,
    NoFreeChannel,
    Silent,
    FrameCounterRejoinNeeded,
    MacPaused,
    KeysNotInit,
}

impl ErrorCode {
    /// Parse a sanitized token into an error code.
    pub fn from_token(token: &str) -> Option<Self> {
        let code = match token {
            ERR_MAC => ErrorCode::MacErr,
            ERR_INVALID_DATA_LEN => ErrorCode::InvalidDataLen,
            ERR_RADIO => ErrorCode::RadioErr,
            ERR_BUSY => ErrorCode::Busy,
            ERR_NOT_JOINED => ErrorCode::NotJoined,
            ERR_NO_FREE_CHANNEL => ErrorCode::NoFreeChannel,
            ERR_SILENT => ErrorCode::Silent,
            ERR_FRAME_COUNTER => ErrorCode::FrameCounterRejoinNeeded,
            ERR_MAC_PAUSED => ErrorCode::MacPaused,
            ERR_KEYS_NOT_INIT => ErrorCode::KeysNotInit,
            _ => return None,
        };
        Some(code)
    }

    /// Wire token for this code.
    pub fn as_token(&self) -> &'static str {
        match self {
            ErrorCode::MacErr => ERR_MAC,
            ErrorCode::InvalidDataLen => ERR_INVALID_DATA_LEN,
            ErrorCode::RadioErr => ERR_RADIO,
            ErrorCode::Busy => ERR_BUSY,
            ErrorCode::NotJoined => ERR_NOT_JOINED,
            ErrorCode::NoFreeChannel => ERR_NO_FREE_CHANNEL,
            ErrorCode::Silent => ERR_SILENT,
            ErrorCode::FrameCounterRejoinNeeded => ERR_FRAME_COUNTER,
            ErrorCode::MacPaused => ERR_MAC_PAUSED,
            ErrorCode::KeysNotInit => ERR_KEYS_NOT_INIT,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Recognized asynchronous success events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncEvent {
    JoinAccepted,
    JoinDenied,
    MacTxOk,
    RadioTxOk,
    /// `mac_rx <port> <hex>`; arguments are kept as text for the demultiplexer.
    MacRx { args: Vec<String> },
    /// `radio_rx <hex>`.
    RadioRx { args: Vec<String> },
}

impl AsyncEvent {
    /// Event tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            AsyncEvent::JoinAccepted => EVT_JOIN_ACCEPTED,
            AsyncEvent::JoinDenied => EVT_JOIN_DENIED,
            AsyncEvent::MacTxOk => EVT_MAC_TX_OK,
            AsyncEvent::RadioTxOk => EVT_RADIO_TX_OK,
            AsyncEvent::MacRx { .. } => EVT_MAC_RX,
            AsyncEvent::RadioRx { .. } => EVT_RADIO_RX,
        }
    }
}

/// Classification of one sanitized response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Immediate acknowledgement (`ok`) of a command.
    Ack(String),
    /// The `invalid_param` sentinel.
    InvalidParameter,
    /// One of the fixed failure tokens.
    NamedError(ErrorCode),
    /// A recognized asynchronous success event.
    Event(AsyncEvent),
    /// Anything else.
    Unrecognized(String),
}

impl Outcome {
    /// True for outcomes that signal the module refused or failed the operation.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::InvalidParameter | Outcome::NamedError(_) | Outcome::Unrecognized(_)
        )
    }
}

/// Classify a sanitized response line.
pub fn classify(line: &str) -> Outcome {
    match line {
        RESP_OK => return Outcome::Ack(line.to_string()),
        RESP_INVALID_PARAM => return Outcome::InvalidParameter,
        EVT_JOIN_ACCEPTED => return Outcome::Event(AsyncEvent::JoinAccepted),
        EVT_JOIN_DENIED => return Outcome::Event(AsyncEvent::JoinDenied),
        EVT_MAC_TX_OK => return Outcome::Event(AsyncEvent::MacTxOk),
        EVT_RADIO_TX_OK => return Outcome::Event(AsyncEvent::RadioTxOk),
        _ => {}
    }

    if let Some(code) = ErrorCode::from_token(line) {
        return Outcome::NamedError(code);
    }

    let mut fields = line.split_whitespace();
    match fields.next() {
        Some(EVT_MAC_RX) => Outcome::Event(AsyncEvent::MacRx {
            args: fields.map(str::to_string).collect(),
        }),
        Some(EVT_RADIO_RX) => Outcome::Event(AsyncEvent::RadioRx {
            args: fields.map(str::to_string).collect(),
        }),
        _ => Outcome::Unrecognized(line.to_string()),
    }
}
