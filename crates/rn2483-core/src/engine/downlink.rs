//! Downlink demultiplexer.
//!
//! Decodes `mac_rx <port> <hex>` and `radio_rx <hex>` events. A malformed
//! `mac_rx` never fails the uplink that carried it: the handler is skipped
//! and a diagnostic is the only trace.

use thiserror::Error;
use tracing::warn;

use crate::events::{LinkEvent, LinkObserver, LogLevel};
use crate::protocol::{EVT_MAC_RX, EVT_RADIO_RX};

/// A downlink payload addressed to an application port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownlinkMessage {
    pub port: u8,
    pub payload: Vec<u8>,
}

/// An event that matched a known tag but failed field-level parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedEvent {
    #[error("{event}: missing {field} field")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },

    #[error("{event}: invalid port '{value}'")]
    InvalidPort { event: &'static str, value: String },

    #[error("{event}: invalid hex payload '{value}'")]
    InvalidPayload { event: &'static str, value: String },
}

fn decode_payload(event: &'static str, value: &str) -> Result<Vec<u8>, MalformedEvent> {
    hex::decode(value).map_err(|_| MalformedEvent::InvalidPayload {
        event,
        value: value.to_string(),
    })
}

/// Parse the arguments of a `mac_rx` event (tag already stripped).
pub fn parse_mac_rx(args: &[String]) -> Result<DownlinkMessage, MalformedEvent> {
    let port_field = args.first().ok_or(MalformedEvent::MissingField {
        event: EVT_MAC_RX,
        field: "port",
    })?;
    let payload_field = args.get(1).ok_or(MalformedEvent::MissingField {
        event: EVT_MAC_RX,
        field: "payload",
    })?;

    let port = port_field
        .parse::<u8>()
        .map_err(|_| MalformedEvent::InvalidPort {
            event: EVT_MAC_RX,
            value: port_field.clone(),
        })?;
    let payload = decode_payload(EVT_MAC_RX, payload_field)?;

    Ok(DownlinkMessage { port, payload })
}

/// Parse the arguments of a `radio_rx` event (tag already stripped).
pub fn parse_radio_rx(args: &[String]) -> Result<Vec<u8>, MalformedEvent> {
    let payload_field = args.last().ok_or(MalformedEvent::MissingField {
        event: EVT_RADIO_RX,
        field: "payload",
    })?;
    decode_payload(EVT_RADIO_RX, payload_field)
}

/// Decode a `mac_rx` event and hand it to `handler`.
///
/// Runs synchronously on the polling thread. Returns `true` if the handler
/// was invoked. Parse failures are reported to the observer and swallowed.
pub fn demultiplex<O, F>(args: &[String], observer: &O, handler: Option<&mut F>) -> bool
where
    O: LinkObserver + ?Sized,
    F: FnMut(DownlinkMessage) + ?Sized,
{
    let message = match parse_mac_rx(args) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Dropping malformed downlink");
            observer.on_event(&LinkEvent::Diagnostic {
                level: LogLevel::Warn,
                message: e.to_string(),
            });
            return false;
        }
    };

    observer.on_event(&LinkEvent::Downlink {
        port: message.port,
        length: message.payload.len(),
    });

    match handler {
        Some(handler) => {
            handler(message);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NullObserver, RecordingObserver};

    fn args(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_mac_rx() {
        let message = parse_mac_rx(&args(&["1", "7265636569766564"])).unwrap();
        assert_eq!(message.port, 1);
        assert_eq!(message.payload, b"received");
    }

    #[test]
    fn test_parse_mac_rx_full_port_range() {
        let message = parse_mac_rx(&args(&["223", "00"])).unwrap();
        assert_eq!(message.port, 223);
        assert!(parse_mac_rx(&args(&["256", "00"])).is_err());
    }

    #[test]
    fn test_parse_mac_rx_errors() {
        assert_eq!(
            parse_mac_rx(&args(&["1"])),
            Err(MalformedEvent::MissingField {
                event: "mac_rx",
                field: "payload"
            })
        );
        assert!(matches!(
            parse_mac_rx(&args(&["x", "00"])),
            Err(MalformedEvent::InvalidPort { .. })
        ));
        assert!(matches!(
            parse_mac_rx(&args(&["1", "ABC"])),
            Err(MalformedEvent::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_parse_radio_rx() {
        assert_eq!(parse_radio_rx(&args(&["48656C6C6F"])).unwrap(), b"Hello");
        assert!(parse_radio_rx(&[]).is_err());
    }

    #[test]
    fn test_demultiplex_invokes_handler_once() {
        let mut received = Vec::new();
        let mut handler = |msg: DownlinkMessage| received.push(msg);

        let invoked = demultiplex(
            &args(&["1", "7265636569766564"]),
            &NullObserver,
            Some(&mut handler),
        );

        assert!(invoked);
        assert_eq!(
            received,
            vec![DownlinkMessage {
                port: 1,
                payload: b"received".to_vec()
            }]
        );
    }

    #[test]
    fn test_demultiplex_malformed_skips_handler() {
        let observer = RecordingObserver::new();
        let mut calls = 0;
        let mut handler = |_: DownlinkMessage| calls += 1;

        let invoked = demultiplex(&args(&["1", "zz"]), &observer, Some(&mut handler));

        assert!(!invoked);
        assert_eq!(calls, 0);
        assert!(observer.events().iter().any(|e| matches!(
            e,
            LinkEvent::Diagnostic {
                level: LogLevel::Warn,
                ..
            }
        )));
    }
}
