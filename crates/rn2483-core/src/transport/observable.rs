//! Transport wrapper that reports every line to an observer.

use super::traits::{LineTransport, TransportError};
use crate::events::{LineDirection, LinkEvent, LinkObserver};
use crate::protocol::sanitize_text;

/// Wraps a borrowed transport for the span of one transaction.
pub struct ObservableTransport<'a, T: LineTransport, O: LinkObserver> {
    inner: &'a mut T,
    observer: &'a O,
}

impl<'a, T: LineTransport, O: LinkObserver> ObservableTransport<'a, T, O> {
    pub fn new(inner: &'a mut T, observer: &'a O) -> Self {
        Self { inner, observer }
    }
}

impl<'a, T: LineTransport, O: LinkObserver> LineTransport for ObservableTransport<'a, T, O> {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let res = self.inner.write_line(line);
        if res.is_ok() {
            self.observer.on_event(&LinkEvent::Line {
                direction: LineDirection::Tx,
                text: line.to_string(),
            });
        }
        res
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let res = self.inner.read_line();
        if let Ok(raw) = &res {
            if !raw.is_empty() {
                self.observer.on_event(&LinkEvent::Line {
                    direction: LineDirection::Rx,
                    text: sanitize_text(raw),
                });
            }
        }
        res
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.inner.flush()
    }
}
