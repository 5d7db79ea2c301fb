//! Line transport abstraction.
//!
//! Defines the `LineTransport` trait the engine drives,
//! allowing different implementations (serial port, mock, etc.).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to open port {port}: {message}")]
    OpenFailed { port: String, message: String },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),

    #[error("Device disconnected")]
    Disconnected,
}

/// Abstract line-oriented transport to the module.
///
/// The engine owns its transport exclusively for the duration of every
/// transaction, so all methods take `&mut self`.
pub trait LineTransport: Send {
    /// Write one command line. The implementation appends the terminator.
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Read one raw response line, terminator included.
    ///
    /// Returns an empty vector when nothing is currently available. This is
    /// not an error: the poll loop treats it as "try again next tick".
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Discard any pending input.
    fn flush(&mut self) -> Result<(), TransportError>;
}

impl<T: LineTransport + ?Sized> LineTransport for Box<T> {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        (**self).write_line(line)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).read_line()
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }
}
