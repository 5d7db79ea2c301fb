//! serialport-based line transport implementation.

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info, instrument};

use super::traits::{LineTransport, TransportError};
use crate::config::ModuleConfig;
use crate::protocol::LINE_TERMINATOR;

const READ_CHUNK: usize = 128;

/// Serial port transport (57600 8N1 by default).
///
/// Input is buffered so that each `read_line` yields exactly one
/// terminated line, even when the module sends several back to back or
/// one line arrives in pieces.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
    read_timeout: Duration,
    rx_buf: Vec<u8>,
}

impl SerialTransport {
    /// Open the port described by the configuration.
    pub fn from_config(config: &ModuleConfig) -> Result<Self, TransportError> {
        Self::open(&config.port, config.baud_rate, config.read_timeout())
    }

    /// Open a serial port with explicit settings.
    #[instrument(level = "info")]
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, TransportError> {
        let mut port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .timeout(read_timeout)
            .open()
            .map_err(|e| TransportError::OpenFailed {
                port: path.to_string(),
                message: e.to_string(),
            })?;

        // Drop whatever the module printed before we attached.
        port.clear(ClearBuffer::All)
            .map_err(|e| TransportError::FlushFailed(e.to_string()))?;

        info!(port = %path, baud = baud_rate, "Serial port opened");

        Ok(Self::from_port(port, path, read_timeout))
    }

    /// Wrap an already configured port.
    ///
    /// `read_timeout` bounds how long one `read_line` waits for the rest of
    /// a line; it should match the port's own read timeout.
    pub fn from_port(port: Box<dyn SerialPort>, name: &str, read_timeout: Duration) -> Self {
        Self {
            port,
            name: name.to_string(),
            read_timeout,
            rx_buf: Vec::new(),
        }
    }

    /// Port name this transport was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One blocking read into the line buffer. Returns the byte count; a
    /// port timeout counts as zero.
    fn read_chunk(&mut self) -> Result<usize, TransportError> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.port.read(&mut chunk) {
            Ok(n) => {
                self.rx_buf.extend_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(TransportError::ReadFailed(e.to_string())),
        }
    }
}

/// Remove and return the first terminated line in `buf`, terminator included.
pub(crate) fn take_line(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    let end = buf.windows(2).position(|w| w == LINE_TERMINATOR.as_bytes())? + 2;
    let rest = buf.split_off(end);
    Some(std::mem::replace(buf, rest))
}

impl LineTransport for SerialTransport {
    #[instrument(skip(self), fields(port = %self.name))]
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut data = Vec::with_capacity(line.len() + LINE_TERMINATOR.len());
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(LINE_TERMINATOR.as_bytes());

        self.port
            .write_all(&data)
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        self.port
            .flush()
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;

        debug!(bytes_written = data.len(), "Write complete");
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        if let Some(line) = take_line(&mut self.rx_buf) {
            return Ok(line);
        }

        // Keep reading until a terminator shows up or the read timeout
        // has elapsed since this call began. A partial line stays buffered.
        let started = Instant::now();
        loop {
            let n = self.read_chunk()?;
            if let Some(line) = take_line(&mut self.rx_buf) {
                debug!(bytes_read = line.len(), "Read complete");
                return Ok(line);
            }
            if n == 0 || started.elapsed() >= self.read_timeout {
                return Ok(Vec::new());
            }
        }
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.rx_buf.clear();
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| TransportError::FlushFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_line_splits_back_to_back_lines() {
        let mut buf = b"ok\r\naccepted\r\nmac_".to_vec();
        assert_eq!(take_line(&mut buf).unwrap(), b"ok\r\n");
        assert_eq!(take_line(&mut buf).unwrap(), b"accepted\r\n");
        assert_eq!(take_line(&mut buf), None);
        assert_eq!(buf, b"mac_");
    }

    #[test]
    fn test_take_line_waits_for_terminator() {
        let mut buf = b"radio_tx_ok\r".to_vec();
        assert_eq!(take_line(&mut buf), None);
        buf.push(b'\n');
        assert_eq!(take_line(&mut buf).unwrap(), b"radio_tx_ok\r\n");
        assert!(buf.is_empty());
    }

    #[cfg(unix)]
    fn pty_pair(read_timeout: Duration) -> (serialport::TTYPort, SerialTransport) {
        let (master, mut slave) = serialport::TTYPort::pair().unwrap();
        slave.set_timeout(read_timeout).unwrap();
        let transport = SerialTransport::from_port(Box::new(slave), "pty", read_timeout);
        (master, transport)
    }

    #[cfg(unix)]
    #[test]
    fn test_read_line_joins_line_sent_in_pieces() {
        let (mut master, mut transport) = pty_pair(Duration::from_millis(200));

        let writer = std::thread::spawn(move || {
            master.write_all(b"o").unwrap();
            master.flush().unwrap();
            std::thread::sleep(Duration::from_millis(20));
            master.write_all(b"k\r\n").unwrap();
            master.flush().unwrap();
            master
        });

        let line = transport.read_line().unwrap();
        let _master = writer.join().unwrap();

        assert_eq!(line, b"ok\r\n");
        assert!(transport.rx_buf.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_read_line_keeps_unterminated_input() {
        let (mut master, mut transport) = pty_pair(Duration::from_millis(50));

        master.write_all(b"mac_tx").unwrap();
        master.flush().unwrap();
        assert!(transport.read_line().unwrap().is_empty());

        master.write_all(b"_ok\r\n").unwrap();
        master.flush().unwrap();
        assert_eq!(transport.read_line().unwrap(), b"mac_tx_ok\r\n");
    }
}
