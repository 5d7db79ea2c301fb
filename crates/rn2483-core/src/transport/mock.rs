//! Mock line transport for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{LineTransport, TransportError};
use crate::protocol::LINE_TERMINATOR;

/// One recorded transport operation, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Write(String),
    Read(Vec<u8>),
    Flush,
}

#[derive(Debug, Default)]
struct MockState {
    /// Queued raw responses; an empty entry models a read with nothing buffered.
    responses: VecDeque<Vec<u8>>,
    /// Every operation performed, in order.
    ops: Vec<MockOp>,
    fail_writes: bool,
    fail_reads: bool,
    connected: bool,
}

/// Mock transport for unit testing engine logic.
///
/// Clones share state, so a test can keep a handle after moving the
/// transport into the engine.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                connected: true,
                ..MockState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a response line; the terminator is appended.
    pub fn queue_line(&self, line: &str) {
        self.queue_raw(format!("{}{}", line, LINE_TERMINATOR).as_bytes());
    }

    /// Queue several response lines in order.
    pub fn queue_lines(&self, lines: &[&str]) {
        for line in lines {
            self.queue_line(line);
        }
    }

    /// Queue raw bytes exactly as given.
    pub fn queue_raw(&self, raw: &[u8]) {
        self.lock().responses.push_back(raw.to_vec());
    }

    /// Queue `count` empty polls.
    pub fn queue_silence(&self, count: usize) {
        let mut state = self.lock();
        for _ in 0..count {
            state.responses.push_back(Vec::new());
        }
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Make every subsequent read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Simulate a closed port: writes fail, reads return nothing.
    pub fn disconnect(&self) {
        self.lock().connected = false;
    }

    pub fn reconnect(&self) {
        self.lock().connected = true;
    }

    /// Lines written so far, without terminator.
    pub fn get_writes(&self) -> Vec<String> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                MockOp::Write(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every operation in call order.
    pub fn ops(&self) -> Vec<MockOp> {
        self.lock().ops.clone()
    }

    /// Number of read calls so far, including empty polls.
    pub fn read_count(&self) -> usize {
        self.lock()
            .ops
            .iter()
            .filter(|op| matches!(op, MockOp::Read(_)))
            .count()
    }

    /// Responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.lock().responses.len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LineTransport for MockTransport {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(TransportError::Disconnected);
        }
        if state.fail_writes {
            return Err(TransportError::WriteFailed("mock write failure".into()));
        }
        state.ops.push(MockOp::Write(line.to_string()));
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut state = self.lock();
        if state.fail_reads {
            return Err(TransportError::ReadFailed("mock read failure".into()));
        }
        let raw = if state.connected {
            state.responses.pop_front().unwrap_or_default()
        } else {
            Vec::new()
        };
        state.ops.push(MockOp::Read(raw.clone()));
        Ok(raw)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.responses.clear();
        state.ops.push(MockOp::Flush);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_response_queue() {
        let mut mock = MockTransport::new();
        mock.queue_lines(&["ok", "accepted"]);

        assert_eq!(mock.read_line().unwrap(), b"ok\r\n");
        assert_eq!(mock.read_line().unwrap(), b"accepted\r\n");

        // Queue is empty now: reads report nothing available.
        assert!(mock.read_line().unwrap().is_empty());
    }

    #[test]
    fn test_mock_write_capture() {
        let mut mock = MockTransport::new();
        mock.write_line("sys get ver").unwrap();
        mock.write_line("sys get vdd").unwrap();

        let writes = mock.get_writes();
        assert_eq!(writes, vec!["sys get ver", "sys get vdd"]);
    }

    #[test]
    fn test_mock_disconnect() {
        let mut mock = MockTransport::new();
        mock.queue_line("ok");
        mock.disconnect();

        assert!(mock.write_line("sys get ver").is_err());
        assert!(mock.read_line().unwrap().is_empty());

        mock.reconnect();
        assert_eq!(mock.read_line().unwrap(), b"ok\r\n");
    }

    #[test]
    fn test_mock_clone_shares_state() {
        let handle = MockTransport::new();
        let mut moved = handle.clone();
        moved.write_line("mac pause").unwrap();
        assert_eq!(handle.get_writes(), vec!["mac pause"]);
    }

    #[test]
    fn test_mock_flush_discards_input() {
        let mut mock = MockTransport::new();
        mock.queue_lines(&["RN2483 1.0.1", "ok"]);
        mock.flush().unwrap();
        assert_eq!(mock.pending(), 0);
        assert_eq!(mock.ops().last(), Some(&MockOp::Flush));
    }
}
