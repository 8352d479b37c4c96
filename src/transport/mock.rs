// In-memory transport for unit tests
//
// Cloning shares the underlying buffers, so a test can keep one handle
// for injecting responses and inspecting writes while the bus owns the
// other.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use super::Transport;

#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    read_queue: VecDeque<u8>,
    written: Vec<u8>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes to be returned by subsequent reads
    pub fn inject_read(&self, data: &[u8]) {
        self.inner.lock().unwrap().read_queue.extend(data);
    }

    /// Everything written to the transport so far
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().unwrap().written.clone()
    }

    pub fn clear_written(&self) {
        self.inner.lock().unwrap().written.clear();
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let n = inner.read_queue.len().min(buf.len());
        for slot in buf.iter_mut().take(n) {
            *slot = inner.read_queue.pop_front().unwrap();
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.lock().unwrap().written.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
