// Serial transport over a USB/UART port

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::info;

use super::Transport;

/// Read timeout for bus responses; the board answers well within this.
const READ_TIMEOUT_MS: u64 = 100;

/// Serial port transport (8N1, no flow control)
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial port at the given baud rate
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()?;

        info!("Opened serial port {} at {} baud", path, baud_rate);
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}
