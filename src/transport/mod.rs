// Byte-level transport abstraction for the motor bus
//
// The register protocol only needs raw reads and writes; keeping them
// behind a trait lets the same framing code run against real serial
// hardware or an in-memory mock in tests.

use std::io;

mod mock;
mod serial;

pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Raw byte transport to the motor-driver board
pub trait Transport: Send {
    /// Read available bytes into `buf`, returning the number read.
    /// A return of 0 means no data arrived within the transport timeout.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Block until pending writes are on the wire.
    fn flush(&mut self) -> io::Result<()>;
}
