// Register protocol for the four-channel motor-driver board
//
// The board sits on a shared addressed serial bus. Frame format:
// [0xFF, 0xFF, Address, Length, Instruction, Params..., Checksum]
// Responses carry a status byte in place of the instruction.

use std::io;

use tracing::debug;

use super::MotorChannel;
use crate::transport::Transport;

/// Frame header bytes
const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Instruction set understood by the board
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    Read = 0x02,
    Write = 0x03,
}

/// Register map of the motor-driver board.
///
/// Addresses are fixed by the board firmware and must not be reordered.
pub mod reg {
    use super::MotorChannel;

    /// Motor family code, 1 byte
    pub const MOTOR_TYPE: u8 = 0x01;
    /// Control deadzone threshold, 2 bytes big-endian
    pub const DEADZONE: u8 = 0x02;
    /// Encoder pulse lines per motor revolution, 2 bytes big-endian
    pub const PULSE_LINE: u8 = 0x03;
    /// Pulse phase / gearbox reduction ratio, 2 bytes big-endian
    pub const PULSE_PHASE: u8 = 0x04;
    /// Wheel diameter in mm, 4-byte little-endian IEEE-754 float
    pub const WHEEL_DIAMETER: u8 = 0x05;
    /// Velocity setpoints, 8 bytes: four signed 16-bit values big-endian
    pub const VELOCITY_CONTROL: u8 = 0x06;
    /// Raw PWM duty, 8 bytes: four signed 16-bit values big-endian
    pub const PWM_CONTROL: u8 = 0x07;
    /// Battery voltage, 2 bytes unsigned big-endian
    pub const BATTERY_VOLTAGE: u8 = 0x1B;

    /// Short-term tick counters, one 2-byte signed register per channel
    pub const ENCODER_SHORT_BASE: u8 = 0x10;
    /// Accumulated tick counters, two 2-byte halves (high, low) per channel
    pub const ENCODER_TOTAL_BASE: u8 = 0x20;

    /// Short-term tick counter register for one channel
    pub fn encoder_short(channel: MotorChannel) -> u8 {
        ENCODER_SHORT_BASE + channel.index() as u8
    }

    /// First (high-half) accumulated tick register for one channel
    pub fn encoder_total(channel: MotorChannel) -> u8 {
        ENCODER_TOTAL_BASE + channel.index() as u8 * 2
    }
}

/// Error types for bus communication
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("bus I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid response from board 0x{address:02X}: {reason}")]
    InvalidResponse { address: u8, reason: String },

    #[error("checksum mismatch in response from board 0x{address:02X}")]
    ChecksumMismatch { address: u8 },

    #[error("board 0x{address:02X} returned error status 0x{status:02X}")]
    DeviceError { address: u8, status: u8 },

    #[error("timeout waiting for response from board 0x{address:02X}")]
    Timeout { address: u8 },

    #[error("hardware access disabled")]
    Disabled,
}

pub type Result<T> = std::result::Result<T, BusError>;

/// Register-level access to the motor-driver board
pub struct RegisterBus {
    transport: Box<dyn Transport>,
    address: u8,
}

impl RegisterBus {
    pub fn new(transport: Box<dyn Transport>, address: u8) -> Self {
        Self { transport, address }
    }

    /// Calculate checksum for a frame (excluding the header)
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    /// Build a frame with header and checksum
    fn build_frame(address: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 2) as u8; // params + instruction + checksum
        let mut frame = Vec::with_capacity(6 + params.len());

        frame.extend_from_slice(&HEADER);
        frame.push(address);
        frame.push(length);
        frame.push(instruction as u8);
        frame.extend_from_slice(params);

        // Checksum over address, length, instruction, params
        let checksum = Self::checksum(&frame[2..]);
        frame.push(checksum);

        frame
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.transport.write_all(frame)?;
        self.transport.flush()?;
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.transport.read(&mut buf[filled..]) {
                Ok(0) => return Err(BusError::Timeout { address: self.address }),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    return Err(BusError::Timeout { address: self.address });
                }
                Err(e) => return Err(BusError::Io(e)),
            }
        }
        Ok(())
    }

    /// Read a response frame, returning its parameter bytes
    fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut header = [0u8; 2];
        self.read_exact(&mut header)?;

        if header != HEADER {
            return Err(BusError::InvalidResponse {
                address: self.address,
                reason: format!("invalid header: {:02X?}", header),
            });
        }

        let mut addr_length = [0u8; 2];
        self.read_exact(&mut addr_length)?;
        let addr = addr_length[0];
        let length = addr_length[1] as usize;

        if addr != self.address {
            return Err(BusError::InvalidResponse {
                address: self.address,
                reason: format!("address mismatch: expected 0x{:02X}, got 0x{:02X}", self.address, addr),
            });
        }
        if length < 2 {
            return Err(BusError::InvalidResponse {
                address: self.address,
                reason: format!("response length {} too short", length),
            });
        }

        // Remaining bytes: status + params + checksum
        let mut remaining = vec![0u8; length];
        self.read_exact(&mut remaining)?;

        let mut checksum_data = vec![addr, length as u8];
        checksum_data.extend_from_slice(&remaining[..remaining.len() - 1]);
        let expected = Self::checksum(&checksum_data);
        let received = remaining[remaining.len() - 1];
        if expected != received {
            return Err(BusError::ChecksumMismatch { address: self.address });
        }

        let status = remaining[0];
        if status != 0 {
            return Err(BusError::DeviceError {
                address: self.address,
                status,
            });
        }

        Ok(remaining[1..remaining.len() - 1].to_vec())
    }

    /// Write an exact byte sequence to a register
    pub fn write_register(&mut self, register: u8, data: &[u8]) -> Result<()> {
        let mut params = Vec::with_capacity(1 + data.len());
        params.push(register);
        params.extend_from_slice(data);

        let frame = Self::build_frame(self.address, Instruction::Write, &params);
        debug!(
            "Write reg 0x{:02X} on board 0x{:02X}: {:02X?}",
            register, self.address, data
        );
        self.send_frame(&frame)?;

        // Status-only acknowledgement
        let _ = self.read_response()?;
        Ok(())
    }

    /// Read exactly `length` bytes from a register
    pub fn read_register(&mut self, register: u8, length: u8) -> Result<Vec<u8>> {
        let params = [register, length];
        let frame = Self::build_frame(self.address, Instruction::Read, &params);
        self.send_frame(&frame)?;

        let response = self.read_response()?;
        if response.len() != length as usize {
            return Err(BusError::InvalidResponse {
                address: self.address,
                reason: format!("expected {} bytes, got {}", length, response.len()),
            });
        }
        Ok(response)
    }
}

// === Fixed-width payload encoding ===

/// Encode four per-channel signed setpoints as 8 bytes, high byte first.
/// Callers clamp to the signed 16-bit range before reaching this point.
pub fn encode_channel_values(values: [i16; 4]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (i, v) in values.iter().enumerate() {
        let [hi, lo] = v.to_be_bytes();
        out[i * 2] = hi;
        out[i * 2 + 1] = lo;
    }
    out
}

/// Encode a 2-byte big-endian parameter (deadzone, pulse counts)
pub fn encode_u16_be(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Wheel diameter is the one little-endian field on the board
pub fn encode_wheel_diameter(mm: f32) -> [u8; 4] {
    mm.to_le_bytes()
}

/// Decode a big-endian unsigned 16-bit register value
pub fn decode_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Decode a 16-bit tick counter. Values in the upper half of the unsigned
/// range are negative counts (two's complement).
pub fn decode_i16_be(bytes: [u8; 2]) -> i16 {
    decode_u16_be(bytes) as i16
}

/// Decode an accumulated tick counter from its high and low 16-bit halves.
/// Same two's-complement reinterpretation at the 32-bit boundary.
pub fn decode_i32_halves(bytes: [u8; 4]) -> i32 {
    let high = decode_u16_be([bytes[0], bytes[1]]) as u32;
    let low = decode_u16_be([bytes[2], bytes[3]]) as u32;
    ((high << 16) | low) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    const ADDR: u8 = 0x26;

    fn ack_frame() -> Vec<u8> {
        // Status-only acknowledgement: header, addr, length=2, status=0, checksum
        let checksum = RegisterBus::checksum(&[ADDR, 0x02, 0x00]);
        vec![0xFF, 0xFF, ADDR, 0x02, 0x00, checksum]
    }

    fn data_frame(data: &[u8]) -> Vec<u8> {
        let length = (data.len() + 2) as u8;
        let mut frame = vec![0xFF, 0xFF, ADDR, length, 0x00];
        frame.extend_from_slice(data);
        let checksum = RegisterBus::checksum(&frame[2..]);
        frame.push(checksum);
        frame
    }

    #[test]
    fn test_checksum() {
        let data = [0x26u8, 4, 0x03, 0x01, 0x01];
        // ~(0x26 + 4 + 3 + 1 + 1) = ~0x2F = 0xD0
        assert_eq!(RegisterBus::checksum(&data), 0xD0);
    }

    #[test]
    fn test_build_frame() {
        let frame = RegisterBus::build_frame(ADDR, Instruction::Write, &[reg::MOTOR_TYPE, 1]);
        // Header (2) + addr (1) + length (1) + instruction (1) + params (2) + checksum (1)
        assert_eq!(frame.len(), 8);
        assert_eq!(&frame[..2], &HEADER);
        assert_eq!(frame[2], ADDR);
        assert_eq!(frame[3], 4); // params + instruction + checksum
        assert_eq!(frame[4], 0x03);
        assert_eq!(frame[5], reg::MOTOR_TYPE);
        assert_eq!(frame[6], 1);
        assert_eq!(frame[7], RegisterBus::checksum(&frame[2..7]));
    }

    #[test]
    fn test_write_register_frames_and_acks() {
        let mock = MockTransport::new();
        mock.inject_read(&ack_frame());

        let mut bus = RegisterBus::new(Box::new(mock.clone()), ADDR);
        bus.write_register(reg::DEADZONE, &encode_u16_be(1600)).unwrap();

        let written = mock.written();
        assert_eq!(written[..5], [0xFF, 0xFF, ADDR, 5, 0x03]);
        assert_eq!(written[5], reg::DEADZONE);
        assert_eq!(&written[6..8], &[0x06, 0x40]); // 1600 big-endian
    }

    #[test]
    fn test_read_register_round_trip() {
        let mock = MockTransport::new();
        mock.inject_read(&data_frame(&[0x2F, 0x44])); // 12100 big-endian

        let mut bus = RegisterBus::new(Box::new(mock.clone()), ADDR);
        let bytes = bus.read_register(reg::BATTERY_VOLTAGE, 2).unwrap();
        assert_eq!(decode_u16_be([bytes[0], bytes[1]]), 12100);

        // The request frame asks for the register and length
        let written = mock.written();
        assert_eq!(written[4], 0x02); // read instruction
        assert_eq!(written[5], reg::BATTERY_VOLTAGE);
        assert_eq!(written[6], 2);
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let mock = MockTransport::new();
        let mut corrupted = data_frame(&[0x00, 0x79]);
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;
        mock.inject_read(&corrupted);

        let mut bus = RegisterBus::new(Box::new(mock), ADDR);
        let err = bus.read_register(reg::BATTERY_VOLTAGE, 2).unwrap_err();
        assert!(matches!(err, BusError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_short_response_is_timeout() {
        let mock = MockTransport::new();
        mock.inject_read(&[0xFF, 0xFF, ADDR]); // truncated

        let mut bus = RegisterBus::new(Box::new(mock), ADDR);
        let err = bus.read_register(reg::BATTERY_VOLTAGE, 2).unwrap_err();
        assert!(matches!(err, BusError::Timeout { .. }));
    }

    #[test]
    fn test_device_status_surfaces() {
        let mock = MockTransport::new();
        let mut frame = vec![0xFF, 0xFF, ADDR, 0x02, 0x04];
        frame.push(RegisterBus::checksum(&frame[2..]));
        mock.inject_read(&frame);

        let mut bus = RegisterBus::new(Box::new(mock), ADDR);
        let err = bus.write_register(reg::MOTOR_TYPE, &[1]).unwrap_err();
        assert!(matches!(err, BusError::DeviceError { status: 0x04, .. }));
    }

    #[test]
    fn test_channel_value_encoding() {
        let bytes = encode_channel_values([650, -350, 1, -1]);
        assert_eq!(bytes, [0x02, 0x8A, 0xFE, 0xA2, 0x00, 0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn test_i16_sign_extension_round_trip() {
        for t in [-1i16, i16::MIN, i16::MAX, 0] {
            let pair = [((t as u16) >> 8) as u8, (t as u16 & 0xFF) as u8];
            assert_eq!(decode_i16_be(pair), t);
        }
    }

    #[test]
    fn test_i32_half_assembly_round_trip() {
        for t in [-1i32, i32::MIN, i32::MAX, 0] {
            let u = t as u32;
            let bytes = [
                (u >> 24) as u8,
                (u >> 16) as u8,
                (u >> 8) as u8,
                u as u8,
            ];
            assert_eq!(decode_i32_halves(bytes), t);
        }
    }

    #[test]
    fn test_wheel_diameter_little_endian() {
        // 67.0f32 = 0x42860000, sent low byte first
        assert_eq!(encode_wheel_diameter(67.0), [0x00, 0x00, 0x86, 0x42]);
    }

    #[test]
    fn test_per_channel_register_layout() {
        assert_eq!(reg::encoder_short(MotorChannel::FrontLeft), 0x10);
        assert_eq!(reg::encoder_short(MotorChannel::RearRight), 0x13);
        assert_eq!(reg::encoder_total(MotorChannel::FrontLeft), 0x20);
        assert_eq!(reg::encoder_total(MotorChannel::FrontRight), 0x22);
        assert_eq!(reg::encoder_total(MotorChannel::RearRight), 0x26);
    }
}
