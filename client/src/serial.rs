//! Recovery for a stalled serial link between the LED Foot host and the LED
//! microcontroller.
//!
//! The microcontroller reads fixed 9 byte command frames. When the link gets
//! out of step, writing a full frame of zeros and reading the reply byte brings
//! it back in sync.

use std::io::{Read, Write};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// Length of one command frame on the microcontroller side.
pub const FRAME_LEN: usize = 9;

#[derive(Error, Debug)]
pub enum SerialResetError {
    #[error("Unable to open serial port: {0}")]
    Open(#[from] serialport::Error),
    #[error("Serial I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes one zeroed frame and returns the byte the microcontroller answers with.
pub fn flush_frame<P: Read + Write + ?Sized>(port: &mut P) -> Result<u8, SerialResetError> {
    port.write_all(&[0; FRAME_LEN])?;
    port.flush()?;
    let mut reply = [0u8; 1];
    port.read_exact(&mut reply)?;
    debug!("Serial reply byte: {:#04x}", reply[0]);
    Ok(reply[0])
}

pub fn reset_serial(port_name: &str, timeout: Duration) -> Result<u8, SerialResetError> {
    info!("Resetting serial link on {port_name}");
    let mut port = serialport::new(port_name, DEFAULT_BAUD_RATE)
        .timeout(timeout)
        .open()?;
    flush_frame(port.as_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct FakePort {
        written: Vec<u8>,
        reply: Cursor<Vec<u8>>,
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reply.read(buf)
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_flush_frame() {
        let mut port = FakePort {
            written: vec![],
            reply: Cursor::new(b"C\r\n".to_vec()),
        };
        let reply = flush_frame(&mut port).unwrap();
        assert_eq!(reply, b'C');
        assert_eq!(port.written, [0u8; FRAME_LEN]);
    }

    #[test]
    fn test_flush_frame_without_reply() {
        let mut port = FakePort {
            written: vec![],
            reply: Cursor::new(vec![]),
        };
        assert!(matches!(
            flush_frame(&mut port),
            Err(SerialResetError::Io(_))
        ));
        assert_eq!(port.written.len(), FRAME_LEN);
    }
}
