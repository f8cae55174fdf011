//! LewanSoul/Hiwonder bus servo controller driver.
//!
//! The controller board accepts commands over a serial link in frames of the form
//!
//! ```text
//! 0x55 0x55 <len> <cmd> <params...>
//! ```
//!
//! where `len` counts itself, `cmd` and the params. A multi-servo move is
//! `CMD_SERVO_MOVE` with params `count, dur_lo, dur_hi` followed by `id, pos_lo, pos_hi` per
//! servo. The board gives no completion feedback for moves so the driver waits out the move
//! duration.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::ArmDems;
use log::{debug, info};
use serialport::SerialPort;
use std::{io::Write, thread, time::Duration};

use super::{check_dems, ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Start of every frame.
pub const FRAME_HEADER: [u8; 2] = [0x55, 0x55];

/// Move several servos at once.
pub const CMD_SERVO_MOVE: u8 = 3;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Driver for a LewanSoul controller board on any writable link, normally a serial port.
pub struct LewansoulDriver<P = Box<dyn SerialPort>> {
    port: P,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LewansoulDriver<Box<dyn SerialPort>> {
    /// Open the controller on the given serial device.
    pub fn open(
        path: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self, ServoError> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(ServoError::SerialOpen)?;

        info!("Opened servo controller on {} at {} baud", path, baud_rate);

        Ok(Self::with_port(port))
    }
}

impl<P: Write> LewansoulDriver<P> {
    pub fn with_port(port: P) -> Self {
        Self { port }
    }

    /// Get a reference to the underlying link.
    pub fn port(&self) -> &P {
        &self.port
    }
}

impl<P: Write> ServoDriver for LewansoulDriver<P> {
    fn move_joints(&mut self, dems: &ArmDems) -> Result<(), ServoError> {
        let frame = encode_move(dems)?;

        debug!("Sending {} byte move frame", frame.len());

        self.port.write_all(&frame).map_err(ServoError::Write)?;
        self.port.flush().map_err(ServoError::Write)?;

        thread::sleep(Duration::from_millis(dems.duration_ms as u64));

        Ok(())
    }

    fn name(&self) -> &str {
        "lewansoul"
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a multi-servo move frame for the demands.
pub fn encode_move(dems: &ArmDems) -> Result<Vec<u8>, ServoError> {
    check_dems(dems)?;

    let mut params = Vec::with_capacity(3 + 3 * dems.positions.len());
    params.push(dems.positions.len() as u8);
    params.extend_from_slice(&dems.duration_ms.to_le_bytes());

    for (joint, pos) in dems.positions.iter() {
        params.push(joint.bus_id());
        params.extend_from_slice(&(*pos as u16).to_le_bytes());
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER.len() + 2 + params.len());
    frame.extend_from_slice(&FRAME_HEADER);
    frame.push((params.len() + 2) as u8);
    frame.push(CMD_SERVO_MOVE);
    frame.extend_from_slice(&params);

    Ok(frame)
}

pub(crate) fn default_baud_rate() -> u32 {
    9600
}

pub(crate) fn default_timeout_ms() -> u64 {
    1000
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::JointId;

    fn dems(pos: [i32; 6], duration_ms: u16) -> ArmDems {
        ArmDems {
            positions: JointId::all().zip(pos.iter().copied()).collect(),
            duration_ms,
        }
    }

    #[test]
    fn test_encode_move() {
        let frame = encode_move(&dems([0, 500, 500, 500, 500, 500], 1000)).unwrap();

        // Header, len, cmd, count, duration
        assert_eq!(&frame[..7], &[0x55, 0x55, 23, 3, 6, 0xe8, 0x03]);
        assert_eq!(frame.len(), 4 + 21);

        // J1 = 0, J2 = 500 (0x01f4)
        assert_eq!(&frame[7..10], &[1, 0x00, 0x00]);
        assert_eq!(&frame[10..13], &[2, 0xf4, 0x01]);
        assert_eq!(&frame[22..25], &[6, 0xf4, 0x01]);
    }

    #[test]
    fn test_rejects_unsendable_positions() {
        assert!(matches!(
            encode_move(&dems([0, 500, 500, -5, 500, 500], 1000)),
            Err(ServoError::PositionOutOfRange(..))
        ));

        let mut partial = dems([0; 6], 0);
        partial.positions.remove(&JointId::new(6).unwrap());
        assert!(matches!(
            encode_move(&partial),
            Err(ServoError::NotFullState)
        ));
    }

    #[test]
    fn test_move_writes_frame() {
        let mut driver = LewansoulDriver::with_port(Vec::new());
        let d = dems([700, 500, 500, 500, 500, 500], 0);

        driver.move_joints(&d).unwrap();

        assert_eq!(driver.port(), &encode_move(&d).unwrap());
        assert_eq!(driver.name(), "lewansoul");
    }
}
