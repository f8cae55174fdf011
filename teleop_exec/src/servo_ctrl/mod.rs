//! # Servo Controller Module
//!
//! This module provides a unified interface to the arm's servo controller board, so that the
//! rest of the executable can move the arm without knowing whether it's talking to real hardware
//! or to a simulation.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation for the LewanSoul/Hiwonder serial bus servo controller.
pub mod lewansoul;

/// [`ServoDriver`] implementation which only records demands.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{ArmDems, JointId};
use serde::{Deserialize, Serialize};

pub use lewansoul::LewansoulDriver;
pub use sim::SimDriver;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo controller boards.
pub trait ServoDriver {
    /// Move every joint to the demanded position over `dems.duration_ms`.
    ///
    /// Blocks until the board reports the move complete, or until the move duration has
    /// elapsed for boards which give no feedback. The demands must be full-state.
    fn move_joints(&mut self, dems: &ArmDems) -> Result<(), ServoError>;

    /// Short name of the driver for logging.
    fn name(&self) -> &str;
}

impl<D: ServoDriver + ?Sized> ServoDriver for Box<D> {
    fn move_joints(&mut self, dems: &ArmDems) -> Result<(), ServoError> {
        (**self).move_joints(dems)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("Could not open the serial port: {0}")]
    SerialOpen(serialport::Error),

    #[error("Serial write failed: {0}")]
    Write(std::io::Error),

    #[error("Demands must contain a position for every joint")]
    NotFullState,

    #[error("Position {1} for {0} cannot be sent to the controller")]
    PositionOutOfRange(JointId, i32),

    #[error("Simulated driver failure")]
    Simulated,
}

/// Selection and configuration of the servo driver.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriverParams {
    Lewansoul {
        /// Path to the serial device, e.g. `/dev/ttyUSB0`
        port: String,

        #[serde(default = "lewansoul::default_baud_rate")]
        baud_rate: u32,

        /// Serial write timeout
        ///
        /// Units: milliseconds
        #[serde(default = "lewansoul::default_timeout_ms")]
        timeout_ms: u64,
    },
    Sim {
        /// Multiplier applied to the move duration, 0 to not wait at all.
        #[serde(default)]
        time_scale: f64,
    },
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open the driver described by the parameters.
pub fn open_driver(params: &DriverParams) -> Result<Box<dyn ServoDriver + Send>, ServoError> {
    match params {
        DriverParams::Lewansoul {
            port,
            baud_rate,
            timeout_ms,
        } => Ok(Box::new(LewansoulDriver::open(
            port,
            *baud_rate,
            util::time::millis(*timeout_ms),
        )?)),
        DriverParams::Sim { time_scale } => Ok(Box::new(SimDriver::new(*time_scale))),
    }
}

/// Check the demands are full-state and every position fits the controller's position field.
pub(crate) fn check_dems(dems: &ArmDems) -> Result<(), ServoError> {
    if !dems.is_full_state() {
        return Err(ServoError::NotFullState);
    }

    for (joint, pos) in dems.positions.iter() {
        if *pos < 0 || *pos > u16::MAX as i32 {
            return Err(ServoError::PositionOutOfRange(*joint, *pos));
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_driver_params_toml() {
        let p: DriverParams = toml::from_str("kind = \"lewansoul\"\nport = \"/dev/ttyUSB0\"")
            .unwrap();
        match p {
            DriverParams::Lewansoul {
                baud_rate,
                timeout_ms,
                ..
            } => {
                assert_eq!(baud_rate, 9600);
                assert_eq!(timeout_ms, 1000);
            }
            _ => panic!("expected lewansoul"),
        }

        let p: DriverParams = toml::from_str("kind = \"sim\"").unwrap();
        assert!(matches!(p, DriverParams::Sim { time_scale } if time_scale == 0.0));
    }

    #[test]
    fn test_open_sim() {
        let mut d = open_driver(&DriverParams::Sim { time_scale: 0.0 }).unwrap();
        assert_eq!(d.name(), "sim");

        let dems = ArmDems {
            positions: JointId::all().map(|j| (j, 500)).collect(),
            duration_ms: 1000,
        };
        assert!(d.move_joints(&dems).is_ok());
    }

    #[test]
    fn test_check_dems() {
        let mut dems = ArmDems {
            positions: JointId::all().map(|j| (j, 500)).collect(),
            duration_ms: 1000,
        };
        assert!(check_dems(&dems).is_ok());

        let j1 = JointId::new(1).unwrap();
        dems.positions.insert(j1, -1);
        assert!(matches!(
            check_dems(&dems),
            Err(ServoError::PositionOutOfRange(j, -1)) if j == j1
        ));

        dems.positions.remove(&j1);
        assert!(matches!(check_dems(&dems), Err(ServoError::NotFullState)));
    }
}
