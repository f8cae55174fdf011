//! Simulated servo driver.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::ArmDems;
use log::info;
use std::{collections::VecDeque, thread, time::Duration};

use super::{check_dems, ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of recent demands kept by the simulated driver.
pub const SIM_HISTORY_LEN: usize = 64;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A driver with no hardware behind it which keeps the most recent demands it was sent.
pub struct SimDriver {
    time_scale: f64,

    /// At most `SIM_HISTORY_LEN` demands, oldest first
    history: VecDeque<ArmDems>,

    num_moves: u64,

    failures_remaining: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimDriver {
    /// Create a new simulated driver.
    ///
    /// Moves block for `time_scale` times their real duration.
    pub fn new(time_scale: f64) -> Self {
        Self {
            time_scale: time_scale.max(0.0),
            history: VecDeque::with_capacity(SIM_HISTORY_LEN),
            num_moves: 0,
            failures_remaining: 0,
        }
    }

    /// A driver which completes every move immediately.
    pub fn instant() -> Self {
        Self::new(0.0)
    }

    /// Make the next `n` moves fail.
    pub fn fail_next(&mut self, n: u32) {
        self.failures_remaining = n;
    }

    /// The most recent demands successfully sent, oldest first.
    pub fn history(&self) -> &VecDeque<ArmDems> {
        &self.history
    }

    /// The last demand successfully sent.
    pub fn last(&self) -> Option<&ArmDems> {
        self.history.back()
    }

    /// Number of moves successfully completed.
    pub fn num_moves(&self) -> u64 {
        self.num_moves
    }
}

impl ServoDriver for SimDriver {
    fn move_joints(&mut self, dems: &ArmDems) -> Result<(), ServoError> {
        check_dems(dems)?;

        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Err(ServoError::Simulated);
        }

        info!(
            "Sim move over {} ms: {:?}",
            dems.duration_ms,
            dems.positions.values().collect::<Vec<_>>()
        );

        if self.time_scale > 0.0 {
            let real = Duration::from_millis(dems.duration_ms as u64);
            thread::sleep(real.mul_f64(self.time_scale));
        }

        if self.history.len() == SIM_HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(dems.clone());
        self.num_moves += 1;

        Ok(())
    }

    fn name(&self) -> &str {
        "sim"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::JointId;

    #[test]
    fn test_history_and_failures() {
        let dems = ArmDems {
            positions: JointId::all().map(|j| (j, 500)).collect(),
            duration_ms: 1000,
        };

        let mut sim = SimDriver::instant();
        sim.fail_next(1);

        assert!(matches!(sim.move_joints(&dems), Err(ServoError::Simulated)));
        assert!(sim.history().is_empty());

        assert!(sim.move_joints(&dems).is_ok());
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.last(), Some(&dems));
        assert_eq!(sim.num_moves(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut sim = SimDriver::instant();

        for pos in 0..(SIM_HISTORY_LEN as i32 * 3) {
            let dems = ArmDems {
                positions: JointId::all().map(|j| (j, pos)).collect(),
                duration_ms: 0,
            };
            sim.move_joints(&dems).unwrap();
        }

        assert_eq!(sim.history().len(), SIM_HISTORY_LEN);
        assert_eq!(sim.num_moves(), SIM_HISTORY_LEN as u64 * 3);

        let last = SIM_HISTORY_LEN as i32 * 3 - 1;
        assert!(sim.last().unwrap().positions.values().all(|&p| p == last));
        assert!(sim.history()[0]
            .positions
            .values()
            .all(|&p| p == last + 1 - SIM_HISTORY_LEN as i32));
    }
}
