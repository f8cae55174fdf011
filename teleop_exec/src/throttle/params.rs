//! Parameters structure for the command throttle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the command throttle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// A joint angle must change by strictly more than this to count as novel.
    ///
    /// Units: degrees
    pub angle_threshold_deg: f64,

    /// Time which must have strictly elapsed since the last dispatch.
    ///
    /// Units: seconds
    pub min_interval_s: f64,

    /// How the novelty and rate gates combine.
    pub gate_policy: GatePolicy,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Combination of the novelty and rate gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePolicy {
    /// Dispatch only if the sample is novel and the interval has elapsed.
    NoveltyAndInterval,

    /// Dispatch if the sample is novel or the interval has elapsed, so a held pose is re-sent
    /// periodically.
    NoveltyOrInterval,

    /// Dispatch every sample.
    Always,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            angle_threshold_deg: 5.0,
            min_interval_s: 0.5,
            gate_policy: GatePolicy::default(),
        }
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        GatePolicy::NoveltyAndInterval
    }
}

impl GatePolicy {
    /// Combine the result of the two gates.
    pub fn combine(&self, novel: bool, interval_elapsed: bool) -> bool {
        match self {
            GatePolicy::NoveltyAndInterval => novel && interval_elapsed,
            GatePolicy::NoveltyOrInterval => novel || interval_elapsed,
            GatePolicy::Always => true,
        }
    }
}
