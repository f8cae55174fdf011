//! # Command Throttle
//!
//! Decides which pose samples are worth sending to the arm. A sample is dispatched only when it
//! differs enough from the last dispatched one (novelty) and enough time has passed since that
//! dispatch (rate). How the two gates combine is set by [`GatePolicy`].
//!
//! The throttle's state changes only when a dispatch actually happens, see
//! [`Throttle::record_dispatch`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
