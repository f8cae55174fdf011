//! # Timestamped script interpreter module
//!
//! This module provides an interpreter for timestamped JSON scripts. A script is a sequence of
//! entries of the form
//!
//! ```text
//! <time_s>: <json payload>;
//! ```
//!
//! where `time_s` is the offset in seconds from the start of the script at which the payload
//! becomes due. Lines which don't match (comments, blank lines) are ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An entry which is scripted to become due at a specific time.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    /// The time the entry is due at, relative to the start of the script
    pub exec_time_s: f64,

    /// The payload of the entry
    pub payload: T,
}

/// A script interpreter.
///
/// After initialising with the path to the script use `.get_pending` to acquire the entries
/// which have become due.
pub struct ScriptInterpreter<T> {
    script_path: PathBuf,
    entries: VecDeque<Entry<T>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)"
    )]
    InvalidTimestamp(String),

    #[error("Script timestamps must not decrease, found {1} s after {0} s")]
    OutOfOrder(f64, f64),

    #[error("Script contains an invalid payload at {0} s: {1}")]
    InvalidPayload(f64, serde_json::Error),
}

/// Entries pending execution.
#[derive(Debug)]
pub enum Pending<T> {
    None,
    Some(Vec<T>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> ScriptInterpreter<T>
where
    T: DeserializeOwned,
{
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let entries = Self::parse(&script)?;

        Ok(ScriptInterpreter {
            script_path: path,
            entries,
        })
    }

    /// Parse the contents of a script.
    pub fn parse(script: &str) -> Result<VecDeque<Entry<T>>, ScriptError> {
        let mut queue: VecDeque<Entry<T>> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("script regex is valid");

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            if let Some(last) = queue.back() {
                if exec_time_s < last.exec_time_s {
                    return Err(ScriptError::OutOfOrder(last.exec_time_s, exec_time_s));
                }
            }

            let payload_str = cap.get(3).map(|m| m.as_str()).unwrap_or("");
            let payload = serde_json::from_str(payload_str)
                .map_err(|e| ScriptError::InvalidPayload(exec_time_s, e))?;

            queue.push_back(Entry {
                exec_time_s,
                payload,
            });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(queue)
    }
}

impl<T> ScriptInterpreter<T> {
    /// Build an interpreter directly from a list of entries.
    pub fn from_entries(entries: VecDeque<Entry<T>>) -> Self {
        Self {
            script_path: PathBuf::new(),
            entries,
        }
    }

    /// Return the payloads which are due at `current_time_s` (seconds since the start of the
    /// script), in script order.
    pub fn get_pending(&mut self, current_time_s: f64) -> Pending<T> {
        // If the queue is empty the script is over
        if self.entries.is_empty() {
            return Pending::EndOfScript;
        }

        let mut due: Vec<T> = vec![];

        while self
            .entries
            .front()
            .map(|e| e.exec_time_s <= current_time_s)
            .unwrap_or(false)
        {
            if let Some(e) = self.entries.pop_front() {
                due.push(e.payload);
            }
        }

        if due.is_empty() {
            Pending::None
        } else {
            Pending::Some(due)
        }
    }

    /// Time at which the next entry becomes due, if any remain.
    pub fn next_due_s(&self) -> Option<f64> {
        self.entries.front().map(|e| e.exec_time_s)
    }

    /// Get the number of entries remaining in the script
    pub fn get_num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.entries.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }

    /// Path the script was loaded from (empty if built from entries).
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }
}
