//! Core types for the collision search
//!
//! Base strings, targets and search states with the tolerant coercion rules
//! the engine relies on: targets below one become one, base strings of any
//! length are accepted.

use crate::framer::PAYLOAD_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message template a counter is substituted into
///
/// Only the first [`PAYLOAD_LEN`] bytes take part in framing and the first
/// four of those are always overwritten by the counter. Anything past the
/// payload is silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BaseString(Vec<u8>);

impl BaseString {
    /// Create a base string from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Bytes as supplied by the caller, before truncation
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Bytes that actually end up in the message payload
    pub fn payload_bytes(&self) -> &[u8] {
        &self.0[..self.0.len().min(PAYLOAD_LEN)]
    }

    /// Whether framing will drop part of this base string
    pub fn is_truncated(&self) -> bool {
        self.0.len() > PAYLOAD_LEN
    }

    /// Length as supplied by the caller
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for BaseString {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for BaseString {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&[u8]> for BaseString {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Display for BaseString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Number of leading zero bits a digest must have to count as a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Target(u32);

impl Target {
    /// Easiest target the engine accepts
    pub const MIN: Target = Target(1);

    /// Create a target; zero is coerced to one rather than rejected
    pub fn new(bits: u32) -> Self {
        Self(bits.max(1))
    }

    /// Required leading zero bits
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Next harder target
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Expected number of evaluations before a match, 2^bits
    pub fn expected_evaluations(&self) -> f64 {
        2f64.powi(self.0.min(i32::MAX as u32) as i32)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::MIN
    }
}

impl From<u32> for Target {
    fn from(bits: u32) -> Self {
        Self::new(bits)
    }
}

impl From<Target> for u32 {
    fn from(target: Target) -> Self {
        target.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.0)
    }
}

/// Lifecycle of a single search call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SearchState {
    /// No search has run yet
    Idle = 0,
    /// A search is iterating counters
    Searching = 1,
    /// The last search found a collision
    Found = 2,
    /// The last search tried every counter without a match
    Exhausted = 3,
    /// The last search was cancelled
    Abandoned = 4,
}

impl SearchState {
    /// Whether a search has concluded
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SearchState::Found | SearchState::Exhausted | SearchState::Abandoned
        )
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => SearchState::Searching,
            2 => SearchState::Found,
            3 => SearchState::Exhausted,
            4 => SearchState::Abandoned,
            _ => SearchState::Idle,
        }
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchState::Idle => write!(f, "idle"),
            SearchState::Searching => write!(f, "searching"),
            SearchState::Found => write!(f, "found"),
            SearchState::Exhausted => write!(f, "exhausted"),
            SearchState::Abandoned => write!(f, "abandoned"),
        }
    }
}
