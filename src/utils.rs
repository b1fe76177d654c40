//! Utility functions and helpers
//!
//! Formatting used by the reporter and the campaign driver.

use std::time::Duration;

/// Compute a throughput figure over a time period
pub fn compute_hash_rate(evaluations: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        evaluations as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

/// Format hash rate as a human-readable string
pub fn format_hash_rate(hashes_per_sec: f64) -> String {
    const UNITS: &[&str] = &["H/s", "KH/s", "MH/s", "GH/s", "TH/s", "PH/s"];
    let mut rate = hashes_per_sec;
    let mut unit_index = 0;

    while rate >= 1000.0 && unit_index < UNITS.len() - 1 {
        rate /= 1000.0;
        unit_index += 1;
    }

    format!("{:.2} {}", rate, UNITS[unit_index])
}

/// Format a digest as hex in groups of four bytes
pub fn format_digest(digest: &[u8]) -> String {
    digest
        .chunks(4)
        .map(hex::encode)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a duration, rounded to milliseconds
pub fn format_elapsed(elapsed: Duration) -> String {
    let rounded = Duration::from_millis(elapsed.as_millis().min(u64::MAX as u128) as u64);
    humantime::format_duration(rounded).to_string()
}
