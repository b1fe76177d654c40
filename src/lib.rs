//! Partial Collision Search
//!
//! Exhaustive search for 32-bit counters whose framed SHA-1 digest starts
//! with a requested number of zero bits:
//! - Fixed 64-byte message framing with standard padding
//! - Bit-granular leading-zero target matching
//! - Lock-free progress observable while a search runs
//! - Periodic throughput reporting and an escalating campaign driver

pub mod campaign;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod framer;
pub mod reporter;
pub mod types;
pub mod utils;

pub use config::Config;
pub use engine::{Engine, ProgressHandle};
pub use error::{Error, Result};
pub use types::*;

/// Application information
pub const APP_NAME: &str = "collision-search";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
