//! Configuration management for the collision search harness
//!
//! Supports configuration via command line arguments, environment variables,
//! and configuration files (YAML/JSON) with validation and defaults. The
//! engine itself is only configured through its setters; everything here
//! drives the campaign around it.

use crate::campaign::CampaignPolicy;
use crate::{BaseString, Error, Result, Target};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Complete configuration for the collision search
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(
    name = "collision-search",
    version = env!("CARGO_PKG_VERSION"),
    about = "SHA-1 partial collision search",
    long_about = "Searches for 32-bit counters whose framed SHA-1 digest starts with a growing number of zero bits"
)]
pub struct Config {
    /// Print the parsed configuration and exit
    #[arg(long)]
    #[serde(default)]
    pub print_config: bool,

    /// Configuration file path (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    #[serde(default)]
    pub config_file: Option<PathBuf>,

    /// Base string; its first four bytes are replaced by the counter
    #[arg(short = 'b', long, env = "COLLISION_BASE_STRING", default_value = DEFAULT_BASE_STRING)]
    #[serde(default = "default_base_string")]
    pub base_string: String,

    /// Target of the first round, in leading zero bits (0 is treated as 1)
    #[arg(short = 's', long, default_value = "1")]
    #[serde(default = "default_start_target")]
    pub start_target: u32,

    /// Target of the last round
    #[arg(short = 'm', long, default_value = "32")]
    #[serde(default = "default_max_target")]
    pub max_target: u32,

    /// Interval between status reports (e.g. "10s", "500ms")
    #[arg(short = 'i', long, default_value = "10s")]
    #[serde(default = "default_report_interval")]
    pub report_interval: String,

    /// Stop escalating after a round that took this many status reports
    #[arg(long, default_value = "10")]
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,

    /// Abandon a round after this many status reports without a collision
    #[arg(long)]
    #[serde(default)]
    pub abandon_after_ticks: Option<u32>,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, default_value = "text")]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

/// Base string used when none is configured
pub const DEFAULT_BASE_STRING: &str = "XXXX Keep your FPGA spinning!";

impl Config {
    /// Parse the command line and merge in the config file if given
    pub async fn load() -> Result<Self> {
        let mut config = Self::parse();

        if let Some(config_file) = config.config_file.clone() {
            let file_config = Self::load_from_file(&config_file).await?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(Error::from)
        } else {
            // Default to YAML
            serde_yaml::from_str(&content).map_err(Error::from)
        }
    }

    /// Merge CLI config with file config
    ///
    /// A file value is taken wherever the command line still holds its
    /// default, so explicit flags win.
    fn merge_with_file(mut self, file: Self) -> Self {
        if self.base_string == DEFAULT_BASE_STRING {
            self.base_string = file.base_string;
        }
        if self.start_target == default_start_target() {
            self.start_target = file.start_target;
        }
        if self.max_target == default_max_target() {
            self.max_target = file.max_target;
        }
        if self.report_interval == default_report_interval() {
            self.report_interval = file.report_interval;
        }
        if self.max_ticks == default_max_ticks() {
            self.max_ticks = file.max_ticks;
        }
        if self.abandon_after_ticks.is_none() {
            self.abandon_after_ticks = file.abandon_after_ticks;
        }
        if self.log_level == default_log_level() {
            self.log_level = file.log_level;
        }
        if self.log_format == default_log_format() {
            self.log_format = file.log_format;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let interval = self.report_interval_duration()?;
        if interval.is_zero() {
            return Err(Error::config("Report interval must be greater than 0"));
        }

        if self.max_target() < self.start_target() {
            return Err(Error::config(format!(
                "Max target ({}) is below start target ({})",
                self.max_target(),
                self.start_target()
            )));
        }

        if self.max_ticks == 0 {
            return Err(Error::config("Max ticks must be greater than 0"));
        }

        if self.abandon_after_ticks == Some(0) {
            return Err(Error::config("Abandon after ticks must be greater than 0"));
        }

        Ok(())
    }

    /// Get the base string
    pub fn base_string(&self) -> BaseString {
        BaseString::from(self.base_string.as_str())
    }

    /// Get the first round's target
    pub fn start_target(&self) -> Target {
        Target::new(self.start_target)
    }

    /// Get the last round's target
    pub fn max_target(&self) -> Target {
        Target::new(self.max_target)
    }

    /// Get parsed report interval
    pub fn report_interval_duration(&self) -> Result<Duration> {
        humantime::parse_duration(&self.report_interval).map_err(|e| {
            Error::config(format!(
                "Invalid report interval '{}': {}",
                self.report_interval, e
            ))
        })
    }

    /// Escalation policy for the campaign
    pub fn campaign_policy(&self) -> Result<CampaignPolicy> {
        Ok(CampaignPolicy {
            start_target: self.start_target(),
            max_target: self.max_target(),
            report_interval: self.report_interval_duration()?,
            max_ticks: self.max_ticks,
            abandon_after_ticks: self.abandon_after_ticks,
        })
    }
}

// Default value functions for serde
fn default_base_string() -> String { DEFAULT_BASE_STRING.to_string() }
fn default_start_target() -> u32 { 1 }
fn default_max_target() -> u32 { 32 }
fn default_report_interval() -> String { "10s".to_string() }
fn default_max_ticks() -> u32 { 10 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_format() -> LogFormat { LogFormat::Text }
