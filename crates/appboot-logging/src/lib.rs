//! appboot-logging - Tracing setup for the loader
//!
//! This crate provides:
//! - [`LogLevel`] and [`LogFormat`] as they appear in configuration
//! - [`init_logging`] installing a stderr subscriber, overridable through
//!   the [`LOG_ENV`] environment variable

mod init;
mod level;

pub use init::{LOG_ENV, init_logging};
pub use level::{LogFormat, LogLevel};
