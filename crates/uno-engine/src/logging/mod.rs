//! Logging utilities.
//!
//! The crate logs through the `log` facade only; this module offers an
//! `env_logger` setup for binaries and tests that have none of their own.

mod init;

pub use init::{LoggingConfig, init_logging};
