//! Shared utilities for plaincode.
//!
//! This crate provides common utilities used across the plaincode workspace:
//! - Logging setup with tracing
//! - Canonical project-relative paths
//! - RAII-based timing for operation measurement

pub mod log;
pub mod path;
pub mod timing;

pub use timing::TimingGuard;
