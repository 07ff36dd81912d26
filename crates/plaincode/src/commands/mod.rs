//! Command handlers for the plaincode CLI.

pub mod diff;
pub mod logging;
pub mod reset;

pub use diff::*;
pub use logging::*;
pub use reset::*;
