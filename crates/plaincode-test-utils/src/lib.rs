//! Testing utilities and fixtures for plaincode.
//!
//! - **Fixtures**: temporary project trees built from a file list
//! - **Assertions**: file and text assertions with readable failure output
//!
//! # Example Usage
//!
//! ```rust
//! use plaincode_test_utils::TestProject;
//!
//! let project = TestProject::new()
//!     .with_file("src/main.py", "print('hello')\n")
//!     .with_gitignore("*.log\n")
//!     .build();
//!
//! project.write_file("run.log", "noise");
//! assert!(project.path().join("src/main.py").exists());
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::assert_strings_equal;
pub use fixtures::{BuiltTestProject, TestProject};
