//! Error catalog for rexec.
//!
//! Every fatal condition the CLI can report carries a stable code, a
//! category and remediation steps.
//!
//! # Error Code Ranges
//!
//! | Range      | Category | Description                              |
//! |------------|----------|------------------------------------------|
//! | E001-E099  | Config   | Configuration files and environment      |
//! | E100-E199  | Network  | SSH session and remote transport         |
//! | E200-E299  | Sync     | Probe, bootstrap, diff and file transfer |

pub mod catalog;

pub use catalog::{ErrorCategory, ErrorCode, ErrorEntry};
