//! Service configuration
//!
//! Credentials, spreadsheet identifiers, notification settings and the
//! persistence timeout/retry policy, all read once from the environment.

pub mod environment;

pub use environment::*;
