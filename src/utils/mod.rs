//! Shared utilities
//!
//! Error types, field validation helpers and loose field lookup.

pub mod errors;
pub mod fields;
pub mod validation;
