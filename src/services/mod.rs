//! Business logic
//!
//! Fare pricing is pure; the submission service owns every side effect of a
//! form submission.

pub mod booking_id;
pub mod fare_calculator;
pub mod normalization;
pub mod submission_service;

pub use submission_service::{SubmissionReceipt, SubmissionService, SubmissionSettings};
