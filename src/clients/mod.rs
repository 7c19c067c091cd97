//! Clients for external services
//!
//! The submission flow only talks to two seams: a tabular store (the
//! spreadsheet) and a notifier (operator e-mail). Production implementations
//! live in `sheets_client` and `resend_client`; `memory` has in-process
//! stand-ins used by the test-suite.

pub mod memory;
pub mod resend_client;
pub mod sheets_client;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::utils::errors::{NotifyError, StoreError};

pub use resend_client::ResendNotifier;
pub use sheets_client::GoogleSheetsClient;

/// A row read back from the store, keyed by header
pub type Row = HashMap<String, String>;

/// Ordered `(column, value)` pairs of a row to append
pub type RowValues = [(&'static str, String)];

/// Append-only tabular store addressed by logical table name
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Append one row to `table`. Columns are matched to the table header by name.
    async fn append_row(&self, table: &str, row: &RowValues) -> Result<(), StoreError>;

    /// Read every data row of `table`
    async fn read_rows(&self, table: &str) -> Result<Vec<Row>, StoreError>;
}

/// Message sent to the operators
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
