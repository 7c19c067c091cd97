//! In-process store and notifier
//!
//! Deterministic stand-ins for the spreadsheet and the e-mail API with call
//! counters and scripted failures.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Notification, Notifier, Row, RowValues, TabularStore};
use crate::utils::errors::{NotifyError, StoreError};

/// Store holding tables in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    failures: Mutex<VecDeque<StoreError>>,
    delay: Mutex<Option<Duration>>,
    append_calls: AtomicUsize,
    read_calls: AtomicUsize,
}

impl MemoryStore {
    /// Store with the given (empty) tables
    pub fn with_tables(tables: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut guard = store.tables.lock().unwrap_or_else(|e| e.into_inner());
            for table in tables {
                guard.insert(table.to_string(), Vec::new());
            }
        }
        store
    }

    /// Pre-populate `table` with rows
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        guard.entry(table.to_string()).or_default().extend(rows);
    }

    /// Fail the next calls, in order, with these errors
    pub fn fail_next(&self, errors: Vec<StoreError>) {
        let mut guard = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        guard.extend(errors);
    }

    /// Sleep this long before each call
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        let guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(table).cloned().unwrap_or_default()
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    async fn before_call(&self) -> Result<(), StoreError> {
        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match scripted {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn append_row(&self, table: &str, row: &RowValues) -> Result<(), StoreError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;

        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let rows = guard
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        rows.push(
            row.iter()
                .map(|(column, value)| (column.to_string(), value.clone()))
                .collect(),
        );
        Ok(())
    }

    async fn read_rows(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;

        let guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .get(table)
            .cloned()
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }
}

/// Notifier recording every message, optionally failing
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failure: Mutex<Option<NotifyError>>,
    calls: AtomicUsize,
}

impl RecordingNotifier {
    /// Notifier whose every call fails with `error`
    pub fn failing(error: NotifyError) -> Self {
        let notifier = Self::default();
        *notifier.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
        notifier
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(err);
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(())
    }
}
