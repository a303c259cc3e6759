use crate::domain::ValidationError;
use crate::infrastructure::StoreError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failure surfaced by the access layers. Every variant carries a message
/// fit for display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// A required field was missing; nothing was sent to the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store answered with a failure.
    #[error("{0}")]
    Store(String),

    /// Anything else, reduced to its text.
    #[error("{0}")]
    Unknown(String),
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Api { .. }
            | StoreError::Constraint(_)
            | StoreError::NotFound
            | StoreError::Sqlite(_) => AccessError::Store(err.to_string()),
            other => AccessError::Unknown(other.to_string()),
        }
    }
}

/// What a view renders: the last fetched rows plus loading and error flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

#[derive(Debug)]
struct Rows<T> {
    items: Vec<T>,
    error: Option<String>,
}

#[derive(Debug)]
struct Shared<T> {
    rows: RwLock<Rows<T>>,
    /// Newest ticket handed out by `begin`.
    issued: AtomicU64,
    /// Highest ticket that has finished or been dropped. Loading while behind `issued`.
    settled: AtomicU64,
}

impl<T> Shared<T> {
    fn loading(&self) -> bool {
        self.issued.load(Ordering::SeqCst) > self.settled.load(Ordering::SeqCst)
    }
}

/// Shared, observable list state. Clones point at the same list, so another
/// task can watch `loading` flip while a fetch is in flight.
#[derive(Debug)]
pub struct ListHandle<T> {
    inner: Arc<Shared<T>>,
}

impl<T> Clone for ListHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> ListHandle<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Shared {
                rows: RwLock::new(Rows {
                    items: Vec::new(),
                    error: None,
                }),
                issued: AtomicU64::new(0),
                settled: AtomicU64::new(0),
            }),
        }
    }

    pub async fn snapshot(&self) -> ListState<T> {
        let rows = self.inner.rows.read().await;
        ListState {
            items: rows.items.clone(),
            loading: self.inner.loading(),
            error: rows.error.clone(),
        }
    }

    pub async fn items(&self) -> Vec<T> {
        self.inner.rows.read().await.items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.loading()
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.rows.read().await.error.clone()
    }

    /// Mark a fetch as started. The returned ticket settles the fetch when it
    /// is finished or dropped, so a cancelled fetch never leaves `loading` set.
    pub(crate) fn begin(&self) -> FetchTicket<T> {
        let ticket = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        FetchTicket {
            shared: Arc::clone(&self.inner),
            ticket,
        }
    }
}

/// One in-flight fetch against a [`ListHandle`].
pub(crate) struct FetchTicket<T> {
    shared: Arc<Shared<T>>,
    ticket: u64,
}

impl<T> FetchTicket<T> {
    /// Apply a fetch outcome. Returns false when a newer fetch has been issued
    /// since this one; the outcome is dropped in that case.
    pub(crate) async fn finish(self, outcome: Result<Vec<T>, String>) -> bool {
        let mut rows = self.shared.rows.write().await;
        if self.ticket != self.shared.issued.load(Ordering::SeqCst) {
            return false;
        }

        match outcome {
            Ok(items) => {
                rows.items = items;
                rows.error = None;
            }
            // Keep the last good rows on screen.
            Err(message) => rows.error = Some(message),
        }
        true
    }
}

impl<T> Drop for FetchTicket<T> {
    fn drop(&mut self) {
        self.shared.settled.fetch_max(self.ticket, Ordering::SeqCst);
    }
}
