use crate::domain::{DakDocument, Department, DocumentInsert, DocumentPatch};
use thiserror::Error;

/// Row cap applied to every document listing.
pub const DOCUMENT_LIMIT: usize = 50;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid request: {0}")]
    Request(#[from] hyper::http::Error),

    /// A structured error body returned by the store.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
    },

    #[error("Malformed store response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Document not found")]
    NotFound,

    #[error("Store connection lock poisoned")]
    Poisoned,
}

/// Row-level access to the `dak_documents` table.
///
/// Implementations assign `id`, `dak_number` and the audit timestamps, and
/// return rows with the owning department's name and code joined in.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Newest first by `created_at`, at most `limit` rows.
    async fn list_documents(&self, limit: usize) -> Result<Vec<DakDocument>, StoreError>;

    async fn insert_document(&self, row: &DocumentInsert) -> Result<DakDocument, StoreError>;

    /// Applies `patch` to the row with `id`. Fails with `NotFound` when no row matches.
    async fn update_document(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> Result<DakDocument, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait DepartmentStore {
    /// Active departments ordered by name.
    async fn list_active_departments(&self) -> Result<Vec<Department>, StoreError>;
}

impl<S: DocumentStore> DocumentStore for std::sync::Arc<S> {
    async fn list_documents(&self, limit: usize) -> Result<Vec<DakDocument>, StoreError> {
        (**self).list_documents(limit).await
    }

    async fn insert_document(&self, row: &DocumentInsert) -> Result<DakDocument, StoreError> {
        (**self).insert_document(row).await
    }

    async fn update_document(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> Result<DakDocument, StoreError> {
        (**self).update_document(id, patch).await
    }
}

impl<S: DepartmentStore> DepartmentStore for std::sync::Arc<S> {
    async fn list_active_departments(&self) -> Result<Vec<Department>, StoreError> {
        (**self).list_active_departments().await
    }
}
