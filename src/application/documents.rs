use super::types::{AccessError, ListHandle, ListState};
use crate::domain::{DakDocument, DocumentPatch, NewDocument};
use crate::infrastructure::{AuthUser, DocumentStore, DOCUMENT_LIMIT};
use chrono::Utc;

/// Fetches, creates and updates DAK documents for one view.
///
/// The identity is passed in explicitly; without one, `mount` does not fetch.
/// Every write is followed by a full re-fetch so the list always mirrors the
/// store's own ordering.
pub struct DocumentAccess<S> {
    store: S,
    user: Option<AuthUser>,
    list: ListHandle<DakDocument>,
}

impl<S: DocumentStore> DocumentAccess<S> {
    pub fn new(store: S, user: Option<AuthUser>) -> Self {
        Self {
            store,
            user,
            list: ListHandle::new(),
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// Handle for observing the list from elsewhere.
    pub fn watch(&self) -> ListHandle<DakDocument> {
        self.list.clone()
    }

    pub async fn snapshot(&self) -> ListState<DakDocument> {
        self.list.snapshot().await
    }

    pub async fn documents(&self) -> Vec<DakDocument> {
        self.list.items().await
    }

    /// Initial load. Returns whether a fetch was attempted.
    pub async fn mount(&self) -> bool {
        match &self.user {
            Some(user) => {
                log::debug!("Loading documents for {}", user.id);
                // Failure is recorded in the list state.
                let _ = self.fetch().await;
                true
            }
            None => {
                log::debug!("No signed-in user, skipping document fetch");
                false
            }
        }
    }

    /// Replace the list with the newest documents. On failure the previous
    /// rows stay and the error message is recorded.
    pub async fn fetch(&self) -> Result<(), AccessError> {
        let ticket = self.list.begin();

        match self.store.list_documents(DOCUMENT_LIMIT).await {
            Ok(docs) => {
                log::debug!("Fetched {} documents", docs.len());
                ticket.finish(Ok(docs)).await;
                Ok(())
            }
            Err(e) => {
                let err = AccessError::from(e);
                log::error!("Failed to fetch documents: {}", err);
                ticket.finish(Err(err.to_string())).await;
                Err(err)
            }
        }
    }

    /// Register a new document and return the stored row.
    pub async fn create(&self, fields: NewDocument) -> Result<DakDocument, AccessError> {
        let row = fields.normalize(Utc::now())?;
        log::debug!("Inserting document: {:?}", row);

        let created = self.store.insert_document(&row).await.map_err(|e| {
            log::error!("Insert failed: {}", e);
            AccessError::from(e)
        })?;
        log::info!("Registered {} ({})", created.dak_number, created.direction);

        let _ = self.fetch().await;
        Ok(created)
    }

    /// Apply a partial update to one document and return the patched row.
    pub async fn update(&self, id: &str, patch: DocumentPatch) -> Result<DakDocument, AccessError> {
        let updated = self.store.update_document(id, &patch).await.map_err(|e| {
            log::error!("Update of {} failed: {}", id, e);
            AccessError::from(e)
        })?;
        log::info!("Updated {} (status {})", updated.dak_number, updated.status);

        let _ = self.fetch().await;
        Ok(updated)
    }
}
