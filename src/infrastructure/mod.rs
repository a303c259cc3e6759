pub mod auth;
pub mod database;
pub mod rest;
pub mod store;

pub use auth::{AuthClient, AuthError, AuthUser, Session};
pub use database::SqliteStore;
pub use rest::RestStore;
pub use store::{DepartmentStore, DocumentStore, StoreError, DOCUMENT_LIMIT};
