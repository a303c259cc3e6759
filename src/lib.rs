pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{AccessError, Dashboard, DepartmentAccess, DocumentAccess};
pub use domain::{DakDocument, Department, DocumentPatch, NewDocument};
pub use infrastructure::{AuthClient, RestStore, SqliteStore};
