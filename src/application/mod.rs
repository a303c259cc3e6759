pub mod dashboard;
mod departments;
mod documents;
mod types;

pub use dashboard::{ActivityItem, Dashboard, DashboardStats, DepartmentRollup};
pub use departments::DepartmentAccess;
pub use documents::DocumentAccess;
pub use types::{AccessError, ListHandle, ListState};
