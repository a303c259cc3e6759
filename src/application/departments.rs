use super::types::{AccessError, ListHandle, ListState};
use crate::domain::Department;
use crate::infrastructure::DepartmentStore;

/// Read-only list of active departments, used to populate selectors.
pub struct DepartmentAccess<S> {
    store: S,
    list: ListHandle<Department>,
}

impl<S: DepartmentStore> DepartmentAccess<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            list: ListHandle::new(),
        }
    }

    pub fn watch(&self) -> ListHandle<Department> {
        self.list.clone()
    }

    pub async fn snapshot(&self) -> ListState<Department> {
        self.list.snapshot().await
    }

    pub async fn departments(&self) -> Vec<Department> {
        self.list.items().await
    }

    pub async fn mount(&self) {
        let _ = self.fetch().await;
    }

    pub async fn fetch(&self) -> Result<(), AccessError> {
        let ticket = self.list.begin();

        match self.store.list_active_departments().await {
            Ok(departments) => {
                ticket.finish(Ok(departments)).await;
                Ok(())
            }
            Err(e) => {
                let err = AccessError::from(e);
                log::error!("Failed to fetch departments: {}", err);
                ticket.finish(Err(err.to_string())).await;
                Err(err)
            }
        }
    }
}
