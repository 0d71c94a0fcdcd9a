use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use uuid::Uuid;

use crate::db::{with_timeout, DirectoryStore, StoreResult};
use crate::errors::AppError;
use crate::models::department::Department;
use crate::models::employee::{EmployeeChanges, EmployeeDraft, EmployeeUpdate, EmployeeWithDepartments, NewEmployee};
use crate::services::consistency::ConsistencyService;
use crate::utils::validation::normalize_required;

const DEPARTMENT_NAME_REQUIRED: &str = "Department name is required.";
const FIRST_NAME_REQUIRED: &str = "First name is required.";
const LAST_NAME_REQUIRED: &str = "Last name is required.";

/// Entry point for every directory operation.
///
/// Inputs are trimmed and checked here, cross-entity rules go through
/// [`ConsistencyService`], and every store call is bounded by the
/// configured timeout.
pub struct DirectoryService<S> {
    store: Arc<S>,
    consistency: ConsistencyService<S>,
    timeout: Duration,
}

impl<S: DirectoryStore> DirectoryService<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        Self::from_shared(Arc::new(store), timeout)
    }

    pub fn from_shared(store: Arc<S>, timeout: Duration) -> Self {
        Self {
            consistency: ConsistencyService::new(store.clone(), timeout),
            store,
            timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn timed<T>(&self, call: impl Future<Output = StoreResult<T>>) -> Result<T, AppError> {
        Ok(with_timeout(self.timeout, call).await?)
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>, AppError> {
        self.timed(self.store.list_departments()).await
    }

    pub async fn get_department(&self, id: Uuid) -> Result<Department, AppError> {
        self.timed(self.store.get_department(id))
            .await?
            .ok_or_else(AppError::department_not_found)
    }

    pub async fn create_department(&self, name: &str) -> Result<Department, AppError> {
        let name = normalize_required(name, DEPARTMENT_NAME_REQUIRED)?;
        let department = self.timed(self.store.create_department(&name)).await?;
        info!("Created department {} ({})", department.id, department.name);
        Ok(department)
    }

    /// Renames a department when `name` is given and differs from the current one.
    pub async fn update_department(&self, id: Uuid, name: Option<&str>) -> Result<Department, AppError> {
        let current = self.get_department(id).await?;
        let Some(name) = name else {
            return Ok(current);
        };

        let name = normalize_required(name, DEPARTMENT_NAME_REQUIRED)?;
        if name == current.name {
            return Ok(current);
        }

        self.timed(self.store.update_department(id, &name))
            .await?
            .ok_or_else(AppError::department_not_found)
    }

    pub async fn delete_department(&self, id: Uuid) -> Result<(), AppError> {
        self.get_department(id).await?;
        self.consistency.assert_department_deletable(id).await?;

        if !self.timed(self.store.delete_department(id)).await? {
            return Err(AppError::department_not_found());
        }
        info!("Deleted department {}", id);
        Ok(())
    }

    pub async fn list_employees(&self) -> Result<Vec<EmployeeWithDepartments>, AppError> {
        self.timed(self.store.list_employees()).await
    }

    pub async fn get_employee(&self, id: Uuid) -> Result<EmployeeWithDepartments, AppError> {
        self.timed(self.store.get_employee(id))
            .await?
            .ok_or_else(AppError::employee_not_found)
    }

    pub async fn create_employee(&self, new_employee: &NewEmployee) -> Result<EmployeeWithDepartments, AppError> {
        let first_name = normalize_required(&new_employee.first_name, FIRST_NAME_REQUIRED)?;
        let last_name = normalize_required(&new_employee.last_name, LAST_NAME_REQUIRED)?;
        let department_ids = self
            .consistency
            .validate_department_references(new_employee.departments.as_deref().unwrap_or_default())
            .await?;

        let draft = EmployeeDraft {
            first_name,
            last_name,
            department_ids,
        };
        let employee = self.timed(self.store.create_employee(&draft)).await?;
        info!("Created employee {}", employee.id);

        self.get_employee(employee.id).await
    }

    /// Applies only the supplied fields. When nothing actually changes the
    /// record is returned as is and `updatedAt` keeps its value.
    pub async fn update_employee(&self, id: Uuid, update: &EmployeeUpdate) -> Result<EmployeeWithDepartments, AppError> {
        let current = self
            .timed(self.store.get_employee_record(id))
            .await?
            .ok_or_else(AppError::employee_not_found)?;

        let mut changes = EmployeeChanges::default();
        if let Some(first_name) = &update.first_name {
            let first_name = normalize_required(first_name, FIRST_NAME_REQUIRED)?;
            if first_name != current.first_name {
                changes.first_name = Some(first_name);
            }
        }
        if let Some(last_name) = &update.last_name {
            let last_name = normalize_required(last_name, LAST_NAME_REQUIRED)?;
            if last_name != current.last_name {
                changes.last_name = Some(last_name);
            }
        }
        changes.department_ids = self
            .consistency
            .apply_employee_department_update(&current, update.departments.as_deref())
            .await?;

        if !changes.is_empty() {
            self.timed(self.store.update_employee(id, &changes))
                .await?
                .ok_or_else(AppError::employee_not_found)?;
            info!("Updated employee {}", id);
        }

        self.get_employee(id).await
    }

    pub async fn delete_employee(&self, id: Uuid) -> Result<(), AppError> {
        if !self.timed(self.store.delete_employee(id)).await? {
            return Err(AppError::employee_not_found());
        }
        info!("Deleted employee {}", id);
        Ok(())
    }
}
