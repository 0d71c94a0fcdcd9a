//! Directory persistence: the store contract and its backends.
//!
//! The service layer only talks to [`DirectoryStore`]. `PgDirectoryStore`
//! is the production backend; `MemoryDirectoryStore` keeps the same
//! contract in process for tests and local runs.

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;
use log::info;

use crate::config::AppConfig;
use crate::models::department::{Department, DepartmentRef};
use crate::models::employee::{Employee, EmployeeChanges, EmployeeDraft, EmployeeWithDepartments};

pub use memory::MemoryDirectoryStore;
pub use postgres::PgDirectoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("department name already exists: {0}")]
    DuplicateName(String),
    #[error("department reference violated: {0}")]
    ReferenceViolation(String),
    #[error("too many department assignments: {0}")]
    TooManyAssignments(usize),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Persistence contract for departments and employees.
///
/// Implementations enforce name uniqueness and report it as
/// [`StoreError::DuplicateName`]. Referential rules between the two entity
/// types are the consistency service's job, not the store's.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn create_department(&self, name: &str) -> StoreResult<Department>;

    /// Renames a department. Returns `None` when the id is unknown.
    async fn update_department(&self, id: Uuid, name: &str) -> StoreResult<Option<Department>>;

    /// Returns `false` when nothing was deleted.
    async fn delete_department(&self, id: Uuid) -> StoreResult<bool>;

    /// All departments ordered by name.
    async fn list_departments(&self) -> StoreResult<Vec<Department>>;

    async fn get_department(&self, id: Uuid) -> StoreResult<Option<Department>>;

    /// Resolves the ids that exist; unknown ids are simply absent from the result.
    async fn find_departments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<DepartmentRef>>;

    async fn count_employees_referencing_department(&self, department_id: Uuid) -> StoreResult<i64>;

    async fn create_employee(&self, draft: &EmployeeDraft) -> StoreResult<Employee>;

    /// Applies `changes` and bumps `updated_at`. Returns `None` when the id is unknown.
    async fn update_employee(&self, id: Uuid, changes: &EmployeeChanges) -> StoreResult<Option<Employee>>;

    async fn delete_employee(&self, id: Uuid) -> StoreResult<bool>;

    /// Raw record with department ids in assignment order.
    async fn get_employee_record(&self, id: Uuid) -> StoreResult<Option<Employee>>;

    /// All employees ordered by last then first name, departments resolved.
    async fn list_employees(&self) -> StoreResult<Vec<EmployeeWithDepartments>>;

    async fn get_employee(&self, id: Uuid) -> StoreResult<Option<EmployeeWithDepartments>>;
}

/// Bounds a store call so a stalled backend surfaces as [`StoreError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

/// Connects to Postgres and applies the embedded migrations.
pub async fn create_pool(config: &AppConfig) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.store_timeout)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database connected and migrations applied");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn with_timeout_passes_through_results() {
        let value = with_timeout(Duration::from_secs(1), async { Ok::<_, StoreError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn with_timeout_reports_stalled_calls() {
        let limit = Duration::from_millis(20);
        let result = with_timeout(limit, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, StoreError>(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == limit));
    }
}
