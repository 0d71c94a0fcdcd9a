use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::{DirectoryStore, StoreError, StoreResult};
use crate::models::department::{Department, DepartmentRef};
use crate::models::employee::{
    Employee, EmployeeChanges, EmployeeDraft, EmployeeRow, EmployeeWithDepartments,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const DEPARTMENT_COLUMNS: &str = "department_id, name, created_at, updated_at";
const EMPLOYEE_COLUMNS: &str = "employee_id, first_name, last_name, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    employee_id: Uuid,
    department_id: Uuid,
    name: String,
}

fn map_write_error(err: sqlx::Error, name: &str) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return StoreError::DuplicateName(name.to_string()),
            Some(FOREIGN_KEY_VIOLATION) => {
                return StoreError::ReferenceViolation(db_err.message().to_string())
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// Pairs each department id with its `position` column value.
fn assignment_positions(department_ids: &[Uuid]) -> StoreResult<Vec<(i32, Uuid)>> {
    department_ids
        .iter()
        .enumerate()
        .map(|(position, department_id)| {
            i32::try_from(position)
                .map(|position| (position, *department_id))
                .map_err(|_| StoreError::TooManyAssignments(department_ids.len()))
        })
        .collect()
}

/// Postgres-backed [`DirectoryStore`]. Assignments live in the
/// `employee_departments` join table with a `position` column for ordering.
#[derive(Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Removes every employee and department. Used by the seed command.
    pub async fn clear(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM employees").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM departments").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_assignments(
        tx: &mut Transaction<'_, Postgres>,
        employee_id: Uuid,
        department_ids: &[Uuid],
    ) -> StoreResult<()> {
        if department_ids.is_empty() {
            return Ok(());
        }

        let assignments = assignment_positions(department_ids)?;
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO employee_departments (employee_id, department_id, position) ",
        );
        builder.push_values(assignments, |mut row, (position, department_id)| {
            row.push_bind(employee_id)
                .push_bind(department_id)
                .push_bind(position);
        });

        builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(|err| map_write_error(err, ""))?;
        Ok(())
    }

    /// Batch-loads assignments for the given employees, in assignment order.
    async fn load_assignments(&self, employee_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<DepartmentRef>>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            "SELECT ed.employee_id, d.department_id, d.name \
             FROM employee_departments ed \
             JOIN departments d ON d.department_id = ed.department_id \
             WHERE ed.employee_id = ANY($1) \
             ORDER BY ed.employee_id, ed.position",
        )
        .bind(employee_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut assignments: HashMap<Uuid, Vec<DepartmentRef>> = HashMap::new();
        for row in rows {
            assignments.entry(row.employee_id).or_default().push(DepartmentRef {
                id: row.department_id,
                name: row.name,
            });
        }
        Ok(assignments)
    }

    async fn fetch_employee_rows(&self, id: Option<Uuid>) -> StoreResult<Vec<EmployeeRow>> {
        let mut query_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM employees", EMPLOYEE_COLUMNS));

        if let Some(id) = id {
            query_builder.push(" WHERE employee_id = ").push_bind(id);
        }
        query_builder.push(r#" ORDER BY last_name COLLATE "C", first_name COLLATE "C""#);

        let rows = query_builder
            .build_query_as::<EmployeeRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn populate(&self, rows: Vec<EmployeeRow>) -> StoreResult<Vec<EmployeeWithDepartments>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.employee_id).collect();
        let mut assignments = self.load_assignments(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| EmployeeWithDepartments {
                departments: assignments.remove(&row.employee_id).unwrap_or_default(),
                id: row.employee_id,
                first_name: row.first_name,
                last_name: row.last_name,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn create_department(&self, name: &str) -> StoreResult<Department> {
        let now = Utc::now();
        sqlx::query_as::<_, Department>(&format!(
            "INSERT INTO departments ({}) VALUES ($1, $2, $3, $4) RETURNING {}",
            DEPARTMENT_COLUMNS, DEPARTMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_write_error(err, name))
    }

    async fn update_department(&self, id: Uuid, name: &str) -> StoreResult<Option<Department>> {
        sqlx::query_as::<_, Department>(&format!(
            "UPDATE departments SET name = $1, updated_at = $2 WHERE department_id = $3 RETURNING {}",
            DEPARTMENT_COLUMNS
        ))
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_write_error(err, name))
    }

    async fn delete_department(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE department_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| map_write_error(err, ""))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(&format!(
            r#"SELECT {} FROM departments ORDER BY name COLLATE "C""#,
            DEPARTMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    async fn get_department(&self, id: Uuid) -> StoreResult<Option<Department>> {
        let department = sqlx::query_as::<_, Department>(&format!(
            "SELECT {} FROM departments WHERE department_id = $1",
            DEPARTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }

    async fn find_departments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<DepartmentRef>> {
        let departments = sqlx::query_as::<_, DepartmentRef>(
            "SELECT department_id, name FROM departments WHERE department_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    async fn count_employees_referencing_department(&self, department_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM employee_departments WHERE department_id = $1",
        )
        .bind(department_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn create_employee(&self, draft: &EmployeeDraft) -> StoreResult<Employee> {
        let employee_id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO employees (employee_id, first_name, last_name, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(employee_id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        Self::insert_assignments(&mut tx, employee_id, &draft.department_ids).await?;
        tx.commit().await?;

        Ok(Employee {
            id: employee_id,
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            department_ids: draft.department_ids.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_employee(&self, id: Uuid, changes: &EmployeeChanges) -> StoreResult<Option<Employee>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE employees SET \
                first_name = COALESCE($1, first_name), \
                last_name = COALESCE($2, last_name), \
                updated_at = $3 \
             WHERE employee_id = $4",
        )
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(department_ids) = &changes.department_ids {
            sqlx::query("DELETE FROM employee_departments WHERE employee_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::insert_assignments(&mut tx, id, department_ids).await?;
        }

        tx.commit().await?;
        self.get_employee_record(id).await
    }

    async fn delete_employee(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE employee_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_employee_record(&self, id: Uuid) -> StoreResult<Option<Employee>> {
        let row = match self.fetch_employee_rows(Some(id)).await?.pop() {
            Some(row) => row,
            None => return Ok(None),
        };

        let department_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT department_id FROM employee_departments WHERE employee_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Employee {
            id: row.employee_id,
            first_name: row.first_name,
            last_name: row.last_name,
            department_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn list_employees(&self) -> StoreResult<Vec<EmployeeWithDepartments>> {
        let rows = self.fetch_employee_rows(None).await?;
        self.populate(rows).await
    }

    async fn get_employee(&self, id: Uuid) -> StoreResult<Option<EmployeeWithDepartments>> {
        let rows = self.fetch_employee_rows(Some(id)).await?;
        Ok(self.populate(rows).await?.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_follow_assignment_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(assignment_positions(&[b, a]).unwrap(), vec![(0, b), (1, a)]);
        assert!(assignment_positions(&[]).unwrap().is_empty());
    }
}
