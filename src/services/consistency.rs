//! Cross-entity integrity rules between employees and departments.
//!
//! The store can only guarantee per-table rules (unique names, existing
//! rows). The rules here span both entity types:
//! - an employee always references at least one existing department;
//! - a department with assigned employees cannot be deleted;
//! - a department set that only differs in order is not a change.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use uuid::Uuid;

use crate::db::{with_timeout, DirectoryStore};
use crate::errors::AppError;
use crate::models::employee::Employee;

pub struct ConsistencyService<S> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: DirectoryStore> ConsistencyService<S> {
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Resolves `raw_ids` against the store.
    ///
    /// Returns the ids in input order with duplicates dropped. Fails with
    /// a validation error when the list is empty or when any id is
    /// malformed or unknown; the message names every such id.
    pub async fn validate_department_references(&self, raw_ids: &[String]) -> Result<Vec<Uuid>, AppError> {
        if raw_ids.is_empty() {
            return Err(AppError::Validation(
                "At least one department ID is required.".to_string(),
            ));
        }

        let parsed: Vec<Option<Uuid>> = raw_ids
            .iter()
            .map(|raw| Uuid::parse_str(raw.trim()).ok())
            .collect();

        let mut ids: Vec<Uuid> = Vec::with_capacity(raw_ids.len());
        for id in parsed.iter().flatten() {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }

        let found: HashSet<Uuid> = if ids.is_empty() {
            HashSet::new()
        } else {
            with_timeout(self.timeout, self.store.find_departments_by_ids(&ids))
                .await?
                .into_iter()
                .map(|department| department.id)
                .collect()
        };

        let mut unmatched: Vec<&str> = Vec::new();
        for (raw, id) in raw_ids.iter().zip(&parsed) {
            let resolves = id.map_or(false, |id| found.contains(&id));
            if !resolves && !unmatched.contains(&raw.as_str()) {
                unmatched.push(raw.as_str());
            }
        }

        if !unmatched.is_empty() {
            warn!("Rejected unresolved department ids: {:?}", unmatched);
            return Err(AppError::Validation(format!(
                "Invalid department ID(s) provided: {}",
                unmatched.join(", ")
            )));
        }

        Ok(ids)
    }

    pub async fn assert_department_deletable(&self, department_id: Uuid) -> Result<(), AppError> {
        let count = with_timeout(
            self.timeout,
            self.store.count_employees_referencing_department(department_id),
        )
        .await?;

        if count > 0 {
            warn!(
                "Blocked delete of department {}: {} employee(s) assigned",
                department_id, count
            );
            return Err(AppError::conflict_with_employees(count));
        }
        Ok(())
    }

    /// Decides whether `new_ids` changes `employee`'s department set.
    ///
    /// `None` input means the field was omitted. The returned `Some(ids)`
    /// is the validated replacement to write; `None` means no write.
    pub async fn apply_employee_department_update(
        &self,
        employee: &Employee,
        new_ids: Option<&[String]>,
    ) -> Result<Option<Vec<Uuid>>, AppError> {
        let Some(new_ids) = new_ids else {
            return Ok(None);
        };

        let validated = self.validate_department_references(new_ids).await?;
        if same_members(&employee.department_ids, &validated) {
            return Ok(None);
        }
        Ok(Some(validated))
    }
}

fn same_members(current: &[Uuid], next: &[Uuid]) -> bool {
    let mut current = current.to_vec();
    let mut next = next.to_vec();
    current.sort();
    current.dedup();
    next.sort();
    next.dedup();
    current == next
}
