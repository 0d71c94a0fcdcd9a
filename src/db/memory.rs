use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DirectoryStore, StoreError, StoreResult};
use crate::models::department::{Department, DepartmentRef};
use crate::models::employee::{Employee, EmployeeChanges, EmployeeDraft, EmployeeWithDepartments};

#[derive(Default)]
struct State {
    departments: HashMap<Uuid, Department>,
    employees: HashMap<Uuid, Employee>,
}

impl State {
    fn name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.departments
            .values()
            .any(|d| d.name == name && Some(d.id) != except)
    }

    fn resolve(&self, employee: &Employee) -> EmployeeWithDepartments {
        let departments = employee
            .department_ids
            .iter()
            .filter_map(|id| self.departments.get(id))
            .map(DepartmentRef::from)
            .collect();

        EmployeeWithDepartments {
            id: employee.id,
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            departments,
            created_at: employee.created_at,
            updated_at: employee.updated_at,
        }
    }
}

/// In-process [`DirectoryStore`] with the same ordering and uniqueness
/// behaviour as the Postgres backend.
#[derive(Default)]
pub struct MemoryDirectoryStore {
    state: RwLock<State>,
}

impl MemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn create_department(&self, name: &str) -> StoreResult<Department> {
        let mut state = self.state.write().await;
        if state.name_taken(name, None) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }

        let now = Utc::now();
        let department = Department {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.departments.insert(department.id, department.clone());
        Ok(department)
    }

    async fn update_department(&self, id: Uuid, name: &str) -> StoreResult<Option<Department>> {
        let mut state = self.state.write().await;
        if !state.departments.contains_key(&id) {
            return Ok(None);
        }
        if state.name_taken(name, Some(id)) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }

        Ok(state.departments.get_mut(&id).map(|department| {
            department.name = name.to_string();
            department.updated_at = Utc::now();
            department.clone()
        }))
    }

    async fn delete_department(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.employees.values().any(|e| e.department_ids.contains(&id)) {
            return Err(StoreError::ReferenceViolation(format!(
                "department {} is still assigned",
                id
            )));
        }
        Ok(state.departments.remove(&id).is_some())
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let state = self.state.read().await;
        let mut departments: Vec<Department> = state.departments.values().cloned().collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn get_department(&self, id: Uuid) -> StoreResult<Option<Department>> {
        Ok(self.state.read().await.departments.get(&id).cloned())
    }

    async fn find_departments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<DepartmentRef>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.departments.get(id))
            .map(DepartmentRef::from)
            .collect())
    }

    async fn count_employees_referencing_department(&self, department_id: Uuid) -> StoreResult<i64> {
        let state = self.state.read().await;
        let count = state
            .employees
            .values()
            .filter(|e| e.department_ids.contains(&department_id))
            .count();
        Ok(count as i64)
    }

    async fn create_employee(&self, draft: &EmployeeDraft) -> StoreResult<Employee> {
        let mut state = self.state.write().await;
        if let Some(missing) = draft
            .department_ids
            .iter()
            .find(|id| !state.departments.contains_key(id))
        {
            return Err(StoreError::ReferenceViolation(format!(
                "department {} does not exist",
                missing
            )));
        }

        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            department_ids: draft.department_ids.clone(),
            created_at: now,
            updated_at: now,
        };
        state.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    async fn update_employee(&self, id: Uuid, changes: &EmployeeChanges) -> StoreResult<Option<Employee>> {
        let mut state = self.state.write().await;
        if let Some(ids) = &changes.department_ids {
            if let Some(missing) = ids.iter().find(|id| !state.departments.contains_key(id)) {
                return Err(StoreError::ReferenceViolation(format!(
                    "department {} does not exist",
                    missing
                )));
            }
        }

        Ok(state.employees.get_mut(&id).map(|employee| {
            if let Some(first_name) = &changes.first_name {
                employee.first_name = first_name.clone();
            }
            if let Some(last_name) = &changes.last_name {
                employee.last_name = last_name.clone();
            }
            if let Some(ids) = &changes.department_ids {
                employee.department_ids = ids.clone();
            }
            employee.updated_at = Utc::now();
            employee.clone()
        }))
    }

    async fn delete_employee(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.write().await.employees.remove(&id).is_some())
    }

    async fn get_employee_record(&self, id: Uuid) -> StoreResult<Option<Employee>> {
        Ok(self.state.read().await.employees.get(&id).cloned())
    }

    async fn list_employees(&self) -> StoreResult<Vec<EmployeeWithDepartments>> {
        let state = self.state.read().await;
        let mut employees: Vec<&Employee> = state.employees.values().collect();
        employees.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str()).cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        Ok(employees.into_iter().map(|e| state.resolve(e)).collect())
    }

    async fn get_employee(&self, id: Uuid) -> StoreResult<Option<EmployeeWithDepartments>> {
        let state = self.state.read().await;
        Ok(state.employees.get(&id).map(|e| state.resolve(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(first: &str, last: &str, department_ids: Vec<Uuid>) -> EmployeeDraft {
        EmployeeDraft {
            first_name: first.to_string(),
            last_name: last.to_string(),
            department_ids,
        }
    }

    #[tokio::test]
    async fn department_names_are_unique_case_sensitively() {
        let store = MemoryDirectoryStore::new();
        store.create_department("Surgery").await.unwrap();

        let err = store.create_department("Surgery").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(name) if name == "Surgery"));

        store.create_department("surgery").await.unwrap();
    }

    #[tokio::test]
    async fn renaming_to_own_name_is_not_a_duplicate() {
        let store = MemoryDirectoryStore::new();
        let dept = store.create_department("Orthodontics").await.unwrap();
        let other = store.create_department("Surgery").await.unwrap();

        assert!(store.update_department(dept.id, "Orthodontics").await.unwrap().is_some());
        let err = store.update_department(other.id, "Orthodontics").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));
        assert!(store.update_department(Uuid::new_v4(), "Nowhere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn departments_list_by_name() {
        let store = MemoryDirectoryStore::new();
        for name in ["Surgery", "General Dentistry", "Orthodontics"] {
            store.create_department(name).await.unwrap();
        }

        let names: Vec<String> = store
            .list_departments()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["General Dentistry", "Orthodontics", "Surgery"]);
    }

    #[tokio::test]
    async fn employees_list_by_last_then_first_name_with_departments_resolved() {
        let store = MemoryDirectoryStore::new();
        let surgery = store.create_department("Surgery").await.unwrap();
        let ortho = store.create_department("Orthodontics").await.unwrap();

        store.create_employee(&draft("Lisa", "Harris", vec![ortho.id, surgery.id])).await.unwrap();
        store.create_employee(&draft("Alfred", "Christensen", vec![surgery.id])).await.unwrap();
        store.create_employee(&draft("Aaron", "Harris", vec![ortho.id])).await.unwrap();

        let employees = store.list_employees().await.unwrap();
        let names: Vec<(&str, &str)> = employees
            .iter()
            .map(|e| (e.last_name.as_str(), e.first_name.as_str()))
            .collect();
        assert_eq!(names, vec![("Christensen", "Alfred"), ("Harris", "Aaron"), ("Harris", "Lisa")]);

        let lisa = &employees[2];
        assert_eq!(lisa.departments, vec![DepartmentRef::from(&ortho), DepartmentRef::from(&surgery)]);
    }

    #[tokio::test]
    async fn counts_and_blocks_referenced_departments() {
        let store = MemoryDirectoryStore::new();
        let surgery = store.create_department("Surgery").await.unwrap();
        let employee = store.create_employee(&draft("A", "B", vec![surgery.id])).await.unwrap();

        assert_eq!(store.count_employees_referencing_department(surgery.id).await.unwrap(), 1);
        assert!(matches!(
            store.delete_department(surgery.id).await,
            Err(StoreError::ReferenceViolation(_))
        ));

        assert!(store.delete_employee(employee.id).await.unwrap());
        assert_eq!(store.count_employees_referencing_department(surgery.id).await.unwrap(), 0);
        assert!(store.delete_department(surgery.id).await.unwrap());
        assert!(!store.delete_department(surgery.id).await.unwrap());
    }

    #[tokio::test]
    async fn employee_writes_reject_unknown_departments() {
        let store = MemoryDirectoryStore::new();
        let surgery = store.create_department("Surgery").await.unwrap();
        let gone = Uuid::new_v4();

        let err = store.create_employee(&draft("A", "B", vec![surgery.id, gone])).await.unwrap_err();
        assert!(matches!(err, StoreError::ReferenceViolation(m) if m.contains(&gone.to_string())));
        assert!(store.list_employees().await.unwrap().is_empty());

        let employee = store.create_employee(&draft("A", "B", vec![surgery.id])).await.unwrap();
        let changes = EmployeeChanges {
            first_name: Some("Changed".to_string()),
            department_ids: Some(vec![gone]),
            ..Default::default()
        };
        let err = store.update_employee(employee.id, &changes).await.unwrap_err();
        assert!(matches!(err, StoreError::ReferenceViolation(_)));

        let unchanged = store.get_employee_record(employee.id).await.unwrap().unwrap();
        assert_eq!(unchanged, employee);
    }

    #[tokio::test]
    async fn find_by_ids_skips_unknown() {
        let store = MemoryDirectoryStore::new();
        let surgery = store.create_department("Surgery").await.unwrap();

        let found = store
            .find_departments_by_ids(&[Uuid::new_v4(), surgery.id])
            .await
            .unwrap();
        assert_eq!(found, vec![DepartmentRef::from(&surgery)]);
    }

    #[tokio::test]
    async fn partial_employee_update_leaves_omitted_fields() {
        let store = MemoryDirectoryStore::new();
        let surgery = store.create_department("Surgery").await.unwrap();
        let created = store.create_employee(&draft("Janet", "Doe", vec![surgery.id])).await.unwrap();

        let changes = EmployeeChanges {
            last_name: Some("Roe".to_string()),
            ..Default::default()
        };
        let updated = store.update_employee(created.id, &changes).await.unwrap().unwrap();

        assert_eq!(updated.first_name, "Janet");
        assert_eq!(updated.last_name, "Roe");
        assert_eq!(updated.department_ids, vec![surgery.id]);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }
}
