//! Postgres store tests. They run against `DATABASE_URL` and are skipped
//! when it is not set. Names carry a random suffix so runs can share a database.

use directory_backend::db::{self, DirectoryStore, PgDirectoryStore, StoreError};
use directory_backend::models::employee::{EmployeeChanges, EmployeeDraft};
use directory_backend::AppConfig;
use uuid::Uuid;

async fn store() -> Option<PgDirectoryStore> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(_) => {
            eprintln!("DATABASE_URL not set; skipping Postgres store test");
            return None;
        }
    };
    let pool = db::create_pool(&config).await.unwrap();
    Some(PgDirectoryStore::new(pool))
}

fn unique(name: &str) -> String {
    format!("{} {}", name, Uuid::new_v4())
}

fn draft(first: &str, last: &str, department_ids: Vec<Uuid>) -> EmployeeDraft {
    EmployeeDraft {
        first_name: first.to_string(),
        last_name: last.to_string(),
        department_ids,
    }
}

#[tokio::test]
async fn duplicate_department_name_maps_to_duplicate_name() {
    let Some(store) = store().await else { return };
    let name = unique("Surgery");
    let surgery = store.create_department(&name).await.unwrap();

    let err = store.create_department(&name).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(n) if n == name));

    let other = store.create_department(&unique("Orthodontics")).await.unwrap();
    let err = store.update_department(other.id, &name).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(_)));

    assert!(store.delete_department(surgery.id).await.unwrap());
    assert!(store.delete_department(other.id).await.unwrap());
}

#[tokio::test]
async fn foreign_key_violations_map_to_reference_violation() {
    let Some(store) = store().await else { return };
    let surgery = store.create_department(&unique("Surgery")).await.unwrap();
    let employee = store.create_employee(&draft("A", "B", vec![surgery.id])).await.unwrap();

    let err = store.delete_department(surgery.id).await.unwrap_err();
    assert!(matches!(err, StoreError::ReferenceViolation(_)));

    let err = store
        .create_employee(&draft("C", "D", vec![Uuid::new_v4()]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReferenceViolation(_)));

    let changes = EmployeeChanges {
        department_ids: Some(vec![Uuid::new_v4()]),
        ..Default::default()
    };
    let err = store.update_employee(employee.id, &changes).await.unwrap_err();
    assert!(matches!(err, StoreError::ReferenceViolation(_)));
    let unchanged = store.get_employee_record(employee.id).await.unwrap().unwrap();
    assert_eq!(unchanged.department_ids, vec![surgery.id]);

    assert!(store.delete_employee(employee.id).await.unwrap());
    assert!(store.delete_department(surgery.id).await.unwrap());
}

#[tokio::test]
async fn populate_keeps_assignment_order() {
    let Some(store) = store().await else { return };
    let a = store.create_department(&unique("A")).await.unwrap();
    let b = store.create_department(&unique("B")).await.unwrap();
    let c = store.create_department(&unique("C")).await.unwrap();

    let employee = store.create_employee(&draft("Lisa", "Harris", vec![b.id, a.id])).await.unwrap();

    let fetched = store.get_employee(employee.id).await.unwrap().unwrap();
    let ids: Vec<Uuid> = fetched.departments.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);
    assert_eq!(fetched.departments[0].name, b.name);

    let changes = EmployeeChanges {
        last_name: Some("Roe".to_string()),
        department_ids: Some(vec![c.id, b.id]),
        ..Default::default()
    };
    let updated = store.update_employee(employee.id, &changes).await.unwrap().unwrap();
    assert_eq!(updated.first_name, "Lisa");
    assert_eq!(updated.last_name, "Roe");
    assert_eq!(updated.department_ids, vec![c.id, b.id]);
    assert_eq!(store.count_employees_referencing_department(a.id).await.unwrap(), 0);
    assert_eq!(store.count_employees_referencing_department(c.id).await.unwrap(), 1);

    store.delete_employee(employee.id).await.unwrap();
    for department in [a, b, c] {
        store.delete_department(department.id).await.unwrap();
    }
}

#[tokio::test]
async fn employees_list_by_last_then_first_name() {
    let Some(store) = store().await else { return };
    let dept = store.create_department(&unique("General Dentistry")).await.unwrap();
    let family = unique("Harris");

    let lisa = store.create_employee(&draft("Lisa", &family, vec![dept.id])).await.unwrap();
    let aaron = store.create_employee(&draft("Aaron", &family, vec![dept.id])).await.unwrap();

    let listed: Vec<Uuid> = store
        .list_employees()
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.last_name == family)
        .map(|e| e.id)
        .collect();
    assert_eq!(listed, vec![aaron.id, lisa.id]);

    let found = store.find_departments_by_ids(&[dept.id, Uuid::new_v4()]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, dept.id);

    store.delete_employee(lisa.id).await.unwrap();
    store.delete_employee(aaron.id).await.unwrap();
    store.delete_department(dept.id).await.unwrap();
}
