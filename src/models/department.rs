use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::{Validate, ValidationError};
use crate::utils::validation::require_not_blank;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[sqlx(rename = "department_id")]
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `{id, name}` pair an employee's department ids resolve to.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DepartmentRef {
    #[sqlx(rename = "department_id")]
    pub id: Uuid,
    pub name: String,
}

impl From<&Department> for DepartmentRef {
    fn from(department: &Department) -> Self {
        Self {
            id: department.id,
            name: department.name.clone(),
        }
    }
}

#[derive(Deserialize, Validate, Debug, Default)]
pub struct NewDepartment {
    #[serde(default)]
    #[validate(custom = "validate_department_name")]
    pub name: String,
}

#[derive(Deserialize, Validate, Debug, Default)]
pub struct DepartmentUpdate {
    #[validate(custom = "validate_department_name")]
    pub name: Option<String>,
}

fn validate_department_name(name: &str) -> Result<(), ValidationError> {
    require_not_blank(name, "Department name is required.")
}
