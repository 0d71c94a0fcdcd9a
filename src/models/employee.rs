use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::Utc;
use validator::{Validate, ValidationError};
use crate::models::department::DepartmentRef;
use crate::utils::validation::require_not_blank;

/// Employee as persisted: department references are ids in assignment order.
#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub department_ids: Vec<Uuid>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// Employee as returned by the API, departments resolved to `{id, name}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWithDepartments {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub departments: Vec<DepartmentRef>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug)]
pub(crate) struct EmployeeRow {
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// Validated input for a new employee.
#[derive(Debug, Clone)]
pub struct EmployeeDraft {
    pub first_name: String,
    pub last_name: String,
    pub department_ids: Vec<Uuid>,
}

/// Fields to overwrite on an existing employee; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department_ids: Option<Vec<Uuid>>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.department_ids.is_none()
    }
}

#[derive(Deserialize, Validate, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    #[serde(default)]
    #[validate(custom = "validate_first_name")]
    pub first_name: String,
    #[serde(default)]
    #[validate(custom = "validate_last_name")]
    pub last_name: String,
    #[serde(default)]
    pub departments: Option<Vec<String>>,
}

/// Partial update body; `null` and absent fields are both left untouched.
#[derive(Deserialize, Validate, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    #[validate(custom = "validate_first_name")]
    pub first_name: Option<String>,
    #[validate(custom = "validate_last_name")]
    pub last_name: Option<String>,
    pub departments: Option<Vec<String>>,
}

fn validate_first_name(name: &str) -> Result<(), ValidationError> {
    require_not_blank(name, "First name is required.")
}

fn validate_last_name(name: &str) -> Result<(), ValidationError> {
    require_not_blank(name, "Last name is required.")
}
