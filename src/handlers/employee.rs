use actix_web::{web, HttpResponse};

use crate::db::DirectoryStore;
use crate::errors::{AppError, MessageResponse};
use crate::models::employee::{EmployeeUpdate, NewEmployee};
use crate::services::DirectoryService;
use crate::utils::validation::{parse_id, validate_payload};

const INVALID_EMPLOYEE_ID: &str = "Invalid Employee ID format";

pub async fn get_employees<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
) -> Result<HttpResponse, AppError> {
    let employees = directory.list_employees().await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn create_employee<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
    new_employee: web::Json<NewEmployee>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*new_employee)?;

    let employee = directory.create_employee(&new_employee).await?;
    Ok(HttpResponse::Created().json(employee))
}

pub async fn get_employee<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
    employee_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee_id = parse_id(&employee_id, INVALID_EMPLOYEE_ID)?;

    let employee = directory.get_employee(employee_id).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn update_employee<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
    employee_id: web::Path<String>,
    updates: web::Json<EmployeeUpdate>,
) -> Result<HttpResponse, AppError> {
    let employee_id = parse_id(&employee_id, INVALID_EMPLOYEE_ID)?;
    validate_payload(&*updates)?;

    let employee = directory.update_employee(employee_id, &updates).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn delete_employee<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
    employee_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee_id = parse_id(&employee_id, INVALID_EMPLOYEE_ID)?;

    directory.delete_employee(employee_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Deleted Employee")))
}
