use actix_web::{web, HttpResponse};

use crate::db::DirectoryStore;
use crate::errors::{AppError, MessageResponse};
use crate::models::department::{DepartmentUpdate, NewDepartment};
use crate::services::DirectoryService;
use crate::utils::validation::{parse_id, validate_payload};

const INVALID_DEPARTMENT_ID: &str = "Invalid Department ID format";

pub async fn get_departments<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
) -> Result<HttpResponse, AppError> {
    let departments = directory.list_departments().await?;
    Ok(HttpResponse::Ok().json(departments))
}

pub async fn create_department<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
    new_department: web::Json<NewDepartment>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*new_department)?;

    let department = directory.create_department(&new_department.name).await?;
    Ok(HttpResponse::Created().json(department))
}

pub async fn get_department<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
    department_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let department_id = parse_id(&department_id, INVALID_DEPARTMENT_ID)?;

    let department = directory.get_department(department_id).await?;
    Ok(HttpResponse::Ok().json(department))
}

pub async fn update_department<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
    department_id: web::Path<String>,
    updates: web::Json<DepartmentUpdate>,
) -> Result<HttpResponse, AppError> {
    let department_id = parse_id(&department_id, INVALID_DEPARTMENT_ID)?;
    validate_payload(&*updates)?;

    let department = directory
        .update_department(department_id, updates.name.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(department))
}

pub async fn delete_department<S: DirectoryStore + 'static>(
    directory: web::Data<DirectoryService<S>>,
    department_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let department_id = parse_id(&department_id, INVALID_DEPARTMENT_ID)?;

    directory.delete_department(department_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Deleted Department")))
}
