pub mod department;
pub mod employee;

use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};

use crate::db::DirectoryStore;
use crate::errors::{AppError, MessageResponse};

/// Registers the `/api` routes for a directory backed by `S`.
pub fn configure<S: DirectoryStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/departments")
                        .route(web::get().to(department::get_departments::<S>))
                        .route(web::post().to(department::create_department::<S>)),
                )
                .service(
                    web::resource("/departments/{id}")
                        .route(web::get().to(department::get_department::<S>))
                        .route(web::put().to(department::update_department::<S>))
                        .route(web::delete().to(department::delete_department::<S>)),
                )
                .service(
                    web::resource("/employees")
                        .route(web::get().to(employee::get_employees::<S>))
                        .route(web::post().to(employee::create_employee::<S>)),
                )
                .service(
                    web::resource("/employees/{id}")
                        .route(web::get().to(employee::get_employee::<S>))
                        .route(web::put().to(employee::update_employee::<S>))
                        .route(web::delete().to(employee::delete_employee::<S>)),
                ),
        );
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid request body: {}", err)).into()
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(MessageResponse::new("Route not found"))
}
