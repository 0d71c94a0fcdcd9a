//! Department and employee directory backend.
//!
//! Departments and employees are related many-to-many. An employee always
//! belongs to at least one existing department, and a department cannot be
//! deleted while employees are assigned to it. The HTTP layer lives in
//! [`handlers`]; the integrity rules live in [`services`].

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::{DirectoryStore, MemoryDirectoryStore, PgDirectoryStore, StoreError};
pub use errors::AppError;
pub use services::{ConsistencyService, DirectoryService};
