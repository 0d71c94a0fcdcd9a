//! Resets the directory database and loads a small sample clinic.

use std::collections::HashMap;
use std::env;

use dotenv::dotenv;
use log::{error, info, warn};
use uuid::Uuid;

use directory_backend::db::{self, PgDirectoryStore};
use directory_backend::models::employee::NewEmployee;
use directory_backend::{AppConfig, DirectoryService};

const DEPARTMENTS: &[&str] = &[
    "General Dentistry",
    "Pediatric Dentistry",
    "Restorative Dentistry",
    "Surgery",
    "Orthodontics",
];

const EMPLOYEES: &[(&str, &str, &[&str])] = &[
    ("Lisa", "Harris", &["Restorative Dentistry", "Orthodontics"]),
    ("Alfred", "Christensen", &["General Dentistry"]),
    ("John", "Dudley", &["General Dentistry"]),
    ("Danny", "Perez", &["Restorative Dentistry"]),
    ("Sarah", "Alvarez", &["Pediatric Dentistry"]),
    ("Constance", "Smith", &["Surgery"]),
    ("Travis", "Combs", &["General Dentistry"]),
    ("Francisco", "Willard", &["Pediatric Dentistry"]),
    ("Janet", "Doe", &["General Dentistry"]),
    ("Leslie", "Roche", &["Orthodontics"]),
];

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_lookup(|name| match name {
        "DATABASE_URL" => env::var("SEED_DATABASE_URL").or_else(|_| env::var("DATABASE_URL")).ok(),
        other => env::var(other).ok(),
    }) {
        Ok(config) => config,
        Err(err) => {
            error!("FATAL: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = seed(&config).await {
        error!("Seeding failed: {}", err);
        std::process::exit(1);
    }
    info!("Database seeded successfully");
}

async fn seed(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::create_pool(config).await?;
    let directory = DirectoryService::new(PgDirectoryStore::new(pool.clone()), config.store_timeout);

    info!("Clearing existing employees and departments");
    directory.store().clear().await?;

    let mut department_ids: HashMap<&str, Uuid> = HashMap::new();
    for name in DEPARTMENTS {
        let department = directory.create_department(name).await?;
        department_ids.insert(*name, department.id);
    }
    info!("{} departments inserted", department_ids.len());

    let mut inserted = 0;
    for (first_name, last_name, department_names) in EMPLOYEES {
        let (found, missing): (Vec<&str>, Vec<&str>) = department_names
            .iter()
            .copied()
            .partition(|name| department_ids.contains_key(name));

        if !missing.is_empty() {
            warn!(
                "No department ids for {} {}: {}",
                first_name,
                last_name,
                missing.join(", ")
            );
        }
        if found.is_empty() {
            warn!("Skipping {} {}: no valid departments", first_name, last_name);
            continue;
        }

        let new_employee = NewEmployee {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            departments: Some(found.iter().map(|name| department_ids[name].to_string()).collect()),
        };
        directory.create_employee(&new_employee).await?;
        inserted += 1;
    }
    info!("{} employees inserted", inserted);

    pool.close().await;
    Ok(())
}
