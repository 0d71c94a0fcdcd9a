use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use directory_backend::db::{self, PgDirectoryStore};
use directory_backend::{handlers, AppConfig, DirectoryService};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("FATAL: {}", err);
            std::process::exit(1);
        }
    };

    let pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(err) => {
            error!("FATAL: database unavailable: {}", err);
            std::process::exit(1);
        }
    };

    let directory = web::Data::new(DirectoryService::new(
        PgDirectoryStore::new(pool),
        config.store_timeout,
    ));

    let (host, port) = config.bind_address();
    info!("Starting server at {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(directory.clone())
            .configure(handlers::configure::<PgDirectoryStore>)
            .default_service(web::to(handlers::not_found))
    })
    .bind((host, port))?
    .run()
    .await
}
