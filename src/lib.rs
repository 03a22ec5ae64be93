pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::OrderService;
use config::AppConfig;
use domain::errors::DomainError;
use infrastructure::blocking_store::BlockingOrderStore;
use infrastructure::cart_client::HttpCartClient;
use infrastructure::order_repo::DieselOrderRepository;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for migration in applied {
        log::info!("Applied migration {}", migration);
    }
    Ok(())
}

/// Wires the PostgreSQL-backed store and the HTTP cart client into an
/// [`OrderService`] configured from `config`.
pub fn build_order_service(
    pool: DbPool,
    config: &AppConfig,
) -> Result<Arc<OrderService>, DomainError> {
    let store = BlockingOrderStore::new(DieselOrderRepository::new(pool), config.store_limits);
    let carts = HttpCartClient::new(&config.shopping_service_url, config.cart_timeout)?;

    Ok(Arc::new(
        OrderService::new(Arc::new(store), Arc::new(carts))
            .with_import_policy(config.import_failure_policy)
            .with_purge_grace(config.purge_grace),
    ))
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    service: Arc<OrderService>,
    host: &str,
    port: u16,
    max_upload_bytes: usize,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::from(service);
    let openapi = handlers::ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(handlers::orders::UploadLimit(max_upload_bytes))
            .wrap(Logger::default())
            .configure(handlers::configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
