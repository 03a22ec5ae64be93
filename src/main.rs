use std::io;

use cart_order_service::application::cleanup::CleanupScheduler;
use cart_order_service::config::AppConfig;
use cart_order_service::{build_order_service, build_server, create_pool, run_migrations};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let pool = create_pool(&config.database_url, config.db_pool_size).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    let service = build_order_service(pool, &config).map_err(io::Error::other)?;

    let cleanup = CleanupScheduler::new(
        service.clone(),
        config.cleanup_interval,
        config.retention,
    )
    .start();

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let served = build_server(service, &config.host, config.port, config.max_upload_bytes)?.await;

    cleanup.stop().await;
    served
}
