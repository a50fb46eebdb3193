use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info, warn};
use sltb_database::{config::DatabaseConfig, Store};
use sltb_lib::config::{AdminSeed, AuthConfig};
use sltb_lib::core::auth::{ensure_admin, jwt::JwtManager};

pub(crate) mod middleware;
pub(crate) mod router;

use std::env;
use std::sync::Arc;

async fn bootstrap() -> anyhow::Result<(Store, JwtManager)> {
    let auth_config = AuthConfig::from_env()?;
    let store = Store::connect(&DatabaseConfig::from_env()?).await?;
    store.sync_schema().await?;
    if let Some(seed) = AdminSeed::from_env() {
        ensure_admin(&store, &seed).await?;
    }
    Ok((store, JwtManager::new(&auth_config)))
}

/// Close the pool once the server has dropped its handles. Returns whether it was closed.
async fn close_store(store: web::Data<Store>) -> bool {
    match Arc::try_unwrap(store.into_inner()) {
        Ok(store) => {
            if let Err(e) = store.close().await {
                error!("Failed to close database pool: {}", e);
            }
            true
        }
        Err(_) => {
            warn!("Database pool still in use at shutdown, leaving it to drop");
            false
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    sltb_lib::config::init();
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    info!("Logger initialized at log level: {}", log_level);

    let (store, jwt) = match bootstrap().await {
        Ok(setup) => setup,
        Err(e) => {
            error!("Failed to start: {:#}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8070);
    info!("Listening on {}:{}", host, port);

    let store_data = web::Data::new(store);
    let jwt_data = web::Data::new(jwt);
    let server_store = store_data.clone();
    let result = HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();
        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(server_store.clone())
            .app_data(jwt_data.clone())
            .app_data(router::json_config())
            .app_data(router::path_config())
            .configure(router::configure)
            .default_service(web::to(router::not_found))
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    close_store(store_data).await;
    result
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, DatabaseBackend, MockDatabase};

    use super::*;

    fn store_data() -> web::Data<Store> {
        web::Data::new(Store::from_connection(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        ))
    }

    #[actix_rt::test]
    async fn store_is_closed_through_the_last_handle() {
        let store = store_data();
        let worker_handle = store.clone();
        drop(worker_handle);
        assert!(close_store(store).await);
    }

    #[actix_rt::test]
    async fn store_in_use_is_left_open() {
        let store = store_data();
        let worker_handle = store.clone();
        assert!(!close_store(store).await);
        assert_eq!(worker_handle.conn().get_database_backend(), DatabaseBackend::Postgres);
    }
}
