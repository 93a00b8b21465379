use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod config;
mod context;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod service;

use config::Config;
use db::init_db;
use service::escalation::{self, EscalationConfig};

use crate::docs::ApiDoc;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Hello World!"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.db_acquire_timeout_secs).await;

    let escalation_cfg = EscalationConfig {
        sla_hours: config.escalation_sla_hours,
        max_attempts: config.escalation_max_attempts,
    };

    // Periodic escalation cadence. The sweep itself is idempotent and owns
    // no timer; this loop (or an external scheduler hitting the jobs
    // endpoint) decides when it runs.
    let sweep_pool = pool.clone();
    let sweep_cfg = escalation_cfg.clone();
    let sweep_interval = config.escalation_sweep_interval_secs;
    actix_web::rt::spawn(async move {
        loop {
            actix_web::rt::time::sleep(Duration::from_secs(sweep_interval)).await;
            if let Err(e) = escalation::run_sweep(&sweep_pool, &sweep_cfg).await {
                error!(error = %e, "Scheduled escalation sweep failed");
            }
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(escalation_cfg.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
