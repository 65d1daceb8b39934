mod config;
mod detector;
mod dispatch;
mod routes;
mod session;
mod upload;

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use actix_web::{middleware, web, App, HttpServer};
use config::AppConfig;
use detector::DetectorClient;
use dispatch::Dispatcher;
use routes::configure_routes;
use session::SessionStore;
use shared::DetectorKind;
use std::sync::Arc;

fn startup_error(e: impl std::fmt::Display) -> std::io::Error {
    log::error!("Startup failed: {}", e);
    std::io::Error::other(e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::load().map_err(startup_error)?;

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("forensics-backend/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(startup_error)?;

    let tampered_endpoint = config.endpoint(DetectorKind::Tampered).map_err(startup_error)?;
    let generated_endpoint = config.endpoint(DetectorKind::Generated).map_err(startup_error)?;
    log::info!("Tampered detector: {}", tampered_endpoint.url);
    log::info!("Generated detector: {}", generated_endpoint.url);
    log::info!("Detector timeout: {:?}", config.timeout());

    let dispatcher = Dispatcher::new(
        Arc::new(DetectorClient::new(
            http_client.clone(),
            tampered_endpoint,
            config.timeout(),
        )),
        Arc::new(DetectorClient::new(
            http_client,
            generated_endpoint,
            config.timeout(),
        )),
    );
    let sessions = SessionStore::new(config.session_ttl());
    log::info!("Session idle timeout: {:?}", config.session_ttl());
    {
        let sessions = sessions.clone();
        let period = config.session_ttl();
        actix_web::rt::spawn(async move {
            let mut ticks = actix_web::rt::time::interval(period);
            loop {
                ticks.tick().await;
                sessions.evict_idle().await;
            }
        });
    }

    let frontend_dir = config.frontend_dir.clone();
    log::info!("Serving frontend from {}", frontend_dir);

    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        header::ACCEPT,
                        header::CONTENT_TYPE,
                        HeaderName::from_static("x-session-id"),
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
