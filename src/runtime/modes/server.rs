//! Server mode
//!
//! Wires the startup context into an actix-web `HttpServer`, runs it until a
//! shutdown signal arrives, then drains the background task pool.

use std::time::Duration;

use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::configure;
use crate::api::middleware::RequestIdMiddleware;
use crate::config::AppConfig;
use crate::runtime::lifetime::{shutdown, startup};

pub async fn run_server(config: AppConfig) -> Result<()> {
    let startup = startup::prepare_server_startup(&config).await?;

    let shortener = web::Data::from(startup.shortener.clone());
    let health = web::Data::from(startup.health.clone());
    let settings = web::Data::new(startup.settings.clone());

    let workers = config.server.workers.clamp(1, 32);
    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware) // 最外层，生成 request_id 并记录访问日志
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(shortener.clone())
            .app_data(health.clone())
            .app_data(settings.clone())
            .configure(configure)
    })
    .workers(workers)
    .shutdown_timeout(config.server.shutdown_timeout_secs)
    .disable_signals()
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    info!(
        "Starting server at http://{} with {} workers",
        bind_address, workers
    );

    let handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);

    tokio::select! {
        res = &mut server_task => {
            res.context("HTTP server task panicked")?
                .context("HTTP server exited with an error")?;
        }
        _ = shutdown::listen_for_shutdown() => {
            info!("Stopping HTTP server...");
            handle.stop(true).await;
            if let Err(e) = server_task.await {
                warn!("HTTP server task ended abnormally: {}", e);
            }
        }
    }

    shutdown::drain_background(&startup.background, grace).await;
    info!("Server shut down");
    Ok(())
}
