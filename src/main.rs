mod api;
mod config;
mod error;
mod handlers;
mod models;
mod services;

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use api::{create_router, cors::CorsPolicy};
use config::Config;
use handlers::AdvisorHandler;
use services::{GeminiClient, VisionClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting Housekeeping Advisor gateway...");

    let config = Config::from_env()?;

    let vision = Arc::new(VisionClient::new(
        config.vision_api_key.clone(),
        config.vision_api_url.clone(),
        config.upstream_timeout,
    )?);
    log::info!("✅ Vision client initialized ({})", config.vision_api_url);

    let gemini = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
        config.gemini_model.clone(),
        config.upstream_timeout,
    )?);
    log::info!("✅ Gemini client initialized with model: {}", gemini.model());

    let advisor = Arc::new(AdvisorHandler::new(vision, gemini));

    log::info!("🔐 Allowed origins: {}", config.allowed_origins.join(", "));
    let app = create_router(
        advisor,
        CorsPolicy::new(config.allowed_origins.clone()),
        config.max_body_bytes,
    );

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    log::info!(
        "🌐 Listening on {} (upstream timeout {:?})",
        addr,
        config.upstream_timeout
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("🛑 Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for Ctrl+C: {}", e);
    }
    log::info!("🛑 Shutting down...");
}
