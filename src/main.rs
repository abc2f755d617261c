use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use villain_forge::api::GenerationClient;
use villain_forge::db::Storage;
use villain_forge::service::TracingCodeSender;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &villain_forge::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        openai_base_url = %cfg.openai_base_url,
        text_model = %cfg.text_model,
        image_model = %cfg.image_model,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        signup_credits = cfg.signup_credits,
        uber_enabled = cfg.uber_enabled,
        loglevel = %cfg.loglevel,
    );
    if cfg.openai_api_key.is_empty() {
        warn!("VILLAIN_OPENAI_API_KEY is empty; generation requests will fail");
    }
    if cfg.admin_key.is_empty() {
        warn!("VILLAIN_ADMIN_KEY is empty; admin routes are disabled");
    }

    let storage = Storage::connect(&cfg.database_url).await?;
    let client = GenerationClient::new(cfg);
    let config = Arc::new((**cfg).clone());

    let state =
        villain_forge::ForgeState::new(storage, config, client, Arc::new(TracingCodeSender));
    let app = villain_forge::forge_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
