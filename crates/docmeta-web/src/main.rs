use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use docmeta_core::{Config, ExtractionPipeline};
use docmeta_openai::OpenAiGenerator;
use docmeta_pdf_mupdf::MupdfExtractor;
use docmeta_web::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,docmeta_web=debug,docmeta_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load configuration")?;
    tracing::info!(?config, "configuration loaded");

    let generator = OpenAiGenerator::from_config(&config)
        .context("metadata generator is not configured")?;
    let pipeline = ExtractionPipeline::new(
        Arc::new(MupdfExtractor::new()),
        Arc::new(generator),
        &config,
    );
    let state = Arc::new(AppState::new(pipeline, config.max_upload_bytes()));
    let app = docmeta_web::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");
    tracing::info!("API docs: http://{}/docs", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
