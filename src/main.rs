use std::sync::Arc;
use tracing::{info, warn, Level};

use forex_portal::config::Config;
use forex_portal::scheduler::{self, Cadence, MarketSimulator};
use forex_portal::{portal, AppState, GeminiClient, MarketAnalyst, Portal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting Forex Portal...");

    let config = Config::load()?;

    let api_key = config.analysis_api_key();
    if api_key.is_none() {
        warn!("⚠ No GEMINI_API_KEY or API_KEY set, analysis requests will fail");
    }
    let gemini = GeminiClient::new(
        api_key,
        &config.gemini_model,
        &config.gemini_base_url,
        config.analysis_timeout(),
    )?;
    info!("✓ Analysis client initialized ({})", gemini.model());
    let analyst: Arc<dyn MarketAnalyst> = Arc::new(gemini);

    let state = Arc::new(AppState::new(Portal::seeded(), analyst));

    let scheduler = scheduler::spawn(
        state.portal.clone(),
        MarketSimulator::from_entropy(Cadence::default()),
    );
    info!("✓ Market updates running");

    // The outlook panel loads once at startup
    {
        let state = state.clone();
        tokio::spawn(async move {
            portal::refresh_outlook(&state.portal, state.analyst.as_ref()).await;
        });
    }

    let app = forex_portal::app(state);

    let port = config.port;
    let addr = format!("0.0.0.0:{}", port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    scheduler.shutdown().await;
    info!("Forex Portal stopped");

    Ok(())
}
