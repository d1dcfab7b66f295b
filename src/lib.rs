//! Forex portal service
//!
//! Simulated market quotes, a news and broker catalogue with an admin
//! content flow, and model-generated market analysis, served as JSON.

pub mod admin;
pub mod analysis;
pub mod config;
pub mod handlers;
pub mod market;
pub mod middleware;
pub mod newsletter;
pub mod portal;
pub mod scheduler;
pub mod seed;
pub mod store;
pub mod types;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use analysis::{GeminiClient, MarketAnalyst};
pub use portal::Portal;
pub use types::*;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<RwLock<Portal>>,
    pub analyst: Arc<dyn MarketAnalyst>,
}

impl AppState {
    pub fn new(portal: Portal, analyst: Arc<dyn MarketAnalyst>) -> Self {
        Self {
            portal: Arc::new(RwLock::new(portal)),
            analyst,
        }
    }
}

/// Build the API router
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin_routes = Router::new()
        .route("/admin", get(handlers::get_admin))
        .route("/admin/tab", post(handlers::set_admin_tab))
        .route("/admin/flow", get(handlers::get_flow))
        .route("/admin/flow/open", post(handlers::open_flow))
        .route("/admin/flow/type", post(handlers::choose_flow_type))
        .route("/admin/flow/back", post(handlers::back_flow))
        .route("/admin/flow/submit", post(handlers::submit_flow))
        .route("/admin/flow/close", post(handlers::close_flow))
        .route("/admin/news/:id", delete(handlers::delete_news))
        .route("/admin/brokers/:id", delete(handlers::delete_broker))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::admin_middleware,
        ))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/view", get(handlers::get_view))
        .route("/navigate", post(handlers::navigate))
        .route("/search", post(handlers::search))
        .route("/articles/:id/select", post(handlers::select_article))
        .route("/featured/select", post(handlers::select_featured))
        .route("/login/open", post(handlers::open_login))
        .route("/login/close", post(handlers::close_login))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/news", get(handlers::list_news))
        .route("/brokers", get(handlers::list_brokers))
        .route("/ticker", get(handlers::get_ticker))
        .route("/rates", get(handlers::list_rates))
        .route("/signal", get(handlers::get_signal))
        .route("/analysis", get(handlers::get_outlook))
        .route("/analysis/refresh", post(handlers::refresh_outlook))
        .route(
            "/rates/analysis",
            get(handlers::get_pair_analysis)
                .post(handlers::analyze_pair)
                .delete(handlers::dismiss_pair_analysis),
        )
        .route("/newsletter", get(handlers::get_newsletter))
        .route("/newsletter/subscribe", post(handlers::subscribe))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
