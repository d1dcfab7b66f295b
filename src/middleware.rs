//! Admin session middleware
//!
//! Guards the admin routes. The session lives in the portal store, so the
//! check is simply whether the current session carries the admin role.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::AppState;

/// Reject with 403 unless an admin session is active
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let is_admin = state.portal.read().await.store.is_admin();
    if !is_admin {
        tracing::warn!(
            "Admin endpoint {} requested without an admin session",
            request.uri().path()
        );
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}
