//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::web::auth::session_cookie;
use crate::web::rest::fail;
use crate::web::state::AppState;

/// Middleware that validates the auth session cookie.
///
/// If valid, inserts the `Session` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_session_id) = session_cookie(req.headers()).map(str::to_string) else {
        return fail(StatusCode::UNAUTHORIZED, "Not signed in").into_response();
    };

    match state.db.validate_auth_session(&auth_session_id).await {
        Ok(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(e) => {
            warn!("Rejected auth session: {:?}", e);
            fail(StatusCode::UNAUTHORIZED, "Not signed in").into_response()
        }
    }
}
