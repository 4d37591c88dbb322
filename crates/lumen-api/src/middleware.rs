use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::token;

/// Extract and validate the bearer token, then expose its `Claims` to the
/// handler as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw = token::bearer(req.headers()).ok_or_else(|| {
        debug!("Missing bearer token on {}", req.uri().path());
        ApiError::Unauthenticated
    })?;

    let claims = token::validate(&state.jwt_secret, raw)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
