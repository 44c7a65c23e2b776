use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use mercora_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::ActorContext;

/// Shared state for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Verifies the bearer token and stashes an [`ActorContext`] in request
/// extensions. Everything behind this middleware can assume a caller.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token.to_string(),
        Err(message) => return json_error(StatusCode::UNAUTHORIZED, "unauthorized", message),
    };

    let claims = match state.jwt.validate(&token, Utc::now()) {
        Ok(claims) => claims,
        Err(error) => {
            tracing::debug!(%error, "bearer token rejected");
            return json_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "invalid or expired token",
            );
        }
    };

    req.extensions_mut().insert(ActorContext::from_claims(claims));
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("missing authorization header")?;
    let value = value
        .to_str()
        .map_err(|_| "malformed authorization header")?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or("expected a bearer token")?
        .trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }
    Ok(token)
}
