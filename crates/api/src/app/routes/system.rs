use axum::{
    Json, Router,
    extract::Extension,
    response::IntoResponse,
    routing::get,
};

use crate::context::ActorContext;

pub fn protected_router() -> Router {
    Router::new().route("/whoami", get(whoami))
}

pub async fn health() -> axum::response::Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

pub async fn whoami(Extension(actor): Extension<ActorContext>) -> axum::response::Response {
    Json(serde_json::json!({
        "account_id": actor.account_id().to_string(),
        "email": actor.email(),
        "roles": actor.roles().iter().map(|role| role.as_str()).collect::<Vec<_>>(),
    }))
    .into_response()
}
