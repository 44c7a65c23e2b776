use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use mercora_auth::Permission;

use crate::app::services::AppState;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/wholesale/apply", post(apply))
        .route("/wholesale/status", get(status))
}

pub async fn apply(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::WholesaleApplyRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("wholesale.apply")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services
        .submit_application(&actor, body.into(), Utc::now())
        .await
    {
        Ok(application) => (
            StatusCode::CREATED,
            Json(dto::application_to_json(&application)),
        )
            .into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn status(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("wholesale.apply")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.application_status(&actor, Utc::now()).await {
        Ok(application) => Json(dto::application_to_json(&application)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}
