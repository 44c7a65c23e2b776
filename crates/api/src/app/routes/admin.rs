use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use chrono::Utc;
use serde::Deserialize;

use mercora_accounts::{ApplicationId, ApprovalStatus};
use mercora_auth::Permission;
use mercora_core::AggregateId;
use mercora_orders::{OrderId, OrderStatus};

use crate::app::services::AppState;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/wholesale/applications", get(list_applications))
        .route("/admin/wholesale/:id/approve", put(approve_application))
        .route("/admin/wholesale/:id/reject", put(reject_application))
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/:id/status", put(update_order_status))
        .route("/admin/accounts", get(list_accounts))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

pub async fn stats(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("stats.read")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.dashboard_stats().await {
        Ok(stats) => Json(dto::stats_to_json(&stats)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn list_applications(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Query(query): Query<StatusQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("wholesale.review")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let status: Option<ApprovalStatus> = match query.status.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(v) => Some(v),
            Err(error) => return errors::domain_error_to_response(error),
        },
        None => None,
    };

    match services.list_applications(status).await {
        Ok(applications) => Json(serde_json::json!({
            "items": applications.iter().map(dto::application_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn approve_application(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("wholesale.review")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid application id",
            );
        }
    };

    match services
        .approve_application(ApplicationId::new(id), Utc::now())
        .await
    {
        Ok(application) => Json(dto::application_to_json(&application)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn reject_application(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("wholesale.review")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid application id",
            );
        }
    };

    match services
        .reject_application(ApplicationId::new(id), Utc::now())
        .await
    {
        Ok(application) => Json(dto::application_to_json(&application)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Query(query): Query<StatusQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("orders.manage")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let status: Option<OrderStatus> = match query.status.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(v) => Some(v),
            Err(error) => return errors::domain_error_to_response(error),
        },
        None => None,
    };

    match services.list_orders(status).await {
        Ok(orders) => Json(serde_json::json!({
            "items": orders.iter().map(dto::order_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("orders.manage")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
        }
    };

    let status: OrderStatus = match body.status.parse() {
        Ok(v) => v,
        Err(error) => return errors::domain_error_to_response(error),
    };

    match services
        .update_order_status(OrderId::new(id), status, Utc::now())
        .await
    {
        Ok(order) => Json(dto::order_to_json(&order)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn list_accounts(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("accounts.read")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.list_accounts().await {
        Ok(accounts) => Json(serde_json::json!({
            "items": accounts.iter().map(dto::account_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}
