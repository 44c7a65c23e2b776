use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use mercora_auth::Permission;
use mercora_core::AggregateId;
use mercora_orders::OrderId;
use mercora_pricing::ShippingMethod;

use crate::app::services::AppState;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(checkout))
        .route("/orders/:id", get(get_order))
}

/// Turn the caller's cart into an order.
pub async fn checkout(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("orders.place")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let method: ShippingMethod = match body.shipping_method.parse() {
        Ok(v) => v,
        Err(error) => return errors::domain_error_to_response(error),
    };

    match services
        .checkout(&actor, method, body.shipping_address.into(), Utc::now())
        .await
    {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("orders.read")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.list_my_orders(&actor, Utc::now()).await {
        Ok(orders) => Json(serde_json::json!({
            "items": orders.iter().map(dto::order_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("orders.read")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
        }
    };

    match services.get_order_for(&actor, OrderId::new(id)).await {
        Ok(order) => Json(dto::order_to_json(&order)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}
