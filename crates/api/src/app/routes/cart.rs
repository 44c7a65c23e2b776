use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use mercora_auth::Permission;
use mercora_cart::CartLineId;
use mercora_core::AggregateId;
use mercora_products::ProductId;

use crate::app::services::AppState;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/cart", get(view_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:id", put(update_item).delete(remove_item))
}

pub async fn view_cart(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("cart.manage")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.view_cart(&actor, Utc::now()).await {
        Ok(cart) => Json(dto::cart_to_json(&cart)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::AddCartItemRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("cart.manage")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let product_id: AggregateId = match body.product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services
        .add_cart_item(&actor, ProductId::new(product_id), body.quantity, Utc::now())
        .await
    {
        Ok(cart) => Json(dto::cart_to_json(&cart)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCartItemRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("cart.manage")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let line_id: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid cart line id",
            );
        }
    };

    match services
        .update_cart_item(&actor, CartLineId::new(line_id), body.quantity, Utc::now())
        .await
    {
        Ok(cart) => Json(dto::cart_to_json(&cart)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("cart.manage")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let line_id: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid cart line id",
            );
        }
    };

    match services
        .remove_cart_item(&actor, CartLineId::new(line_id), Utc::now())
        .await
    {
        Ok(cart) => Json(dto::cart_to_json(&cart)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}
