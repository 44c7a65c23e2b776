use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use mercora_auth::Permission;
use mercora_core::AggregateId;
use mercora_products::{CreateProduct, ProductFilter, ProductId, UpdateProduct};

use crate::app::services::AppState;
use crate::app::{dto, errors};
use crate::context::ActorContext;

/// Catalog reads are open to anonymous buyers.
pub fn public_router() -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

pub fn admin_router() -> Router {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppState>>,
    Query(filter): Query<ProductFilter>,
) -> axum::response::Response {
    match services.list_products(&filter).await {
        Ok(products) => Json(serde_json::json!({
            "items": products.iter().map(dto::product_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.get_product(ProductId::new(id)).await {
        Ok(product) => Json(dto::product_to_json(&product)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("products.manage")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let cmd = CreateProduct {
        sku: body.sku,
        name: body.name,
        description: body.description,
        category: body.category,
        retail_price: body.retail_price,
        wholesale_price: body.wholesale_price,
        moq: body.moq,
        stock_quantity: body.stock_quantity,
        images: body.images.into_iter().map(Into::into).collect(),
        occurred_at: Utc::now(),
    };

    match services.create_product(cmd).await {
        Ok(product) => {
            (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response()
        }
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProductRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("products.manage")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    let cmd = UpdateProduct {
        sku: body.sku,
        name: body.name,
        description: body.description,
        category: body.category,
        retail_price: body.retail_price,
        wholesale_price: body.wholesale_price,
        moq: body.moq,
        stock_quantity: body.stock_quantity,
        images: body
            .images
            .map(|images| images.into_iter().map(Into::into).collect()),
        occurred_at: Utc::now(),
    };

    match services.update_product(ProductId::new(id), cmd).await {
        Ok(product) => Json(dto::product_to_json(&product)).into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&actor, &Permission::new("products.manage")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.delete_product(ProductId::new(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => errors::domain_error_to_response(error),
    }
}
