//! Wire types and JSON mappers.
//!
//! Requests deserialize into typed payloads here; responses are assembled
//! with `json!` so the wire shape is visible in one place. Money goes out
//! through `Display`, which rounds to 2 decimal places; captured order
//! prices keep their full precision in storage.

use serde::Deserialize;
use serde_json::{Value, json};

use mercora_accounts::{Account, BusinessDetails, WholesaleApplication};
use mercora_core::Money;
use mercora_orders::{Order, OrderLine, ShippingAddress};
use mercora_products::{Product, ProductImage};

use crate::app::services::{DashboardStats, PricedCart, PricedCartLine};

// ---- requests ----

#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    pub url: String,
    #[serde(default)]
    pub storage_id: Option<String>,
}

impl From<ImagePayload> for ProductImage {
    fn from(payload: ImagePayload) -> Self {
        ProductImage {
            url: payload.url,
            storage_id: payload.storage_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddressPayload {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl From<AddressPayload> for ShippingAddress {
    fn from(payload: AddressPayload) -> Self {
        ShippingAddress {
            street: payload.street,
            city: payload.city,
            state: payload.state,
            zip: payload.zip,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub retail_price: Money,
    pub wholesale_price: Money,
    pub moq: i64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub images: Vec<ImagePayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub retail_price: Option<Money>,
    pub wholesale_price: Option<Money>,
    pub moq: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub images: Option<Vec<ImagePayload>>,
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_method: String,
    pub shipping_address: AddressPayload,
}

#[derive(Debug, Deserialize)]
pub struct WholesaleApplyRequest {
    pub business_name: String,
    pub tax_id: String,
    pub business_type: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
}

impl From<WholesaleApplyRequest> for BusinessDetails {
    fn from(payload: WholesaleApplyRequest) -> Self {
        BusinessDetails {
            business_name: payload.business_name,
            tax_id: payload.tax_id,
            business_type: payload.business_type,
            street: payload.street,
            city: payload.city,
            state: payload.state,
            zip: payload.zip,
            phone: payload.phone,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

// ---- responses ----

pub fn product_to_json(product: &Product) -> Value {
    json!({
        "id": product.id().to_string(),
        "sku": product.sku(),
        "name": product.name(),
        "description": product.description(),
        "category": product.category(),
        "retail_price": product.retail_price().to_string(),
        "wholesale_price": product.wholesale_price().to_string(),
        "moq": product.moq(),
        "stock_quantity": product.stock_quantity(),
        "images": product.images().iter().map(image_to_json).collect::<Vec<_>>(),
        "created_at": product.created_at(),
        "updated_at": product.updated_at(),
    })
}

fn image_to_json(image: &ProductImage) -> Value {
    json!({
        "url": image.url,
        "storage_id": image.storage_id,
    })
}

pub fn cart_to_json(cart: &PricedCart) -> Value {
    json!({
        "lines": cart.lines.iter().map(cart_line_to_json).collect::<Vec<_>>(),
        "total_units": cart.total_units,
        "total": cart.total.to_string(),
    })
}

fn cart_line_to_json(line: &PricedCartLine) -> Value {
    json!({
        "id": line.line_id.to_string(),
        "product_id": line.product_id.to_string(),
        "sku": line.sku,
        "name": line.name,
        "moq": line.moq,
        "quantity": line.quantity,
        "unit_price": line.unit_price.to_string(),
        "line_total": line.line_total.to_string(),
    })
}

pub fn order_to_json(order: &Order) -> Value {
    json!({
        "id": order.id().to_string(),
        "account_id": order.account_id().to_string(),
        "status": order.status().as_str(),
        "lines": order.lines().iter().map(order_line_to_json).collect::<Vec<_>>(),
        "subtotal": order.subtotal().to_string(),
        "shipping_cost": order.shipping_cost().to_string(),
        "tax_amount": order.tax_amount().to_string(),
        "total_amount": order.total_amount().to_string(),
        "shipping_method": order.shipping_method().as_str(),
        "shipping_address": address_to_json(order.shipping_address()),
        "placed_at": order.placed_at(),
        "updated_at": order.updated_at(),
    })
}

fn order_line_to_json(line: &OrderLine) -> Value {
    json!({
        "product_id": line.product_id.to_string(),
        "sku": line.sku,
        "name": line.name,
        "quantity": line.quantity,
        "unit_price": line.unit_price.to_string(),
    })
}

fn address_to_json(address: &ShippingAddress) -> Value {
    json!({
        "street": address.street,
        "city": address.city,
        "state": address.state,
        "zip": address.zip,
    })
}

pub fn application_to_json(application: &WholesaleApplication) -> Value {
    let details = application.details();
    json!({
        "id": application.id().to_string(),
        "account_id": application.account_id().to_string(),
        "business": {
            "business_name": details.business_name,
            "tax_id": details.tax_id,
            "business_type": details.business_type,
            "street": details.street,
            "city": details.city,
            "state": details.state,
            "zip": details.zip,
            "phone": details.phone,
        },
        "status": application.status().as_str(),
        "submitted_at": application.submitted_at(),
        "decided_at": application.decided_at(),
    })
}

pub fn account_to_json(account: &Account) -> Value {
    json!({
        "id": account.id().to_string(),
        "email": account.email(),
        "display_name": account.display_name(),
        "classification": account.classification().as_str(),
        "approved": account.approved(),
        "wholesale_eligible": account.wholesale_eligible(),
        "total_units_ordered": account.total_units_ordered(),
        "created_at": account.created_at(),
    })
}

pub fn stats_to_json(stats: &DashboardStats) -> Value {
    json!({
        "products": stats.products,
        "accounts": stats.accounts,
        "orders": stats.orders,
        "pending_applications": stats.pending_applications,
        "revenue": stats.revenue.to_string(),
    })
}
