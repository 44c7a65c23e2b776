pub mod admin;
pub mod cart;
pub mod orders;
pub mod products;
pub mod system;
pub mod wholesale;

use axum::Router;

/// Everything that requires an authenticated caller. The public surface
/// (health and catalog reads) is assembled separately in [`crate::app`].
pub fn router() -> Router {
    Router::new()
        .merge(system::protected_router())
        .merge(products::admin_router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(wholesale::router())
        .merge(admin::router())
}
