use mercora_auth::{AuthzError, Permission, Principal, authorize};

use crate::context::ActorContext;

/// Role-to-permission policy for the storefront.
///
/// Every authenticated caller gets the storefront set; the `admin` role adds
/// the wildcard, which covers the `products.manage` / `wholesale.review` /
/// `orders.manage` / `accounts.read` / `stats.read` checks on the admin
/// routes.
pub fn permissions_from_roles(roles: &[mercora_auth::Role]) -> Vec<Permission> {
    let mut permissions = vec![
        Permission::new("cart.manage"),
        Permission::new("orders.place"),
        Permission::new("orders.read"),
        Permission::new("wholesale.apply"),
    ];
    if roles.iter().any(|role| role.as_str() == "admin") {
        permissions.push(Permission::new("*"));
    }
    permissions
}

/// Authorize the caller for one named permission.
pub fn authorize_request(actor: &ActorContext, required: &Permission) -> Result<(), AuthzError> {
    let principal = Principal {
        account_id: actor.account_id(),
        roles: actor.roles().to_vec(),
        permissions: permissions_from_roles(actor.roles()),
    };
    authorize(&principal, required)
}
