use std::collections::HashSet;

use thiserror::Error;

use mercora_core::AccountId;

use crate::{Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// Built by the API layer from verified claims plus the role-to-permission
/// policy; this crate never resolves permissions itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: AccountId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for one required permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(permissions: Vec<Permission>) -> Principal {
        Principal {
            account_id: AccountId::new(),
            roles: vec![Role::new("buyer")],
            permissions,
        }
    }

    #[test]
    fn wildcard_grants_everything() {
        let p = principal(vec![Permission::new("*")]);
        assert!(authorize(&p, &Permission::new("catalog.write")).is_ok());
        assert!(authorize(&p, &Permission::new("orders.manage")).is_ok());
    }

    #[test]
    fn exact_permission_grants() {
        let p = principal(vec![Permission::new("catalog.write")]);
        assert!(authorize(&p, &Permission::new("catalog.write")).is_ok());
    }

    #[test]
    fn missing_permission_denies_with_the_permission_named() {
        let p = principal(Vec::new());
        let err = authorize(&p, &Permission::new("catalog.write")).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("catalog.write".to_string()));
    }
}
