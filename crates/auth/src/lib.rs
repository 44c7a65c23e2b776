//! `mercora-auth` — authentication/authorization boundary.
//!
//! Claims validation and policy checks are pure; only [`jwt`] touches token
//! decoding, and nothing here touches HTTP or storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{AuthError, Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use roles::Role;
