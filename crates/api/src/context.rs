use mercora_auth::{JwtClaims, Role};
use mercora_core::AccountId;

/// The authenticated caller, built from verified token claims by the auth
/// middleware and carried through request extensions.
#[derive(Debug, Clone)]
pub struct ActorContext {
    account_id: AccountId,
    email: String,
    roles: Vec<Role>,
}

impl ActorContext {
    pub fn new(account_id: AccountId, email: String, roles: Vec<Role>) -> Self {
        Self {
            account_id,
            email,
            roles,
        }
    }

    pub fn from_claims(claims: JwtClaims) -> Self {
        Self::new(claims.sub, claims.email, claims.roles)
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role.as_str() == "admin")
    }
}
