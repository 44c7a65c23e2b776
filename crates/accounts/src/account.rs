use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercora_core::{AccountId, DomainError, DomainResult};

/// Pricing classification of a buyer account.
///
/// Classification alone does not unlock wholesale prices; the account must
/// also be approved (see [`Account::wholesale_eligible`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Retail,
    Wholesale,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Retail => "retail",
            Classification::Wholesale => "wholesale",
        }
    }
}

impl FromStr for Classification {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retail" => Ok(Classification::Retail),
            "wholesale" => Ok(Classification::Wholesale),
            other => Err(DomainError::validation(format!(
                "unknown classification '{other}'"
            ))),
        }
    }
}

/// Aggregate root: buyer account.
///
/// `total_units_ordered` is the lifetime unit counter that drives the volume
/// discount; it only ever grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    email: String,
    display_name: String,
    classification: Classification,
    approved: bool,
    total_units_ordered: i64,
    created_at: DateTime<Utc>,
}

/// Command: RegisterAccount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAccount {
    pub account_id: AccountId,
    pub email: String,
    pub display_name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Persisted shape of an account, used to rehydrate the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub id: AccountId,
    pub email: String,
    pub display_name: String,
    pub classification: Classification,
    pub approved: bool,
    pub total_units_ordered: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Register a new account. Everyone starts retail; wholesale status is
    /// only ever granted through an approved application.
    pub fn register(cmd: RegisterAccount) -> DomainResult<Self> {
        let email = cmd.email.trim();
        if email.is_empty() {
            return Err(DomainError::validation("email cannot be empty"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("email is not an address"));
        }

        Ok(Self {
            id: cmd.account_id,
            email: email.to_string(),
            display_name: cmd.display_name,
            classification: Classification::Retail,
            approved: false,
            total_units_ordered: 0,
            created_at: cmd.occurred_at,
        })
    }

    /// Whether this account sees wholesale prices: classified wholesale *and*
    /// approved. Either flag alone is not enough.
    pub fn wholesale_eligible(&self) -> bool {
        self.classification == Classification::Wholesale && self.approved
    }

    /// Flip the account to approved wholesale. Idempotent: granting an
    /// already-wholesale account changes nothing.
    pub fn grant_wholesale(&mut self) {
        self.classification = Classification::Wholesale;
        self.approved = true;
    }

    /// Add ordered units to the lifetime counter.
    pub fn record_units(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity < 0 {
            return Err(DomainError::validation(
                "cannot record a negative unit count",
            ));
        }
        self.total_units_ordered += quantity;
        Ok(())
    }

    /// Rehydrate from persisted state.
    pub fn from_state(state: AccountState) -> Self {
        Self {
            id: state.id,
            email: state.email,
            display_name: state.display_name,
            classification: state.classification,
            approved: state.approved,
            total_units_ordered: state.total_units_ordered,
            created_at: state.created_at,
        }
    }

    pub fn state(&self) -> AccountState {
        AccountState {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            classification: self.classification,
            approved: self.approved,
            total_units_ordered: self.total_units_ordered,
            created_at: self.created_at,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn approved(&self) -> bool {
        self.approved
    }

    pub fn total_units_ordered(&self) -> i64 {
        self.total_units_ordered
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_cmd() -> RegisterAccount {
        RegisterAccount {
            account_id: AccountId::new(),
            email: "buyer@example.com".to_string(),
            display_name: "Buyer".to_string(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn register_starts_retail_with_zero_units() {
        let account = Account::register(register_cmd()).unwrap();

        assert_eq!(account.classification(), Classification::Retail);
        assert!(!account.approved());
        assert!(!account.wholesale_eligible());
        assert_eq!(account.total_units_ordered(), 0);
    }

    #[test]
    fn register_rejects_bad_emails() {
        let cmd = RegisterAccount {
            email: "   ".to_string(),
            ..register_cmd()
        };
        assert!(matches!(
            Account::register(cmd),
            Err(DomainError::Validation(_))
        ));

        let cmd = RegisterAccount {
            email: "not-an-address".to_string(),
            ..register_cmd()
        };
        assert!(matches!(
            Account::register(cmd),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn register_trims_email() {
        let cmd = RegisterAccount {
            email: "  buyer@example.com  ".to_string(),
            ..register_cmd()
        };

        let account = Account::register(cmd).unwrap();
        assert_eq!(account.email(), "buyer@example.com");
    }

    #[test]
    fn grant_wholesale_is_idempotent() {
        let mut account = Account::register(register_cmd()).unwrap();

        account.grant_wholesale();
        assert!(account.wholesale_eligible());
        let snapshot = account.clone();

        account.grant_wholesale();
        assert_eq!(account, snapshot);
    }

    #[test]
    fn eligibility_requires_classification_and_approval() {
        let base = Account::register(register_cmd()).unwrap().state();

        let classified_only = Account::from_state(AccountState {
            classification: Classification::Wholesale,
            approved: false,
            ..base.clone()
        });
        assert!(!classified_only.wholesale_eligible());

        let approved_only = Account::from_state(AccountState {
            classification: Classification::Retail,
            approved: true,
            ..base.clone()
        });
        assert!(!approved_only.wholesale_eligible());

        let both = Account::from_state(AccountState {
            classification: Classification::Wholesale,
            approved: true,
            ..base
        });
        assert!(both.wholesale_eligible());
    }

    #[test]
    fn record_units_accumulates() {
        let mut account = Account::register(register_cmd()).unwrap();

        account.record_units(9_900).unwrap();
        account.record_units(150).unwrap();
        account.record_units(0).unwrap();

        assert_eq!(account.total_units_ordered(), 10_050);
    }

    #[test]
    fn record_units_rejects_negative_quantities() {
        let mut account = Account::register(register_cmd()).unwrap();

        let err = account.record_units(-1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(account.total_units_ordered(), 0);
    }

    #[test]
    fn state_round_trips() {
        let mut account = Account::register(register_cmd()).unwrap();
        account.grant_wholesale();
        account.record_units(42).unwrap();

        let rehydrated = Account::from_state(account.state());
        assert_eq!(rehydrated, account);
    }

    #[cfg(test)]
    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: the lifetime counter never decreases under any mix
            /// of recorded quantities, including rejected negative ones.
            #[test]
            fn unit_counter_never_decreases(
                quantities in proptest::collection::vec(-100i64..10_000, 0..20)
            ) {
                let mut account = Account::register(RegisterAccount {
                    account_id: AccountId::new(),
                    email: "buyer@example.com".to_string(),
                    display_name: "Buyer".to_string(),
                    occurred_at: Utc::now(),
                }).unwrap();

                let mut previous = account.total_units_ordered();
                for quantity in quantities {
                    let _ = account.record_units(quantity);
                    prop_assert!(account.total_units_ordered() >= previous);
                    previous = account.total_units_ordered();
                }
            }
        }
    }
}
