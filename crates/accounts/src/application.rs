use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercora_core::{AccountId, AggregateId, DomainError, DomainResult};

/// Wholesale application identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub AggregateId);

impl ApplicationId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Review status of a wholesale application. Both decided states are
/// terminal; the first decision wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(DomainError::validation(format!(
                "unknown approval status '{other}'"
            ))),
        }
    }
}

/// Business identity collected with a wholesale application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub business_name: String,
    pub tax_id: String,
    pub business_type: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
}

/// Aggregate root: wholesale application.
///
/// An account gets exactly one application ever; the store enforces that
/// uniqueness. The aggregate owns the decision lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WholesaleApplication {
    id: ApplicationId,
    account_id: AccountId,
    details: BusinessDetails,
    status: ApprovalStatus,
    submitted_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}

/// Command: SubmitApplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitApplication {
    pub account_id: AccountId,
    pub details: BusinessDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Persisted shape of an application, used to rehydrate the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationState {
    pub id: ApplicationId,
    pub account_id: AccountId,
    pub details: BusinessDetails,
    pub status: ApprovalStatus,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl WholesaleApplication {
    pub fn submit(cmd: SubmitApplication) -> DomainResult<Self> {
        if cmd.details.business_name.trim().is_empty() {
            return Err(DomainError::validation("business name cannot be empty"));
        }
        if cmd.details.tax_id.trim().is_empty() {
            return Err(DomainError::validation("tax id cannot be empty"));
        }

        let mut details = cmd.details;
        details.business_name = details.business_name.trim().to_string();
        details.tax_id = details.tax_id.trim().to_string();

        Ok(Self {
            id: ApplicationId::new(AggregateId::new()),
            account_id: cmd.account_id,
            details,
            status: ApprovalStatus::Pending,
            submitted_at: cmd.occurred_at,
            decided_at: None,
        })
    }

    /// Approve a pending application.
    ///
    /// Returns `true` when this call made the decision and `false` when the
    /// application was already approved (idempotent re-approve). Approving a
    /// rejected application is a conflict: the first decision is final.
    pub fn approve(&mut self, now: DateTime<Utc>) -> DomainResult<bool> {
        match self.status {
            ApprovalStatus::Pending => {
                self.status = ApprovalStatus::Approved;
                self.decided_at = Some(now);
                Ok(true)
            }
            ApprovalStatus::Approved => Ok(false),
            ApprovalStatus::Rejected => Err(DomainError::conflict(
                "application has already been rejected",
            )),
        }
    }

    /// Reject a pending application. Mirror of [`Self::approve`].
    pub fn reject(&mut self, now: DateTime<Utc>) -> DomainResult<bool> {
        match self.status {
            ApprovalStatus::Pending => {
                self.status = ApprovalStatus::Rejected;
                self.decided_at = Some(now);
                Ok(true)
            }
            ApprovalStatus::Rejected => Ok(false),
            ApprovalStatus::Approved => Err(DomainError::conflict(
                "application has already been approved",
            )),
        }
    }

    /// Rehydrate from persisted state.
    pub fn from_state(state: ApplicationState) -> Self {
        Self {
            id: state.id,
            account_id: state.account_id,
            details: state.details,
            status: state.status,
            submitted_at: state.submitted_at,
            decided_at: state.decided_at,
        }
    }

    pub fn state(&self) -> ApplicationState {
        ApplicationState {
            id: self.id,
            account_id: self.account_id,
            details: self.details.clone(),
            status: self.status,
            submitted_at: self.submitted_at,
            decided_at: self.decided_at,
        }
    }

    pub fn id(&self) -> ApplicationId {
        self.id
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn details(&self) -> &BusinessDetails {
        &self.details
    }

    pub fn status(&self) -> ApprovalStatus {
        self.status
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> BusinessDetails {
        BusinessDetails {
            business_name: "Acme Trading Co".to_string(),
            tax_id: "12-3456789".to_string(),
            business_type: "distributor".to_string(),
            street: "1 Depot Way".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    fn submit_cmd() -> SubmitApplication {
        SubmitApplication {
            account_id: AccountId::new(),
            details: details(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn submit_creates_pending_application() {
        let cmd = submit_cmd();
        let application = WholesaleApplication::submit(cmd.clone()).unwrap();

        assert_eq!(application.account_id(), cmd.account_id);
        assert_eq!(application.status(), ApprovalStatus::Pending);
        assert_eq!(application.submitted_at(), cmd.occurred_at);
        assert_eq!(application.decided_at(), None);
    }

    #[test]
    fn submit_rejects_blank_business_name() {
        let mut cmd = submit_cmd();
        cmd.details.business_name = "  ".to_string();

        let err = WholesaleApplication::submit(cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn submit_rejects_blank_tax_id() {
        let mut cmd = submit_cmd();
        cmd.details.tax_id = String::new();

        let err = WholesaleApplication::submit(cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn approve_decides_a_pending_application() {
        let mut application = WholesaleApplication::submit(submit_cmd()).unwrap();
        let decided = Utc::now();

        assert!(application.approve(decided).unwrap());
        assert_eq!(application.status(), ApprovalStatus::Approved);
        assert_eq!(application.decided_at(), Some(decided));
    }

    #[test]
    fn approve_again_is_a_noop() {
        let mut application = WholesaleApplication::submit(submit_cmd()).unwrap();
        let first = Utc::now();
        application.approve(first).unwrap();

        let changed = application.approve(Utc::now()).unwrap();
        assert!(!changed);
        assert_eq!(application.decided_at(), Some(first));
    }

    #[test]
    fn approve_after_reject_is_a_conflict() {
        let mut application = WholesaleApplication::submit(submit_cmd()).unwrap();
        application.reject(Utc::now()).unwrap();

        let err = application.approve(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(application.status(), ApprovalStatus::Rejected);
    }

    #[test]
    fn reject_decides_a_pending_application() {
        let mut application = WholesaleApplication::submit(submit_cmd()).unwrap();
        let decided = Utc::now();

        assert!(application.reject(decided).unwrap());
        assert_eq!(application.status(), ApprovalStatus::Rejected);
        assert_eq!(application.decided_at(), Some(decided));
    }

    #[test]
    fn reject_again_is_a_noop() {
        let mut application = WholesaleApplication::submit(submit_cmd()).unwrap();
        let first = Utc::now();
        application.reject(first).unwrap();

        assert!(!application.reject(Utc::now()).unwrap());
        assert_eq!(application.decided_at(), Some(first));
    }

    #[test]
    fn reject_after_approve_is_a_conflict() {
        let mut application = WholesaleApplication::submit(submit_cmd()).unwrap();
        application.approve(Utc::now()).unwrap();

        let err = application.reject(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(application.status(), ApprovalStatus::Approved);
    }

    #[test]
    fn approval_status_parses_wire_strings() {
        assert_eq!(
            "pending".parse::<ApprovalStatus>().unwrap(),
            ApprovalStatus::Pending
        );
        assert_eq!(ApprovalStatus::Rejected.as_str(), "rejected");
        assert!("denied".parse::<ApprovalStatus>().is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        #[derive(Debug, Clone, Copy)]
        enum Decision {
            Approve,
            Reject,
        }

        fn decision() -> impl Strategy<Value = Decision> {
            prop_oneof![Just(Decision::Approve), Just(Decision::Reject)]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: whatever sequence of decisions arrives, the first
            /// one is final and `decided_at` never moves after it.
            #[test]
            fn first_decision_is_final(decisions in proptest::collection::vec(decision(), 1..8)) {
                let mut application = WholesaleApplication::submit(SubmitApplication {
                    account_id: AccountId::new(),
                    details: super::details(),
                    occurred_at: Utc::now(),
                }).unwrap();

                let mut first: Option<(ApprovalStatus, DateTime<Utc>)> = None;
                for d in decisions {
                    let now = Utc::now();
                    let outcome = match d {
                        Decision::Approve => application.approve(now),
                        Decision::Reject => application.reject(now),
                    };

                    match first {
                        None => {
                            prop_assert_eq!(outcome.unwrap(), true);
                            first = Some((application.status(), now));
                        }
                        Some((status, decided_at)) => {
                            prop_assert_eq!(application.status(), status);
                            prop_assert_eq!(application.decided_at(), Some(decided_at));
                            // Matching decision repeats silently, the opposite conflicts.
                            let repeats = matches!(
                                (d, status),
                                (Decision::Approve, ApprovalStatus::Approved)
                                    | (Decision::Reject, ApprovalStatus::Rejected)
                            );
                            if repeats {
                                prop_assert_eq!(outcome.unwrap(), false);
                            } else {
                                prop_assert!(outcome.is_err());
                            }
                        }
                    }
                }
            }
        }
    }
}
