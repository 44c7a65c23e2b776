//! Buyer accounts and the wholesale approval workflow.
//!
//! Pure domain logic: no IO, no HTTP, no storage. Uniqueness rules (one
//! account per email, one application per account) live in the store layer.

pub mod account;
pub mod application;

pub use account::{Account, AccountState, Classification, RegisterAccount};
pub use application::{
    ApplicationId, ApplicationState, ApprovalStatus, BusinessDetails, SubmitApplication,
    WholesaleApplication,
};
