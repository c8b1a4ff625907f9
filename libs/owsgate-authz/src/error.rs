//! Error types for the authorization core.
//!
//! These cover caller-contract violations only. Denial of access is not
//! an error: the engine expresses it as a normal
//! [`AuthorizationReport`](crate::models::AuthorizationReport) with
//! `authorized == false`.

use thiserror::Error;

/// A request that violates the engine's input contract.
///
/// The protocol parser upstream is responsible for producing complete
/// requests; hitting this error means a caller bug, not a denial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// A mandatory request field is empty.
    #[error("request is missing a mandatory field: {0}")]
    InvalidRequest(&'static str),
}
