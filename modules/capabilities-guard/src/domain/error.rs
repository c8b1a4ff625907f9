//! Error types for the capabilities guard.

use thiserror::Error;

use ows_authz::{AuthzError, ServiceKind};
use ows_xmlfilter::{FilterError, PathPatternError};

/// Errors raised by the guard service.
///
/// Denied access is not represented here: the guard hands the caller a
/// normal `AuthorizationReport` with `authorized == false`.
#[derive(Debug, Error)]
pub enum GuardError {
    /// A configured path pattern failed to compile. Raised at service
    /// construction, never per request.
    #[error("invalid guard configuration: {0}")]
    Config(#[from] PathPatternError),

    /// A capabilities response arrived for a service family the
    /// configuration has no filter layout for.
    #[error("no filter rules configured for service {0}")]
    UnconfiguredService(ServiceKind),

    /// The request violated the engine's input contract.
    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// The filter pass failed; the partial output must be discarded.
    #[error("capabilities filtering failed: {0}")]
    Filter(#[from] FilterError),
}
