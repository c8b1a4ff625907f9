#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorization core for the OWS gateway.
//!
//! This crate decides whether a normalized OGC request is allowed under a
//! principal's permission set:
//!
//! - [`Version`], [`VersionRange`] - protocol versions and range
//!   constraints with pure containment
//! - [`OwsRequest`], [`Permission`], [`AuthorizationReport`] - the
//!   request/grant/decision models
//! - [`evaluate`] - the OR-semantics decision engine
//!
//! Request parsing and permission storage are collaborators' concerns;
//! this crate consumes their output and produces a report the HTTP layer
//! and the capabilities response filter act on. Denial is a report value,
//! never an error.
//!
//! ## Usage
//!
//! ```
//! use ows_authz::{evaluate, Operation, OwsRequest, Permission, ServiceKind, Version};
//!
//! let permissions = vec![Permission::new(
//!     ServiceKind::Wms,
//!     Operation::GetMap,
//!     ">= 1.0.0".parse()?,
//!     "topp",
//!     url::Url::parse("http://upstream.example/wms")?,
//! )
//! .for_resource("roads")];
//!
//! let request = OwsRequest::new(
//!     ServiceKind::Wms,
//!     Operation::GetMap,
//!     Version::new(1, 1, 1),
//!     "topp",
//! )
//! .with_resources(["roads"]);
//!
//! let report = evaluate(&request, &permissions)?;
//! assert!(report.authorized);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod error;
pub mod models;
pub mod version;

// Re-export main types at crate root
pub use engine::evaluate;
pub use error::AuthzError;
pub use models::{
    AuthorizationReport, Operation, OwsRequest, Permission, ServiceKind, UnknownNameError,
    denial_message,
};
pub use version::{Version, VersionLimit, VersionParseError, VersionRange};
