#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Capabilities Guard Module
//!
//! This module wires the authorization engine to the streaming response
//! filter: one [`GuardService`] decides requests against a permission
//! snapshot and rewrites authorized capabilities responses so that only
//! permitted resources and the gateway's own endpoints are visible.
//!
//! Request parsing, permission retrieval and HTTP plumbing are the
//! surrounding proxy's concerns; this module consumes their shapes and
//! hands back an `AuthorizationReport` plus the filtered body stream.

pub mod config;
pub mod domain;

pub use config::{
    EndpointAttributeConfig, GuardConfig, ResourcePathConfig, ServiceGuardConfig,
};
pub use domain::{GuardError, GuardService};
