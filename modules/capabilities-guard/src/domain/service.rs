//! Domain service for the capabilities guard.
//!
//! [`GuardService`] owns a compiled filter configuration plus an
//! immutable permission snapshot and exposes the two operations the
//! proxying layer drives per request: decide, then (for authorized
//! capabilities responses) filter the upstream body on its way out.
//!
//! Everything here is synchronous and driven by the calling thread;
//! concurrent requests share only the read-only snapshot, so no locking
//! is involved. Swapping permissions means building a new service value.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::Arc;

use ows_authz::{AuthorizationReport, OwsRequest, Permission, ServiceKind, evaluate};
use ows_xmlfilter::{
    AttributeRule, BlacklistDecisionMaker, BlacklistRule, DocumentFilter, StaticAttributeModifier,
};

use super::error::GuardError;
use crate::config::{CompiledService, GuardConfig};

/// The capabilities enforcement service.
pub struct GuardService {
    permissions: Arc<[Permission]>,
    services: HashMap<ServiceKind, CompiledService>,
}

impl GuardService {
    /// Compile `config` and bind it to a permission snapshot.
    ///
    /// # Errors
    ///
    /// [`GuardError::Config`] for the first malformed path pattern.
    pub fn new(
        config: &GuardConfig,
        permissions: impl Into<Arc<[Permission]>>,
    ) -> Result<Self, GuardError> {
        Ok(Self {
            permissions: permissions.into(),
            services: config.compile()?,
        })
    }

    /// The permission snapshot this service decides against.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Decide whether `request` is allowed.
    ///
    /// Denial is a normal report; the HTTP-facing caller maps it to a
    /// status code and the report's message.
    ///
    /// # Errors
    ///
    /// [`GuardError::Authz`] when the request violates the engine's
    /// input contract (an upstream parser bug).
    #[tracing::instrument(
        skip_all,
        fields(
            service = %request.service,
            operation = %request.operation,
            version = %request.version,
            service_name = %request.service_name,
        )
    )]
    pub fn authorize(&self, request: &OwsRequest) -> Result<AuthorizationReport, GuardError> {
        let report = evaluate(request, &self.permissions)?;
        if report.authorized {
            tracing::debug!(
                denied_resources = report.denied_resources.len(),
                "request authorized"
            );
        } else {
            tracing::info!(message = report.message.as_deref(), "request denied");
        }
        Ok(report)
    }

    /// Filter an upstream capabilities body into `sink`, suppressing
    /// the report's denied resources and remapping configured endpoint
    /// attributes to the service's public endpoint.
    ///
    /// The caller invokes this only for authorized capabilities
    /// requests; anything else passes through or is rejected before the
    /// body exists.
    ///
    /// # Errors
    ///
    /// - [`GuardError::UnconfiguredService`] when no layout covers the
    ///   request's service family
    /// - [`GuardError::Filter`] when the pass fails; the partial output
    ///   must not be served
    #[tracing::instrument(skip_all, fields(service = %request.service))]
    pub fn filter_capabilities<R: BufRead, W: Write>(
        &self,
        request: &OwsRequest,
        report: &AuthorizationReport,
        body: R,
        sink: W,
    ) -> Result<(), GuardError> {
        let layout = self
            .services
            .get(&request.service)
            .ok_or(GuardError::UnconfiguredService(request.service))?;

        let decision = BlacklistDecisionMaker::new(
            layout
                .resource_paths
                .iter()
                .map(|(container, label_child)| BlacklistRule {
                    container: container.clone(),
                    label_child: label_child.clone(),
                    blacklist: report.denied_resources.clone(),
                })
                .collect(),
        );

        let attributes = StaticAttributeModifier::new(match &layout.public_endpoint {
            Some(endpoint) => layout
                .endpoint_attributes
                .iter()
                .map(|(path, attribute)| AttributeRule {
                    path: path.clone(),
                    attribute: attribute.clone(),
                    value: endpoint.as_str().to_owned(),
                })
                .collect(),
            None => Vec::new(),
        });

        DocumentFilter::new(decision, attributes).filter(body, sink)?;
        Ok(())
    }
}

impl std::fmt::Debug for GuardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardService")
            .field("permissions", &self.permissions.len())
            .field("services", &self.services.keys())
            .finish_non_exhaustive()
    }
}
