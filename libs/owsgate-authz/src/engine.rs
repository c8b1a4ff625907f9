//! The authorization decision engine.
//!
//! Matches a normalized request against a principal's permission set with
//! OR-semantics: the request is allowed if *any* permission matches it.
//! Permissions never veto each other; a grant somewhere in the set is
//! sufficient for the part of the request it covers. Contradictory
//! version ranges for the same resource therefore resolve in favor of
//! whichever range contains the requested version.
//!
//! ## Decision rules
//!
//! - A permission matches the request context when service family,
//!   operation, and service name are equal and its version range contains
//!   the requested version.
//! - A request naming no resources (a capabilities listing) is allowed
//!   when at least one context-matching permission exists.
//! - A request naming resources is allowed only when *every* named
//!   resource is covered by a context-matching permission whose resource
//!   constraint is absent or equal to it. Partial coverage denies the
//!   whole request; there is no silent downgrade to partial success.

use std::collections::{BTreeSet, HashMap};

use crate::error::AuthzError;
use crate::models::{AuthorizationReport, OwsRequest, Permission};

/// Decide whether `request` is allowed under `permissions`.
///
/// Returns a denial report (never an error) when no permission covers
/// the request. The report of an authorized capabilities request carries
/// the denied-resource names the response filter must suppress.
///
/// # Errors
///
/// [`AuthzError::InvalidRequest`] when a mandatory request field is
/// empty. The upstream parser is expected to have rejected such requests
/// already.
pub fn evaluate(
    request: &OwsRequest,
    permissions: &[Permission],
) -> Result<AuthorizationReport, AuthzError> {
    validate(request)?;

    if !request.resources.is_empty() {
        for resource in &request.resources {
            let granted = permissions.iter().any(|p| {
                context_matches(p, request)
                    && p.resource.as_deref().is_none_or(|name| name == resource)
            });
            if !granted {
                tracing::debug!(
                    service = %request.service,
                    operation = %request.operation,
                    resource = %resource,
                    "no permission grants the requested resource"
                );
                return Ok(AuthorizationReport::denied(request.operation));
            }
        }
    }

    let matching: Vec<&Permission> = permissions
        .iter()
        .filter(|p| context_matches(p, request))
        .filter(|p| {
            // A listing request ignores resource constraints for the
            // context match; a data request only draws endpoint/params
            // from permissions that cover one of its resources.
            request.resources.is_empty()
                || p.resource
                    .as_deref()
                    .is_none_or(|name| request.resources.iter().any(|r| r == name))
        })
        .collect();

    if matching.is_empty() {
        tracing::debug!(
            service = %request.service,
            operation = %request.operation,
            version = %request.version,
            "no permission matches the request context"
        );
        return Ok(AuthorizationReport::denied(request.operation));
    }

    Ok(AuthorizationReport {
        authorized: true,
        message: None,
        endpoint: Some(matching[0].endpoint.clone()),
        extra_params: merged_params(&matching),
        denied_resources: denied_resources(request, permissions),
    })
}

fn validate(request: &OwsRequest) -> Result<(), AuthzError> {
    if request.service_name.trim().is_empty() {
        return Err(AuthzError::InvalidRequest("service_name"));
    }
    if request.resources.iter().any(|r| r.trim().is_empty()) {
        return Err(AuthzError::InvalidRequest("resources"));
    }
    Ok(())
}

fn context_matches(permission: &Permission, request: &OwsRequest) -> bool {
    permission.service == request.service
        && permission.operation == request.operation
        && permission.service_name == request.service_name
        && permission.versions.contains(request.version)
}

/// Union of forced parameters over the matching permissions,
/// last-write-wins per key. Keys are permission-defined, never
/// request-controlled.
fn merged_params(matching: &[&Permission]) -> HashMap<String, Vec<String>> {
    let mut merged = HashMap::new();
    for permission in matching {
        for (key, values) in &permission.extra_params {
            merged.insert(key.clone(), values.clone());
        }
    }
    merged
}

/// Resource names the principal must not see in a capabilities listing.
///
/// A name is denied when some permission for this service instance
/// mentions it (any operation, any version, including names carried by
/// capabilities permissions, which only whitelist the listing itself) but
/// no version-matching data-operation permission grants it. A
/// version-matching wildcard data permission grants everything, so
/// nothing is denied.
fn denied_resources(request: &OwsRequest, permissions: &[Permission]) -> BTreeSet<String> {
    if !request.operation.is_capabilities() {
        return BTreeSet::new();
    }

    let in_scope = |p: &Permission| {
        p.service == request.service && p.service_name == request.service_name
    };
    let grants_data = |p: &Permission| {
        in_scope(p) && !p.operation.is_capabilities() && p.versions.contains(request.version)
    };

    if permissions
        .iter()
        .any(|p| grants_data(p) && p.resource.is_none())
    {
        return BTreeSet::new();
    }

    permissions
        .iter()
        .filter(|p| in_scope(p))
        .filter_map(|p| p.resource.as_deref())
        .filter(|name| {
            !permissions
                .iter()
                .any(|p| grants_data(p) && p.resource.as_deref() == Some(*name))
        })
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use url::Url;

    use super::*;
    use crate::models::{Operation, ServiceKind};
    use crate::version::Version;

    fn upstream() -> Url {
        Url::parse("http://upstream.example/ows").unwrap()
    }

    fn permission(operation: Operation, versions: &str) -> Permission {
        Permission::new(
            ServiceKind::Wms,
            operation,
            versions.parse().unwrap(),
            "topp",
            upstream(),
        )
    }

    fn getmap_request(resources: &[&str]) -> OwsRequest {
        OwsRequest::new(
            ServiceKind::Wms,
            Operation::GetMap,
            Version::new(1, 1, 1),
            "topp",
        )
        .with_resources(resources.iter().copied())
    }

    fn capabilities_request() -> OwsRequest {
        OwsRequest::new(
            ServiceKind::Wms,
            Operation::GetCapabilities,
            Version::new(1, 1, 1),
            "topp",
        )
    }

    #[test]
    fn empty_permission_set_denies() {
        let report = evaluate(&getmap_request(&["roads"]), &[]).unwrap();
        assert!(!report.authorized);
        assert_eq!(report.message.as_deref(), Some("GETMAP request denied"));
    }

    #[test]
    fn partial_grant_denies_the_whole_request() {
        let perms = vec![permission(Operation::GetMap, ">= 1.0.0").for_resource("roads")];
        let report = evaluate(&getmap_request(&["roads", "water"]), &perms).unwrap();

        assert!(!report.authorized);
        assert_eq!(report.message.as_deref(), Some("GETMAP request denied"));
        assert!(report.endpoint.is_none());
    }

    #[test]
    fn single_granted_resource_is_authorized() {
        let perms = vec![permission(Operation::GetMap, ">= 1.0.0").for_resource("roads")];
        let report = evaluate(&getmap_request(&["roads"]), &perms).unwrap();

        assert!(report.authorized);
        assert!(report.message.is_none());
        assert_eq!(report.endpoint, Some(upstream()));
    }

    #[test]
    fn wildcard_permission_authorizes_any_resource() {
        let perms = vec![permission(Operation::GetMap, ">= 1.0.0")];
        let report = evaluate(&getmap_request(&["roads", "water", "parcels"]), &perms).unwrap();
        assert!(report.authorized);
    }

    #[test]
    fn version_outside_the_range_denies() {
        let perms = vec![permission(Operation::GetMap, ">= 1.3.0").for_resource("roads")];
        let report = evaluate(&getmap_request(&["roads"]), &perms).unwrap();
        assert!(!report.authorized);
    }

    #[test]
    fn any_matching_range_authorizes_despite_a_non_matching_one() {
        // Two grants for the same resource with different ranges; only one
        // contains the requested 1.1.1. OR-semantics: the match wins.
        let perms = vec![
            permission(Operation::GetMap, ">= 1.3.0").for_resource("roads"),
            permission(Operation::GetMap, "<= 1.1.1").for_resource("roads"),
        ];
        let report = evaluate(&getmap_request(&["roads"]), &perms).unwrap();
        assert!(report.authorized);
    }

    #[test]
    fn operation_mismatch_denies() {
        let perms = vec![permission(Operation::GetFeatureInfo, ">= 1.0.0")];
        let report = evaluate(&getmap_request(&["roads"]), &perms).unwrap();
        assert!(!report.authorized);
    }

    #[test]
    fn service_name_mismatch_denies() {
        let mut p = permission(Operation::GetMap, ">= 1.0.0");
        p.service_name = "other".to_owned();
        let report = evaluate(&getmap_request(&["roads"]), &[p]).unwrap();
        assert!(!report.authorized);
    }

    #[test]
    fn endpoint_comes_from_the_first_matching_permission() {
        let mut second = permission(Operation::GetMap, ">= 1.0.0");
        second.endpoint = Url::parse("http://replica.example/ows").unwrap();
        let perms = vec![permission(Operation::GetMap, ">= 1.0.0"), second];

        let report = evaluate(&getmap_request(&["roads"]), &perms).unwrap();
        assert_eq!(report.endpoint, Some(upstream()));
    }

    #[test]
    fn extra_params_merge_last_write_wins() {
        let perms = vec![
            permission(Operation::GetMap, ">= 1.0.0")
                .for_resource("roads")
                .with_param("watermark", vec!["off".to_owned()])
                .with_param("buffer", vec!["16".to_owned()]),
            permission(Operation::GetMap, ">= 1.0.0")
                .for_resource("water")
                .with_param("watermark", vec!["on".to_owned()]),
        ];
        let report = evaluate(&getmap_request(&["roads", "water"]), &perms).unwrap();

        assert!(report.authorized);
        assert_eq!(report.extra_params["watermark"], vec!["on"]);
        assert_eq!(report.extra_params["buffer"], vec!["16"]);
    }

    #[test]
    fn non_matching_permission_contributes_no_params() {
        let perms = vec![
            permission(Operation::GetMap, ">= 1.0.0").for_resource("roads"),
            permission(Operation::GetMap, ">= 1.0.0")
                .for_resource("water")
                .with_param("watermark", vec!["on".to_owned()]),
        ];
        let report = evaluate(&getmap_request(&["roads"]), &perms).unwrap();

        assert!(report.authorized);
        assert!(report.extra_params.is_empty());
    }

    #[test]
    fn capabilities_without_matching_permission_denies() {
        let perms = vec![permission(Operation::GetMap, ">= 1.0.0")];
        let report = evaluate(&capabilities_request(), &perms).unwrap();
        assert!(!report.authorized);
        assert_eq!(
            report.message.as_deref(),
            Some("GETCAPABILITIES request denied")
        );
    }

    #[test]
    fn capabilities_hides_resources_without_a_data_grant() {
        let perms = vec![
            permission(Operation::GetCapabilities, ">= 1.0.0"),
            permission(Operation::GetMap, ">= 1.0.0").for_resource("roads"),
            permission(Operation::GetFeatureInfo, ">= 1.0.0").for_resource("water"),
        ];
        let report = evaluate(&capabilities_request(), &perms).unwrap();

        assert!(report.authorized);
        // Both names are mentioned and both carry a data grant: visible.
        assert!(report.denied_resources.is_empty());
    }

    #[test]
    fn capabilities_hides_names_whose_grant_misses_the_version() {
        let perms = vec![
            permission(Operation::GetCapabilities, ">= 1.0.0"),
            permission(Operation::GetMap, ">= 1.0.0").for_resource("roads"),
            // Grant exists but not for the requested 1.1.1.
            permission(Operation::GetMap, ">= 1.3.0").for_resource("water"),
        ];
        let report = evaluate(&capabilities_request(), &perms).unwrap();

        assert!(report.authorized);
        assert_eq!(
            report.denied_resources,
            BTreeSet::from(["water".to_owned()])
        );
    }

    #[test]
    fn capabilities_permission_names_stay_hidden_unless_granted() {
        // A resource named on the capabilities grant itself is only a
        // whitelist entry for the listing; without a data-operation grant
        // it stays hidden.
        let perms = vec![
            permission(Operation::GetCapabilities, ">= 1.0.0").for_resource("parcels"),
            permission(Operation::GetMap, ">= 1.0.0").for_resource("roads"),
        ];
        let report = evaluate(&capabilities_request(), &perms).unwrap();

        assert!(report.authorized);
        assert_eq!(
            report.denied_resources,
            BTreeSet::from(["parcels".to_owned()])
        );
    }

    #[test]
    fn wildcard_data_grant_clears_the_denied_set() {
        let perms = vec![
            permission(Operation::GetCapabilities, ">= 1.0.0").for_resource("parcels"),
            permission(Operation::GetMap, ">= 1.0.0"),
        ];
        let report = evaluate(&capabilities_request(), &perms).unwrap();

        assert!(report.authorized);
        assert!(report.denied_resources.is_empty());
    }

    #[test]
    fn data_requests_carry_no_denied_resources() {
        let perms = vec![
            permission(Operation::GetMap, ">= 1.0.0").for_resource("roads"),
            permission(Operation::GetMap, ">= 1.3.0").for_resource("water"),
        ];
        let report = evaluate(&getmap_request(&["roads"]), &perms).unwrap();

        assert!(report.authorized);
        assert!(report.denied_resources.is_empty());
    }

    #[test]
    fn other_service_instances_do_not_leak_into_the_denied_set() {
        let mut other = permission(Operation::GetMap, ">= 1.0.0").for_resource("secret");
        other.service_name = "other".to_owned();
        let perms = vec![permission(Operation::GetCapabilities, ">= 1.0.0"), other];

        let report = evaluate(&capabilities_request(), &perms).unwrap();
        assert!(report.authorized);
        assert!(report.denied_resources.is_empty());
    }

    #[test]
    fn empty_service_name_is_a_caller_bug() {
        let mut request = getmap_request(&["roads"]);
        request.service_name = String::new();
        let err = evaluate(&request, &[]).unwrap_err();
        assert_eq!(err, AuthzError::InvalidRequest("service_name"));
    }

    #[test]
    fn empty_resource_name_is_a_caller_bug() {
        let request = getmap_request(&["roads", ""]);
        let err = evaluate(&request, &[]).unwrap_err();
        assert_eq!(err, AuthzError::InvalidRequest("resources"));
    }
}
