//! Domain models for gateway authorization.
//!
//! A principal's grants are a flat list of [`Permission`] values; the
//! inbound request arrives as an [`OwsRequest`] already normalized by a
//! protocol-specific parser (KVP or XML POST, not this crate's concern).
//! The decision engine turns the two into an [`AuthorizationReport`].
//!
//! All types here are immutable after construction: permission snapshots
//! are shared across concurrent requests without synchronization.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::version::{Version, VersionRange};

/// The OGC service families the gateway fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceKind {
    /// Web Map Service.
    Wms,
    /// Web Feature Service.
    Wfs,
    /// Web Coverage Service.
    Wcs,
    /// Web Processing Service.
    Wps,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wms => "WMS",
            Self::Wfs => "WFS",
            Self::Wcs => "WCS",
            Self::Wps => "WPS",
        };
        f.write_str(name)
    }
}

/// Error parsing a [`ServiceKind`] or [`Operation`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {value:?}")]
pub struct UnknownNameError {
    what: &'static str,
    value: String,
}

impl FromStr for ServiceKind {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WMS" => Ok(Self::Wms),
            "WFS" => Ok(Self::Wfs),
            "WCS" => Ok(Self::Wcs),
            "WPS" => Ok(Self::Wps),
            _ => Err(UnknownNameError {
                what: "service",
                value: s.to_owned(),
            }),
        }
    }
}

/// An OGC operation name.
///
/// `Display` renders the canonical upper-case form used in denial
/// messages (`GETMAP`, `GETCAPABILITIES`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Capabilities self-description (all services).
    GetCapabilities,
    /// WMS map rendering.
    GetMap,
    /// WMS feature query at a pixel.
    GetFeatureInfo,
    /// WMS layer description.
    DescribeLayer,
    /// WMS legend rendering.
    GetLegendGraphic,
    /// WFS feature retrieval.
    GetFeature,
    /// WFS feature type description.
    DescribeFeatureType,
    /// WFS write operations.
    Transaction,
    /// WCS coverage retrieval.
    GetCoverage,
    /// WCS coverage description.
    DescribeCoverage,
    /// WPS process execution.
    Execute,
    /// WPS process description.
    DescribeProcess,
}

impl Operation {
    /// Whether this is the capabilities-listing operation, whose response
    /// document is subject to resource filtering.
    #[must_use]
    pub const fn is_capabilities(self) -> bool {
        matches!(self, Self::GetCapabilities)
    }

    const fn canonical(self) -> &'static str {
        match self {
            Self::GetCapabilities => "GETCAPABILITIES",
            Self::GetMap => "GETMAP",
            Self::GetFeatureInfo => "GETFEATUREINFO",
            Self::DescribeLayer => "DESCRIBELAYER",
            Self::GetLegendGraphic => "GETLEGENDGRAPHIC",
            Self::GetFeature => "GETFEATURE",
            Self::DescribeFeatureType => "DESCRIBEFEATURETYPE",
            Self::Transaction => "TRANSACTION",
            Self::GetCoverage => "GETCOVERAGE",
            Self::DescribeCoverage => "DESCRIBECOVERAGE",
            Self::Execute => "EXECUTE",
            Self::DescribeProcess => "DESCRIBEPROCESS",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl FromStr for Operation {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = [
            Self::GetCapabilities,
            Self::GetMap,
            Self::GetFeatureInfo,
            Self::DescribeLayer,
            Self::GetLegendGraphic,
            Self::GetFeature,
            Self::DescribeFeatureType,
            Self::Transaction,
            Self::GetCoverage,
            Self::DescribeCoverage,
            Self::Execute,
            Self::DescribeProcess,
        ];
        let upper = s.to_ascii_uppercase();
        all.into_iter()
            .find(|op| op.canonical() == upper)
            .ok_or_else(|| UnknownNameError {
                what: "operation",
                value: s.to_owned(),
            })
    }
}

/// The fixed denial message for an operation family.
///
/// Callers present this text verbatim, so the set of possible strings is
/// closed over [`Operation`]: `"<OPERATION> request denied"`.
#[must_use]
pub fn denial_message(operation: Operation) -> String {
    format!("{operation} request denied")
}

/// A normalized inbound request.
///
/// Produced by an external protocol parser; immutable; the engine never
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwsRequest {
    /// Target service family.
    pub service: ServiceKind,
    /// Requested operation.
    pub operation: Operation,
    /// Protocol version named by the request.
    pub version: Version,
    /// Named resources (layers, coverages, feature types, processes).
    /// Empty for listing requests such as capabilities.
    #[serde(default)]
    pub resources: Vec<String>,
    /// The configured service instance this request addresses.
    pub service_name: String,
    /// Extra request parameters, multi-valued per key.
    #[serde(default)]
    pub extra_params: HashMap<String, Vec<String>>,
}

impl OwsRequest {
    /// Create a request with no resources and no extra parameters.
    #[must_use]
    pub fn new(
        service: ServiceKind,
        operation: Operation,
        version: Version,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            service,
            operation,
            version,
            resources: Vec::new(),
            service_name: service_name.into(),
            extra_params: HashMap::new(),
        }
    }

    /// Add requested resource names.
    #[must_use]
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }
}

/// An immutable grant held by a principal.
///
/// A permission binds a service family, an operation, a version range and
/// an optional resource name to the upstream endpoint serving them.
/// `resource: None` matches any resource, including listing requests that
/// name none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    /// Granted service family.
    pub service: ServiceKind,
    /// Granted operation.
    pub operation: Operation,
    /// Protocol versions this grant covers.
    pub versions: VersionRange,
    /// Resource constraint; `None` matches any resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// The configured service instance this grant applies to.
    pub service_name: String,
    /// Upstream endpoint requests are forwarded to.
    pub endpoint: Url,
    /// Parameters the gateway forces onto forwarded requests.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra_params: HashMap<String, Vec<String>>,
}

impl Permission {
    /// Create a wildcard-resource permission.
    #[must_use]
    pub fn new(
        service: ServiceKind,
        operation: Operation,
        versions: VersionRange,
        service_name: impl Into<String>,
        endpoint: Url,
    ) -> Self {
        Self {
            service,
            operation,
            versions,
            resource: None,
            service_name: service_name.into(),
            endpoint,
            extra_params: HashMap::new(),
        }
    }

    /// Constrain this grant to a single resource name.
    #[must_use]
    pub fn for_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Add a forced parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.extra_params.insert(key.into(), values);
        self
    }
}

/// The outcome of one authorization decision.
///
/// Created once per decision call and read-only afterward. Denial is a
/// normal report with `authorized: false`, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationReport {
    /// Whether the request as a whole is allowed.
    pub authorized: bool,
    /// Denial message from the fixed per-operation set; `None` when
    /// authorized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Upstream endpoint taken from the first matching permission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Url>,
    /// Union of forced parameters from all matching permissions.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra_params: HashMap<String, Vec<String>>,
    /// Resource names the principal must not see in a capabilities
    /// listing. Empty for non-listing operations.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub denied_resources: BTreeSet<String>,
}

impl AuthorizationReport {
    /// A denial report carrying the operation family's fixed message.
    #[must_use]
    pub fn denied(operation: Operation) -> Self {
        Self {
            authorized: false,
            message: Some(denial_message(operation)),
            endpoint: None,
            extra_params: HashMap::new(),
            denied_resources: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("http://upstream.example/wms").unwrap()
    }

    #[test]
    fn service_kind_parses_case_insensitively() {
        assert_eq!("wms".parse::<ServiceKind>().unwrap(), ServiceKind::Wms);
        assert_eq!("WFS".parse::<ServiceKind>().unwrap(), ServiceKind::Wfs);
        assert!("wmts".parse::<ServiceKind>().is_err());
    }

    #[test]
    fn operation_parses_canonical_and_mixed_case() {
        assert_eq!(
            "GetCapabilities".parse::<Operation>().unwrap(),
            Operation::GetCapabilities
        );
        assert_eq!("GETMAP".parse::<Operation>().unwrap(), Operation::GetMap);
        assert_eq!("execute".parse::<Operation>().unwrap(), Operation::Execute);
        assert!("GetTile".parse::<Operation>().is_err());
    }

    #[test]
    fn denial_messages_are_fixed_per_operation() {
        assert_eq!(denial_message(Operation::GetMap), "GETMAP request denied");
        assert_eq!(
            denial_message(Operation::GetCoverage),
            "GETCOVERAGE request denied"
        );
        assert_eq!(
            denial_message(Operation::GetCapabilities),
            "GETCAPABILITIES request denied"
        );
    }

    #[test]
    fn permission_builder_sets_resource_and_params() {
        let p = Permission::new(
            ServiceKind::Wms,
            Operation::GetMap,
            ">= 1.0.0".parse().unwrap(),
            "topp",
            endpoint(),
        )
        .for_resource("roads")
        .with_param("watermark", vec!["on".to_owned()]);

        assert_eq!(p.resource.as_deref(), Some("roads"));
        assert_eq!(p.extra_params["watermark"], vec!["on"]);
    }

    #[test]
    fn permission_serde_round_trip() {
        let p = Permission::new(
            ServiceKind::Wcs,
            Operation::GetCoverage,
            "<= 1.1.1".parse().unwrap(),
            "dem",
            endpoint(),
        )
        .for_resource("elevation");

        let json = serde_json::to_string(&p).unwrap();
        let back: Permission = serde_json::from_str(&json).unwrap();
        assert_eq!(back.service, ServiceKind::Wcs);
        assert_eq!(back.operation, Operation::GetCoverage);
        assert_eq!(back.versions, p.versions);
        assert_eq!(back.resource.as_deref(), Some("elevation"));
        assert_eq!(back.endpoint, p.endpoint);
    }

    #[test]
    fn permission_deserializes_from_configuration_shape() {
        let json = r#"{
            "service": "WMS",
            "operation": "GETMAP",
            "versions": ">= 1.1.0",
            "resource": "roads",
            "service_name": "topp",
            "endpoint": "http://upstream.example/wms"
        }"#;
        let p: Permission = serde_json::from_str(json).unwrap();
        assert_eq!(p.service, ServiceKind::Wms);
        assert!(p.versions.contains(Version::new(1, 3, 0)));
        assert!(p.extra_params.is_empty());
    }

    #[test]
    fn denied_report_carries_message_and_nothing_else() {
        let report = AuthorizationReport::denied(Operation::GetFeature);
        assert!(!report.authorized);
        assert_eq!(report.message.as_deref(), Some("GETFEATURE request denied"));
        assert!(report.endpoint.is_none());
        assert!(report.extra_params.is_empty());
        assert!(report.denied_resources.is_empty());
    }
}
