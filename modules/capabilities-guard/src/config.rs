//! Guard configuration: where resources and endpoints live in each
//! service's capabilities document.
//!
//! This is data, not code. Path patterns arrive as text from any
//! configuration source and are compiled once at service construction;
//! a malformed pattern fails fast there and can never surface
//! per-request. The built-in defaults cover the standard capabilities
//! layouts of the four supported service families and can be replaced
//! wholesale.

use std::collections::HashMap;

use ows_authz::ServiceKind;
use ows_xmlfilter::{PathPattern, PathPatternError, PathStep};
use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    /// Per-service filter layouts.
    #[serde(default = "default_services")]
    pub services: Vec<ServiceGuardConfig>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            services: default_services(),
        }
    }
}

/// Filter layout for one service family.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceGuardConfig {
    /// The service family this layout applies to.
    pub service: ServiceKind,
    /// Where resource entries live and which child names them.
    #[serde(default)]
    pub resource_paths: Vec<ResourcePathConfig>,
    /// Which attributes carry upstream URLs to remap.
    #[serde(default)]
    pub endpoint_attributes: Vec<EndpointAttributeConfig>,
    /// The gateway address advertised in place of upstream URLs.
    /// When absent, endpoint attributes pass through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_endpoint: Option<Url>,
}

/// One resource-container location in a capabilities document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcePathConfig {
    /// Exact path to the container element; the last step is the
    /// element suppressed for denied resources.
    pub container: String,
    /// The child element whose text names the resource.
    pub label_child: String,
}

/// One endpoint-carrying attribute location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointAttributeConfig {
    /// Exact path to the element owning the attribute.
    pub path: String,
    /// The attribute to rewrite; absent rewrites every attribute of
    /// the matched element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

/// A service layout with all patterns compiled.
#[derive(Debug, Clone)]
pub(crate) struct CompiledService {
    pub resource_paths: Vec<(PathPattern, PathStep)>,
    pub endpoint_attributes: Vec<(PathPattern, Option<PathStep>)>,
    pub public_endpoint: Option<Url>,
}

impl GuardConfig {
    /// Compile every configured pattern.
    ///
    /// A later entry for the same service replaces an earlier one.
    ///
    /// # Errors
    ///
    /// [`PathPatternError`] for the first malformed pattern or step.
    pub(crate) fn compile(&self) -> Result<HashMap<ServiceKind, CompiledService>, PathPatternError> {
        let mut compiled = HashMap::new();
        for service in &self.services {
            let resource_paths: Vec<(PathPattern, PathStep)> = service
                .resource_paths
                .iter()
                .map(|rule| Ok((rule.container.parse()?, rule.label_child.parse()?)))
                .collect::<Result<_, PathPatternError>>()?;
            let endpoint_attributes: Vec<(PathPattern, Option<PathStep>)> = service
                .endpoint_attributes
                .iter()
                .map(|rule| {
                    Ok((
                        rule.path.parse()?,
                        rule.attribute
                            .as_deref()
                            .map(str::parse::<PathStep>)
                            .transpose()?,
                    ))
                })
                .collect::<Result<_, PathPatternError>>()?;
            compiled.insert(
                service.service,
                CompiledService {
                    resource_paths,
                    endpoint_attributes,
                    public_endpoint: service.public_endpoint.clone(),
                },
            );
        }
        Ok(compiled)
    }
}

/// Resource containers in the standard capabilities layouts.
///
/// Steps carry no prefixes: an unprefixed step matches any prefix, which
/// covers both plain and namespace-qualified documents.
const WMS_RESOURCE_PATHS: &[(&str, &str)] = &[
    // WMS 1.1.x - the root layer wraps the named layers.
    ("WMT_MS_Capabilities/Capability/Layer/Layer", "Name"),
    // WMS 1.3.x.
    ("WMS_Capabilities/Capability/Layer/Layer", "Name"),
];

const WCS_RESOURCE_PATHS: &[(&str, &str)] = &[
    // WCS 1.0.
    (
        "WCS_Capabilities/ContentMetadata/CoverageOfferingBrief",
        "name",
    ),
    // WCS 1.1.
    ("Capabilities/Contents/CoverageSummary", "Identifier"),
];

const WFS_RESOURCE_PATHS: &[(&str, &str)] =
    &[("WFS_Capabilities/FeatureTypeList/FeatureType", "Name")];

const WPS_RESOURCE_PATHS: &[(&str, &str)] =
    &[("Capabilities/ProcessOfferings/Process", "Identifier")];

const WMS_ENDPOINT_ATTRIBUTES: &[&str] = &[
    "WMT_MS_Capabilities/Service/OnlineResource",
    "WMT_MS_Capabilities/Capability/Request/GetCapabilities/DCPType/HTTP/Get/OnlineResource",
    "WMT_MS_Capabilities/Capability/Request/GetMap/DCPType/HTTP/Get/OnlineResource",
    "WMT_MS_Capabilities/Capability/Request/GetFeatureInfo/DCPType/HTTP/Get/OnlineResource",
    "WMS_Capabilities/Service/OnlineResource",
    "WMS_Capabilities/Capability/Request/GetCapabilities/DCPType/HTTP/Get/OnlineResource",
    "WMS_Capabilities/Capability/Request/GetMap/DCPType/HTTP/Get/OnlineResource",
];

const WCS_ENDPOINT_ATTRIBUTES: &[&str] = &[
    "WCS_Capabilities/Capability/Request/GetCapabilities/DCPType/HTTP/Get/OnlineResource",
    "WCS_Capabilities/Capability/Request/DescribeCoverage/DCPType/HTTP/Get/OnlineResource",
    "WCS_Capabilities/Capability/Request/GetCoverage/DCPType/HTTP/Get/OnlineResource",
    "Capabilities/OperationsMetadata/Operation/DCP/HTTP/Get",
    "Capabilities/OperationsMetadata/Operation/DCP/HTTP/Post",
];

const WFS_ENDPOINT_ATTRIBUTES: &[&str] = &[
    "WFS_Capabilities/OperationsMetadata/Operation/DCP/HTTP/Get",
    "WFS_Capabilities/OperationsMetadata/Operation/DCP/HTTP/Post",
];

const WPS_ENDPOINT_ATTRIBUTES: &[&str] = &[
    "Capabilities/OperationsMetadata/Operation/DCP/HTTP/Get",
    "Capabilities/OperationsMetadata/Operation/DCP/HTTP/Post",
];

fn service_defaults(
    service: ServiceKind,
    resource_paths: &[(&str, &str)],
    endpoint_attributes: &[&str],
) -> ServiceGuardConfig {
    ServiceGuardConfig {
        service,
        resource_paths: resource_paths
            .iter()
            .map(|(container, label_child)| ResourcePathConfig {
                container: (*container).to_owned(),
                label_child: (*label_child).to_owned(),
            })
            .collect(),
        endpoint_attributes: endpoint_attributes
            .iter()
            .map(|path| EndpointAttributeConfig {
                path: (*path).to_owned(),
                attribute: Some("xlink:href".to_owned()),
            })
            .collect(),
        public_endpoint: None,
    }
}

fn default_services() -> Vec<ServiceGuardConfig> {
    vec![
        service_defaults(ServiceKind::Wms, WMS_RESOURCE_PATHS, WMS_ENDPOINT_ATTRIBUTES),
        service_defaults(ServiceKind::Wcs, WCS_RESOURCE_PATHS, WCS_ENDPOINT_ATTRIBUTES),
        service_defaults(ServiceKind::Wfs, WFS_RESOURCE_PATHS, WFS_ENDPOINT_ATTRIBUTES),
        service_defaults(ServiceKind::Wps, WPS_RESOURCE_PATHS, WPS_ENDPOINT_ATTRIBUTES),
    ]
}
