//! OGC service version numbers and version-range constraints.
//!
//! Permissions do not grant a single protocol version; they grant a range
//! expressed as an operator plus a boundary version (`"<= 1.1.1"`,
//! `">= 2.0.0"`, or a bare `"1.3.0"` meaning exact equality). Both the
//! version and the range are plain value types; containment is a pure
//! function of the three-part ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error building a [`Version`] or [`VersionRange`] from text.
///
/// Raised at configuration/load time only; a constructed range can never
/// fail at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    /// The expression neither starts with a comparison operator nor with
    /// a digit.
    #[error("version range {0:?} has no operator prefix and no leading digit")]
    UnrecognizedExpression(String),

    /// The numeric portion is not exactly three dot-separated
    /// non-negative integers.
    #[error("invalid version number {0:?}: expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),
}

/// A three-part OGC protocol version (`major.minor.patch`).
///
/// Ordering is the standard tuple ordering: major first, then minor,
/// then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl Version {
    /// Create a version from its three components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionParseError::InvalidVersion(s.to_owned());

        let mut parts = s.trim().split('.');
        let component = |p: Option<&str>| -> Result<u32, VersionParseError> {
            let text = p.ok_or_else(invalid)?;
            // `u32::from_str` accepts a leading `+`; version components
            // are bare digit runs.
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            text.parse().map_err(|_| invalid())
        };

        let version = Self {
            major: component(parts.next())?,
            minor: component(parts.next())?,
            patch: component(parts.next())?,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

/// The comparison kind of a [`VersionRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionLimit {
    /// Strictly below the boundary.
    Lt,
    /// At or below the boundary.
    Le,
    /// Strictly above the boundary.
    Gt,
    /// At or above the boundary.
    Ge,
    /// Exactly the boundary.
    Eq,
}

impl VersionLimit {
    /// The textual operator used in range expressions (`Eq` renders as
    /// the bare version, so its operator is empty).
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "",
        }
    }
}

/// A version constraint: an operator plus a boundary version.
///
/// Immutable once constructed. `contains` is pure and total: any
/// candidate version yields `true` or `false`, never an error.
///
/// ## Expression grammar
///
/// `"< 1.2.0"`, `"<= 1.2.0"`, `"> 1.2.0"`, `">= 1.2.0"`, `"= 1.2.0"`,
/// or a bare `"1.2.0"` (equality). Whitespace around the operator is
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    limit: VersionLimit,
    version: Version,
}

impl VersionRange {
    /// Create a range from an explicit kind and boundary.
    #[must_use]
    pub const fn new(limit: VersionLimit, version: Version) -> Self {
        Self { limit, version }
    }

    /// Range containing exactly one version.
    #[must_use]
    pub const fn exact(version: Version) -> Self {
        Self::new(VersionLimit::Eq, version)
    }

    /// The comparison kind.
    #[must_use]
    pub const fn limit(&self) -> VersionLimit {
        self.limit
    }

    /// The boundary version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Whether `candidate` satisfies this constraint.
    #[must_use]
    pub fn contains(&self, candidate: Version) -> bool {
        match candidate.cmp(&self.version) {
            Ordering::Greater => matches!(self.limit, VersionLimit::Gt | VersionLimit::Ge),
            Ordering::Less => matches!(self.limit, VersionLimit::Lt | VersionLimit::Le),
            Ordering::Equal => matches!(
                self.limit,
                VersionLimit::Eq | VersionLimit::Ge | VersionLimit::Le
            ),
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            VersionLimit::Eq => write!(f, "{}", self.version),
            other => write!(f, "{} {}", other.operator(), self.version),
        }
    }
}

impl FromStr for VersionRange {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        // Two-character operators must be tried before their one-character
        // prefixes.
        let (limit, rest) = if let Some(rest) = expr.strip_prefix("<=") {
            (VersionLimit::Le, rest)
        } else if let Some(rest) = expr.strip_prefix(">=") {
            (VersionLimit::Ge, rest)
        } else if let Some(rest) = expr.strip_prefix('<') {
            (VersionLimit::Lt, rest)
        } else if let Some(rest) = expr.strip_prefix('>') {
            (VersionLimit::Gt, rest)
        } else if let Some(rest) = expr.strip_prefix('=') {
            (VersionLimit::Eq, rest)
        } else if expr.starts_with(|c: char| c.is_ascii_digit()) {
            (VersionLimit::Eq, expr)
        } else {
            return Err(VersionParseError::UnrecognizedExpression(s.to_owned()));
        };

        Ok(Self::new(limit, rest.trim().parse()?))
    }
}

impl TryFrom<String> for VersionRange {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VersionRange> for String {
    fn from(r: VersionRange) -> Self {
        r.to_string()
    }
}
