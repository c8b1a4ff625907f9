//! Element names, path steps and path patterns.
//!
//! A path pattern is an ordered sequence of qualified-name steps
//! describing one exact location in a document's nesting structure, e.g.
//! `WMT_MS_Capabilities/Capability/Layer/Layer`. Namespace identity is
//! the *prefix*: a single-pass filter replays buffered events without
//! their namespace scopes, and capabilities documents bind stable
//! prefixes, so URI resolution is deliberately out of scope. A step
//! without a prefix matches any prefix.

use std::fmt;
use std::str::FromStr;

use quick_xml::name::QName;
use serde::{Deserialize, Serialize};

/// Error compiling a path pattern or step from text.
///
/// Raised at configuration time only; per-request matching never parses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathPatternError {
    /// The pattern text contains no steps.
    #[error("path pattern is empty")]
    Empty,

    /// A step has an empty local name or an empty prefix.
    #[error("path pattern step {0:?} is malformed")]
    MalformedStep(String),
}

/// The qualified name of an element as it appears in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementName {
    prefix: Option<String>,
    local: String,
}

impl ElementName {
    /// Split a raw qualified name into prefix and local part.
    ///
    /// # Errors
    ///
    /// [`std::str::Utf8Error`] when the name bytes are not UTF-8.
    pub fn from_qname(name: QName<'_>) -> Result<Self, std::str::Utf8Error> {
        let local = std::str::from_utf8(name.local_name().as_ref())?.to_owned();
        let prefix = name
            .prefix()
            .map(|p| std::str::from_utf8(p.as_ref()).map(str::to_owned))
            .transpose()?;
        Ok(Self { prefix, local })
    }

    /// The local part of the name.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// The namespace prefix, if the name carries one.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// One step of a path pattern: an optionally prefixed local name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathStep {
    prefix: Option<String>,
    local: String,
}

impl PathStep {
    /// A step matching the local name under any prefix.
    #[must_use]
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    /// A step bound to one prefix.
    #[must_use]
    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    /// Whether this step matches an element name.
    #[must_use]
    pub fn matches(&self, name: &ElementName) -> bool {
        self.local == name.local
            && self
                .prefix
                .as_deref()
                .is_none_or(|prefix| name.prefix() == Some(prefix))
    }

    /// Byte-level match against a raw qualified name, avoiding
    /// allocation on the per-event path.
    #[must_use]
    pub fn matches_qname(&self, name: QName<'_>) -> bool {
        self.local.as_bytes() == name.local_name().as_ref()
            && match &self.prefix {
                None => true,
                Some(prefix) => name
                    .prefix()
                    .is_some_and(|p| p.as_ref() == prefix.as_bytes()),
            }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

impl FromStr for PathStep {
    type Err = PathPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PathPatternError::MalformedStep(s.to_owned());
        match s.split_once(':') {
            Some((prefix, local)) => {
                if prefix.is_empty() || local.is_empty() || local.contains(':') {
                    return Err(malformed());
                }
                Ok(Self::prefixed(prefix, local))
            }
            None => {
                if s.is_empty() {
                    return Err(malformed());
                }
                Ok(Self::new(s))
            }
        }
    }
}

impl TryFrom<String> for PathStep {
    type Error = PathPatternError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PathStep> for String {
    fn from(step: PathStep) -> Self {
        step.to_string()
    }
}

/// An exact path of steps from the document root to one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathPattern {
    steps: Vec<PathStep>,
}

impl PathPattern {
    /// Build a pattern from pre-parsed steps.
    ///
    /// # Errors
    ///
    /// [`PathPatternError::Empty`] for an empty step list.
    pub fn from_steps(steps: Vec<PathStep>) -> Result<Self, PathPatternError> {
        if steps.is_empty() {
            return Err(PathPatternError::Empty);
        }
        Ok(Self { steps })
    }

    /// The pattern's steps, root first.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// The final step: the element the pattern addresses.
    #[must_use]
    pub fn leaf(&self) -> &PathStep {
        // from_steps rejects empty patterns
        &self.steps[self.steps.len() - 1]
    }

    /// Whether `path` (root first) matches this pattern exactly:
    /// equal length and every pair of steps matching.
    #[must_use]
    pub fn matches(&self, path: &[ElementName]) -> bool {
        self.steps.len() == path.len()
            && self.steps.iter().zip(path).all(|(step, name)| step.matches(name))
    }

    /// Whether `open_path` plus `leaf` matches this pattern, without
    /// materializing the combined path.
    #[must_use]
    pub fn matches_child(&self, open_path: &[ElementName], leaf: &ElementName) -> bool {
        self.steps.len() == open_path.len() + 1
            && self.leaf().matches(leaf)
            && self
                .steps
                .iter()
                .zip(open_path)
                .all(|(step, name)| step.matches(name))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for step in &self.steps {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for PathPattern {
    type Err = PathPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathPatternError::Empty);
        }
        let steps = s
            .split('/')
            .map(str::parse)
            .collect::<Result<Vec<PathStep>, _>>()?;
        Self::from_steps(steps)
    }
}

impl TryFrom<String> for PathPattern {
    type Error = PathPatternError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PathPattern> for String {
    fn from(pattern: PathPattern) -> Self {
        pattern.to_string()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn name(text: &str) -> ElementName {
        match text.split_once(':') {
            Some((prefix, local)) => ElementName {
                prefix: Some(prefix.to_owned()),
                local: local.to_owned(),
            },
            None => ElementName {
                prefix: None,
                local: text.to_owned(),
            },
        }
    }

    fn path(names: &[&str]) -> Vec<ElementName> {
        names.iter().map(|n| name(n)).collect()
    }

    #[test]
    fn parses_plain_and_prefixed_steps() {
        let pattern: PathPattern = "wps:Capabilities/wps:ProcessOfferings/Process"
            .parse()
            .unwrap();
        assert_eq!(pattern.steps().len(), 3);
        assert_eq!(pattern.steps()[0], PathStep::prefixed("wps", "Capabilities"));
        assert_eq!(pattern.leaf(), &PathStep::new("Process"));
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert_eq!("".parse::<PathPattern>(), Err(PathPatternError::Empty));
        assert!(matches!(
            "a//b".parse::<PathPattern>(),
            Err(PathPatternError::MalformedStep(_))
        ));
        assert!(matches!(
            "a/:b".parse::<PathPattern>(),
            Err(PathPatternError::MalformedStep(_))
        ));
        assert!(matches!(
            "a/b:/c".parse::<PathPattern>(),
            Err(PathPatternError::MalformedStep(_))
        ));
        assert!(matches!(
            "a/x:y:z".parse::<PathPattern>(),
            Err(PathPatternError::MalformedStep(_))
        ));
    }

    #[test]
    fn exact_match_requires_equal_length() {
        let pattern: PathPattern = "Capabilities/Layer".parse().unwrap();
        assert!(pattern.matches(&path(&["Capabilities", "Layer"])));
        assert!(!pattern.matches(&path(&["Capabilities"])));
        assert!(!pattern.matches(&path(&["Capabilities", "Layer", "Layer"])));
    }

    #[test]
    fn unprefixed_step_matches_any_prefix() {
        let pattern: PathPattern = "Capabilities/Layer".parse().unwrap();
        assert!(pattern.matches(&path(&["wms:Capabilities", "Layer"])));
        assert!(pattern.matches(&path(&["Capabilities", "wms:Layer"])));
    }

    #[test]
    fn prefixed_step_requires_the_prefix() {
        let pattern: PathPattern = "wms:Capabilities/Layer".parse().unwrap();
        assert!(pattern.matches(&path(&["wms:Capabilities", "Layer"])));
        assert!(!pattern.matches(&path(&["Capabilities", "Layer"])));
        assert!(!pattern.matches(&path(&["ows:Capabilities", "Layer"])));
    }

    #[test]
    fn matches_child_appends_the_leaf() {
        let pattern: PathPattern = "Capabilities/Capability/Layer".parse().unwrap();
        assert!(pattern.matches_child(&path(&["Capabilities", "Capability"]), &name("Layer")));
        assert!(!pattern.matches_child(&path(&["Capabilities"]), &name("Layer")));
        assert!(!pattern.matches_child(
            &path(&["Capabilities", "Capability", "Layer"]),
            &name("Layer")
        ));
        assert!(!pattern.matches_child(&path(&["Capabilities", "Capability"]), &name("Name")));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for text in ["Layer", "a/b/c", "wms:Capabilities/Capability/wms:Layer"] {
            let pattern: PathPattern = text.parse().unwrap();
            assert_eq!(pattern.to_string(), text);
            assert_eq!(text.parse::<PathPattern>().unwrap(), pattern);
        }
    }

    #[test]
    fn serde_uses_the_textual_form() {
        let pattern: PathPattern = "wms:Capabilities/Layer".parse().unwrap();
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, "\"wms:Capabilities/Layer\"");
        let back: PathPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pattern);

        assert!(serde_json::from_str::<PathPattern>("\"a//b\"").is_err());
    }
}
