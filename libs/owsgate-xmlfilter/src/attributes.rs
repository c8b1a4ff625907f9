//! Attribute rewriting for the streaming filter.
//!
//! Capabilities documents advertise upstream service URLs in attributes
//! (`OnlineResource xlink:href`, mostly). The gateway must replace them
//! with its own public endpoint so clients never learn the protected
//! address. An [`AttributeModifier`] is consulted per attribute of every
//! kept start element; the static variant substitutes configured values
//! on configured paths.

use std::io::BufRead;

use quick_xml::events::BytesStart;
use quick_xml::name::QName;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::lookahead::LookaheadEventReader;
use crate::path::{ElementName, PathPattern, PathStep};

/// Decides, per attribute of a kept element, a replacement value.
///
/// `None` keeps the original value. The reader is positioned just after
/// `start`; implementations may look ahead without disturbing the
/// stream.
pub trait AttributeModifier {
    /// The replacement value for `attribute`, if any.
    ///
    /// # Errors
    ///
    /// Lookahead failures ([`FilterError`]) abort the filter pass.
    fn value_for<R: BufRead>(
        &self,
        reader: &mut LookaheadEventReader<R>,
        start: &BytesStart<'_>,
        attribute: QName<'_>,
        open_path: &[ElementName],
    ) -> Result<Option<&str>, FilterError>;
}

/// No-op modifier: every attribute keeps its value.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl AttributeModifier for KeepAll {
    fn value_for<R: BufRead>(
        &self,
        _reader: &mut LookaheadEventReader<R>,
        _start: &BytesStart<'_>,
        _attribute: QName<'_>,
        _open_path: &[ElementName],
    ) -> Result<Option<&str>, FilterError> {
        Ok(None)
    }
}

/// One attribute-rewrite rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeRule {
    /// Exact path to the element owning the attribute.
    pub path: PathPattern,
    /// The attribute to rewrite; `None` rewrites every attribute of the
    /// matched element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<PathStep>,
    /// The substituted value.
    pub value: String,
}

/// Substitutes fixed values on configured element paths. The first
/// matching rule wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticAttributeModifier {
    rules: Vec<AttributeRule>,
}

impl StaticAttributeModifier {
    /// Build from an ordered rule list.
    #[must_use]
    pub fn new(rules: Vec<AttributeRule>) -> Self {
        Self { rules }
    }

    /// The configured rules.
    #[must_use]
    pub fn rules(&self) -> &[AttributeRule] {
        &self.rules
    }
}

impl AttributeModifier for StaticAttributeModifier {
    fn value_for<R: BufRead>(
        &self,
        _reader: &mut LookaheadEventReader<R>,
        start: &BytesStart<'_>,
        attribute: QName<'_>,
        open_path: &[ElementName],
    ) -> Result<Option<&str>, FilterError> {
        if self.rules.is_empty() {
            return Ok(None);
        }
        let owner = ElementName::from_qname(start.name())?;
        for rule in &self.rules {
            if !rule.path.matches_child(open_path, &owner) {
                continue;
            }
            if rule
                .attribute
                .as_ref()
                .is_none_or(|step| step.matches_qname(attribute))
            {
                tracing::debug!(
                    element = %owner,
                    attribute = %String::from_utf8_lossy(attribute.as_ref()),
                    "rewriting endpoint attribute"
                );
                return Ok(Some(&rule.value));
            }
        }
        Ok(None)
    }
}
