//! Suppression decisions for the streaming filter.
//!
//! A [`DecisionMaker`] is consulted once per start-element event and
//! answers whether the element's whole subtree must be dropped from the
//! output. The one production variant is the blacklist: a container is
//! dropped when the text of its labelling child names a denied resource.
//! The trait leaves room for future variants (a whitelist, for one)
//! without a class hierarchy.

use std::collections::BTreeSet;
use std::io::BufRead;

use quick_xml::events::BytesStart;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::lookahead::LookaheadEventReader;
use crate::path::{ElementName, PathPattern, PathStep};

/// Decides, per start-element event, whether its subtree is suppressed.
///
/// The reader is positioned just after `start`; implementations may use
/// its lookahead to inspect descendant content without disturbing the
/// event stream.
pub trait DecisionMaker {
    /// `true` drops the element and everything below it.
    ///
    /// # Errors
    ///
    /// Lookahead failures ([`FilterError`]) abort the filter pass.
    fn ignore<R: BufRead>(
        &self,
        reader: &mut LookaheadEventReader<R>,
        start: &BytesStart<'_>,
        open_path: &[ElementName],
    ) -> Result<bool, FilterError>;
}

/// Pass-through decision maker: nothing is ever suppressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl DecisionMaker for AcceptAll {
    fn ignore<R: BufRead>(
        &self,
        _reader: &mut LookaheadEventReader<R>,
        _start: &BytesStart<'_>,
        _open_path: &[ElementName],
    ) -> Result<bool, FilterError> {
        Ok(false)
    }
}

/// One blacklist rule: where resource containers live and which child
/// names them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistRule {
    /// Exact path to the container element; the last step is the
    /// element that gets suppressed.
    pub container: PathPattern,
    /// The descendant whose text identifies the resource.
    pub label_child: PathStep,
    /// Resource names to suppress.
    pub blacklist: BTreeSet<String>,
}

/// Suppresses resource containers whose label text is blacklisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlacklistDecisionMaker {
    rules: Vec<BlacklistRule>,
}

impl BlacklistDecisionMaker {
    /// Build from an ordered rule list; the first rule whose container
    /// path matches an element decides it.
    #[must_use]
    pub fn new(rules: Vec<BlacklistRule>) -> Self {
        Self { rules }
    }

    /// The configured rules.
    #[must_use]
    pub fn rules(&self) -> &[BlacklistRule] {
        &self.rules
    }
}

impl DecisionMaker for BlacklistDecisionMaker {
    fn ignore<R: BufRead>(
        &self,
        reader: &mut LookaheadEventReader<R>,
        start: &BytesStart<'_>,
        open_path: &[ElementName],
    ) -> Result<bool, FilterError> {
        let name = ElementName::from_qname(start.name())?;
        for rule in &self.rules {
            if !rule.container.matches_child(open_path, &name) {
                continue;
            }
            let Some(label) = reader.find_descendant_text(&rule.label_child)? else {
                // No label child: nothing identifies the resource.
                return Ok(false);
            };
            // Surrounding whitespace in the label is formatting, not
            // identity.
            let suppress = rule.blacklist.contains(label.trim());
            if suppress {
                tracing::debug!(
                    element = %name,
                    resource = %label.trim(),
                    "suppressing blacklisted resource element"
                );
            }
            return Ok(suppress);
        }
        Ok(false)
    }
}
