#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Single-pass streaming XML filter for the OWS gateway.
//!
//! Rewrites a capabilities document on its way to the client so that
//! only permitted resources and remapped service endpoints are visible,
//! without ever buffering the whole document:
//!
//! - [`PathPattern`], [`PathStep`], [`ElementName`] - exact paths into
//!   the document's nesting structure
//! - [`LookaheadEventReader`] - forward-only event source with
//!   loss-free FIFO lookahead
//! - [`DecisionMaker`] / [`BlacklistDecisionMaker`] - per-element
//!   suppression decisions
//! - [`AttributeModifier`] / [`StaticAttributeModifier`] - attribute
//!   value substitution
//! - [`DocumentFilter`] - the copy loop tying them together
//!
//! ## Usage
//!
//! ```
//! use std::collections::BTreeSet;
//! use ows_xmlfilter::{
//!     BlacklistDecisionMaker, BlacklistRule, DocumentFilter, KeepAll, PathStep,
//! };
//!
//! let decision = BlacklistDecisionMaker::new(vec![BlacklistRule {
//!     container: "Capability/Layer".parse()?,
//!     label_child: PathStep::new("Name"),
//!     blacklist: BTreeSet::from(["water".to_owned()]),
//! }]);
//!
//! let filter = DocumentFilter::new(decision, KeepAll);
//! let mut out = Vec::new();
//! filter.filter(
//!     "<Capability><Layer><Name>water</Name></Layer></Capability>".as_bytes(),
//!     &mut out,
//! )?;
//! assert_eq!(out, b"<Capability></Capability>");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod attributes;
pub mod decision;
pub mod error;
pub mod filter;
pub mod lookahead;
pub mod path;

// Re-export main types at crate root
pub use attributes::{AttributeModifier, AttributeRule, KeepAll, StaticAttributeModifier};
pub use decision::{AcceptAll, BlacklistDecisionMaker, BlacklistRule, DecisionMaker};
pub use error::FilterError;
pub use filter::DocumentFilter;
pub use lookahead::LookaheadEventReader;
pub use path::{ElementName, PathPattern, PathPatternError, PathStep};
