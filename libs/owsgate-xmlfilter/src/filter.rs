//! The single-pass streaming document filter.
//!
//! Copies events from a [`LookaheadEventReader`] to an output writer,
//! dropping suppressed subtrees and rewriting attribute values on the
//! way. The document is never buffered as a whole: the only state is
//! the open-element stack and whatever the lookahead queued.

use std::io::{BufRead, Write};

use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};

use crate::attributes::{AttributeModifier, KeepAll};
use crate::decision::{AcceptAll, DecisionMaker};
use crate::error::FilterError;
use crate::lookahead::LookaheadEventReader;
use crate::path::ElementName;

/// A streaming filter pass over one document.
///
/// The decision maker and attribute modifier are immutable, compiled
/// configuration; one filter value can serve any number of sequential
/// passes deterministically.
#[derive(Debug, Clone)]
pub struct DocumentFilter<D, A> {
    decision: D,
    attributes: A,
}

impl DocumentFilter<AcceptAll, KeepAll> {
    /// A filter that reproduces its input unchanged.
    #[must_use]
    pub fn passthrough() -> Self {
        Self::new(AcceptAll, KeepAll)
    }
}

impl<D: DecisionMaker, A: AttributeModifier> DocumentFilter<D, A> {
    /// Combine a suppression decision maker with an attribute modifier.
    pub fn new(decision: D, attributes: A) -> Self {
        Self {
            decision,
            attributes,
        }
    }

    /// Filter `source` into `sink` with default parser configuration.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn filter<R: BufRead, W: Write>(&self, source: R, sink: W) -> Result<(), FilterError> {
        let reader = LookaheadEventReader::from_reader(source);
        let mut writer = Writer::new(sink);
        self.run(reader, &mut writer)
    }

    /// Drive one filter pass to the end of the document.
    ///
    /// # Errors
    ///
    /// - [`FilterError::Xml`] when the parser rejects the document
    /// - [`FilterError::Corrupt`] on unbalanced start/end events or a
    ///   premature end of document
    /// - [`FilterError::Io`] when the sink fails
    ///
    /// Any error aborts the pass; the partial output must be discarded,
    /// never served.
    pub fn run<R: BufRead, W: Write>(
        &self,
        mut reader: LookaheadEventReader<R>,
        writer: &mut Writer<W>,
    ) -> Result<(), FilterError> {
        let mut open_path: Vec<ElementName> = Vec::new();
        loop {
            match reader.next_event()? {
                Event::Start(start) => {
                    if self.decision.ignore(&mut reader, &start, &open_path)? {
                        skip_subtree(&mut reader)?;
                    } else {
                        let name = ElementName::from_qname(start.name())?;
                        let start = self.rewrite(&mut reader, start, &open_path)?;
                        writer.write_event(Event::Start(start))?;
                        open_path.push(name);
                    }
                }
                Event::Empty(start) => {
                    // An empty element cannot carry a label child, so it
                    // is never suppressed; it opens nothing either.
                    let start = self.rewrite(&mut reader, start, &open_path)?;
                    writer.write_event(Event::Empty(start))?;
                }
                Event::End(end) => {
                    if open_path.pop().is_none() {
                        return Err(FilterError::corrupt(
                            "end tag without a matching open element",
                        ));
                    }
                    writer.write_event(Event::End(end))?;
                }
                Event::Eof => {
                    if let Some(unclosed) = open_path.last() {
                        return Err(FilterError::corrupt(format!(
                            "document ended with <{unclosed}> still open"
                        )));
                    }
                    return Ok(());
                }
                other => writer.write_event(other)?,
            }
        }
    }

    /// Apply attribute rules to a start (or empty-element) tag.
    ///
    /// The tag is rebuilt only when a rule actually replaced something,
    /// so untouched markup keeps its original bytes.
    fn rewrite<R: BufRead>(
        &self,
        reader: &mut LookaheadEventReader<R>,
        start: BytesStart<'static>,
        open_path: &[ElementName],
    ) -> Result<BytesStart<'static>, FilterError> {
        let mut replacements: Vec<(usize, String)> = Vec::new();
        for (index, attr) in start.attributes().enumerate() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if let Some(value) =
                self.attributes
                    .value_for(reader, &start, attr.key, open_path)?
            {
                replacements.push((index, value.to_owned()));
            }
        }
        if replacements.is_empty() {
            return Ok(start);
        }

        let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
        let mut rebuilt = BytesStart::new(name);
        for (index, attr) in start.attributes().enumerate() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if let Some((_, value)) = replacements.iter().find(|(at, _)| *at == index) {
                rebuilt.push_attribute(Attribute {
                    key: attr.key,
                    value: escape(value.as_str()).into_owned().into_bytes().into(),
                });
            } else {
                rebuilt.push_attribute(attr);
            }
        }
        Ok(rebuilt)
    }
}

/// Discard events up to and including the end of the current element.
///
/// A plain nesting counter keeps the skip depth-generic: same-named
/// nested elements are handled without recursion, bounding stack usage
/// regardless of document depth.
fn skip_subtree<R: BufRead>(reader: &mut LookaheadEventReader<R>) -> Result<(), FilterError> {
    let mut depth = 0usize;
    loop {
        match reader.next_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(FilterError::corrupt(
                    "document ended inside a suppressed subtree",
                ));
            }
            _ => {}
        }
    }
}
