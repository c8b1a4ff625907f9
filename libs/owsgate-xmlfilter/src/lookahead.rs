//! Loss-free lookahead over a forward-only XML event stream.
//!
//! Suppression decisions depend on descendant content the filter has not
//! copied yet (a container is dropped or kept based on the text of a
//! child element). [`LookaheadEventReader`] makes that possible without
//! materializing the document: every event pulled from the underlying
//! parser during a lookahead lands in an explicit FIFO queue and is
//! replayed by [`next_event`](LookaheadEventReader::next_event) exactly
//! once, in original order, whether or not the lookahead's answer is
//! acted upon.
//!
//! The queue is per-invocation state owned by one filter pass; it is
//! never shared across requests.

use std::collections::VecDeque;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::FilterError;
use crate::path::PathStep;

/// What the subtree scan found at one buffered event.
enum Scan {
    /// A non-matching child opens; descend.
    Descend,
    /// A subtree below the scan root closes; ascend.
    Ascend,
    /// The scanned element itself closes: the child is not there.
    SubtreeClosed,
    /// The matching child opens; its text starts at the given queue
    /// index.
    CollectFrom(usize),
    /// The matching child is an empty element: it has no text.
    EmptyMatch,
    /// Irrelevant event (text, comment, PI, ...).
    Skip,
    /// The document ended inside an open element.
    Eof,
}

/// A forward-only XML event source with bounded, loss-free lookahead.
pub struct LookaheadEventReader<R: BufRead> {
    reader: Reader<R>,
    queue: VecDeque<Event<'static>>,
    scratch: Vec<u8>,
}

impl<R: BufRead> LookaheadEventReader<R> {
    /// Wrap an already-configured parser.
    pub fn new(reader: Reader<R>) -> Self {
        Self {
            reader,
            queue: VecDeque::new(),
            scratch: Vec::new(),
        }
    }

    /// Wrap a raw byte source with default parser configuration.
    pub fn from_reader(source: R) -> Self {
        Self::new(Reader::from_reader(source))
    }

    /// The next event, preferring events buffered by an earlier
    /// lookahead, in original order, before pulling from the source.
    ///
    /// # Errors
    ///
    /// [`FilterError::Xml`] when the parser rejects the document.
    pub fn next_event(&mut self) -> Result<Event<'static>, FilterError> {
        if let Some(event) = self.queue.pop_front() {
            return Ok(event);
        }
        self.pull()
    }

    /// The next event without consuming it.
    ///
    /// # Errors
    ///
    /// [`FilterError::Xml`] when the parser rejects the document.
    pub fn peek(&mut self) -> Result<&Event<'static>, FilterError> {
        if self.queue.is_empty() {
            let event = self.pull()?;
            self.queue.push_back(event);
        }
        self.queue
            .front()
            .ok_or_else(|| FilterError::corrupt("lookahead queue drained during peek"))
    }

    /// Scan forward for a direct child element matching `child` and
    /// return its character data.
    ///
    /// Must be called just after a start-element event; the scan stays
    /// within that element's subtree (nesting is tracked, so it never
    /// escapes into a sibling or an ancestor) and only considers
    /// children opening directly below the scanned element; a
    /// same-named element nested deeper does not count. Returns
    /// `Some("")` for an empty child element and `None` when the
    /// subtree closes without the child appearing.
    ///
    /// Every event inspected stays queued and will be replayed by
    /// [`next_event`](Self::next_event) in original order.
    ///
    /// # Errors
    ///
    /// - [`FilterError::Xml`] when the parser rejects the document
    /// - [`FilterError::Corrupt`] when the document ends inside the
    ///   scanned subtree
    /// - [`FilterError::Utf8`] when the child's text is not UTF-8
    pub fn find_descendant_text(
        &mut self,
        child: &PathStep,
    ) -> Result<Option<String>, FilterError> {
        let mut depth = 0usize;
        let mut index = 0usize;
        loop {
            let scan = {
                let event = self.buffered(index)?;
                match event {
                    Event::Start(start) => {
                        if depth == 0 && child.matches_qname(start.name()) {
                            Scan::CollectFrom(index + 1)
                        } else {
                            Scan::Descend
                        }
                    }
                    Event::Empty(start) if depth == 0 && child.matches_qname(start.name()) => {
                        Scan::EmptyMatch
                    }
                    Event::End(_) => {
                        if depth == 0 {
                            Scan::SubtreeClosed
                        } else {
                            Scan::Ascend
                        }
                    }
                    Event::Eof => Scan::Eof,
                    _ => Scan::Skip,
                }
            };
            index += 1;
            match scan {
                Scan::Descend => depth += 1,
                Scan::Ascend => depth -= 1,
                Scan::SubtreeClosed => return Ok(None),
                Scan::CollectFrom(at) => return self.collect_text(at).map(Some),
                Scan::EmptyMatch => return Ok(Some(String::new())),
                Scan::Skip => {}
                Scan::Eof => {
                    return Err(FilterError::corrupt(
                        "document ended inside an open element during lookahead",
                    ));
                }
            }
        }
    }

    /// Concatenate the character data starting at queue position `index`
    /// until markup interrupts the text run. Comments and processing
    /// instructions inside the run are skipped.
    fn collect_text(&mut self, index: usize) -> Result<String, FilterError> {
        let mut text = String::new();
        let mut at = index;
        loop {
            let piece = {
                let event = self.buffered(at)?;
                match event {
                    Event::Text(t) => Some(t.unescape()?.into_owned()),
                    Event::CData(c) => Some(std::str::from_utf8(c)?.to_owned()),
                    Event::Comment(_) | Event::PI(_) => None,
                    Event::Eof => {
                        return Err(FilterError::corrupt(
                            "document ended inside an open element during lookahead",
                        ));
                    }
                    _ => break,
                }
            };
            if let Some(piece) = piece {
                text.push_str(&piece);
            }
            at += 1;
        }
        Ok(text)
    }

    /// The event at queue position `index`, pulling from the source as
    /// needed to fill the queue that far.
    fn buffered(&mut self, index: usize) -> Result<&Event<'static>, FilterError> {
        while self.queue.len() <= index {
            let event = self.pull()?;
            self.queue.push_back(event);
        }
        Ok(&self.queue[index])
    }

    fn pull(&mut self) -> Result<Event<'static>, FilterError> {
        self.scratch.clear();
        let event = self.reader.read_event_into(&mut self.scratch)?;
        Ok(event.into_owned())
    }
}
