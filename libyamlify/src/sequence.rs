//! Lazy decoding of a top-level sequence.
//!
//! Lines are pulled from the reader only until the next item has been
//! delimited, so a long input is never held in memory at once and a
//! malformed item only fails when it is reached.

use std::io::{self, BufRead};
use std::iter::FusedIterator;
use std::sync::Arc;

use tracing::trace;

use crate::bind::{bind_with, Decode};
use crate::cache::DescriptorCache;
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, ParseContext, Result};
use crate::reader::{read_item, ItemSplitter};
use crate::scanner::{scan_line, Line};

/// Progress of a [`Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No line consumed yet.
    Start,
    /// Between items.
    Reading,
    /// An item is decoded and buffered by `peek`.
    ItemReady,
    /// Input ended or an error was returned.
    Exhausted,
}

/// Forward-only iterator decoding one item per pull.
pub struct Sequence<R, T> {
    lines: io::Lines<R>,
    line_num: usize,
    splitter: ItemSplitter<Line>,
    eof: bool,
    state: State,
    buffered: Option<T>,
    cache: DescriptorCache,
    descriptor: Arc<TypeDescriptor>,
    filename: Option<String>,
}

impl<R: BufRead, T: Decode> Sequence<R, T> {
    pub(crate) fn new(
        reader: R,
        cache: DescriptorCache,
        descriptor: Arc<TypeDescriptor>,
        filename: Option<String>,
    ) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
            splitter: ItemSplitter::new(),
            eof: false,
            state: State::Start,
            buffered: None,
            cache,
            descriptor,
            filename,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Decode the next item without consuming it.
    ///
    /// An error is returned here instead of from the following `next`, and
    /// exhausts the sequence.
    pub fn peek(&mut self) -> Option<Result<&T>> {
        if self.buffered.is_none() && self.state != State::Exhausted {
            match self.advance() {
                Ok(Some(item)) => {
                    self.buffered = Some(item);
                    self.state = State::ItemReady;
                }
                Ok(None) => self.state = State::Exhausted,
                Err(e) => {
                    self.state = State::Exhausted;
                    return Some(Err(e));
                }
            }
        }
        self.buffered.as_ref().map(Ok)
    }

    /// The next item, or `EmptyInput` once the sequence is exhausted.
    pub fn require_next(&mut self) -> Result<T> {
        match self.next() {
            Some(item) => item,
            None => Err(Error::EmptyInput("no more items in sequence".to_string())),
        }
    }

    fn advance(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(item) = self.splitter.pop() {
                let ctx = ParseContext::new(self.filename.as_deref())
                    .with_type_name(self.descriptor.type_name());
                let node = read_item(item, &ctx)?;
                trace!(kind = node.kind(), line = self.line_num, "sequence item");
                return bind_with(&self.cache, &self.descriptor, &node).map(Some);
            }
            if self.eof {
                return Ok(None);
            }
            match self.lines.next() {
                Some(text) => {
                    let text = text?;
                    self.line_num += 1;
                    self.state = State::Reading;
                    let ctx = ParseContext::new(self.filename.as_deref());
                    if let Some(line) = scan_line(&text, self.line_num, &ctx)? {
                        self.splitter.push(line, &ctx)?;
                    }
                }
                None => {
                    self.splitter.finish();
                    self.eof = true;
                }
            }
        }
    }
}

impl<R: BufRead, T: Decode> Iterator for Sequence<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        if let Some(item) = self.buffered.take() {
            self.state = State::Reading;
            return Some(Ok(item));
        }
        if self.state == State::Exhausted {
            return None;
        }
        match self.advance() {
            Ok(Some(item)) => {
                self.state = State::Reading;
                Some(Ok(item))
            }
            Ok(None) => {
                self.state = State::Exhausted;
                None
            }
            Err(e) => {
                self.state = State::Exhausted;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead, T: Decode> FusedIterator for Sequence<R, T> {}
