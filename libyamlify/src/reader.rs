//! Phase 2: Structural Reader
//!
//! The reader recursively partitions classified lines into mappings and
//! sequences, producing a `Node` tree. It never looks at target types.
//!
//! Blocks are validated against a baseline: the indentation of their first
//! line. Mapping lines must sit exactly at the baseline; sequence lines may
//! be nested deeper, but only by an even number of spaces.
//!
//! All functions are generic over `L: Borrow<Line>` so the same code serves
//! borrowed lines (eager parsing) and owned lines (lazy sequences).

use std::borrow::Borrow;
use std::collections::VecDeque;
use std::mem;

use crate::error::{Error, Misalignment, ParseContext, Result};
use crate::node::{Mapping, Node, SCALAR_KEY};
use crate::scanner::Line;

/// Read a block as a sequence if its first line is a marker, otherwise as a
/// mapping. An empty block reads as an empty mapping.
pub fn read_block<L: Borrow<Line>>(lines: &[L], ctx: &ParseContext<'_>) -> Result<Node> {
    match lines.first() {
        Some(head) if head.borrow().is_sequence_marker() => {
            Ok(Node::Sequence(read_sequence(lines, ctx)?))
        }
        _ => Ok(Node::Mapping(read_mapping(lines, ctx)?)),
    }
}

/// Read lines at one indentation level into a mapping.
pub fn read_mapping<L: Borrow<Line>>(lines: &[L], ctx: &ParseContext<'_>) -> Result<Mapping> {
    let mut mapping = Mapping::new();
    let Some(first) = lines.first() else {
        return Ok(mapping);
    };
    let baseline = first.borrow().indent;
    let nested = ctx.nested();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].borrow();
        i += 1;

        if line.indent != baseline {
            return Err(Error::indentation(Misalignment::NotAligned, line, ctx));
        }

        // Bare scalar item inside a mapping block
        if line.is_sequence_marker() {
            if !line.is_bare_scalar_item() {
                return Err(Error::misplaced_marker(line, ctx));
            }
            if !mapping.insert(SCALAR_KEY, Node::from(line.marker_content())) {
                return Err(Error::duplicate_key(SCALAR_KEY, line, ctx));
            }
            continue;
        }

        let (key, value) = line.key_value();
        if mapping.contains_key(key) {
            return Err(Error::duplicate_key(key, line, ctx));
        }

        if !value.is_empty() {
            mapping.insert(key, Node::from(value));
            continue;
        }

        // Value continues on the deeper-indented lines that follow
        let end = lines[i..]
            .iter()
            .position(|l| l.borrow().indent <= baseline)
            .map_or(lines.len(), |p| i + p);
        let node = read_block(&lines[i..end], &nested)?;
        i = end;
        mapping.insert(key, node);
    }

    Ok(mapping)
}

/// Read marker-introduced items into a sequence.
pub fn read_sequence<L: Borrow<Line>>(lines: &[L], ctx: &ParseContext<'_>) -> Result<Vec<Node>> {
    let nested = ctx.item();
    let mut splitter: ItemSplitter<&Line> = ItemSplitter::new();
    let mut items = Vec::new();
    for line in lines {
        splitter.push(line.borrow(), ctx)?;
        while let Some(item) = splitter.pop() {
            items.push(read_item(item, &nested)?);
        }
    }
    splitter.finish();
    while let Some(item) = splitter.pop() {
        items.push(read_item(item, &nested)?);
    }
    Ok(items)
}

/// Read one delimited sequence item.
pub(crate) fn read_item<L: Borrow<Line>>(item: Item<L>, ctx: &ParseContext<'_>) -> Result<Node> {
    match item {
        Item::Scalar(line) => Ok(Node::from(line.borrow().marker_content())),
        Item::Block(body) => read_block(&body, ctx),
    }
}

/// A delimited sequence item.
#[derive(Debug)]
pub(crate) enum Item<L> {
    /// `- value` on a single line.
    Scalar(L),
    /// Body lines following a lone `-`, up to the next baseline marker.
    Block(Vec<L>),
}

/// Incremental partitioner of sequence lines into items.
///
/// Lines are pushed one at a time; completed items queue up and are drained
/// with `pop`. Block items are only complete once the next baseline marker
/// (or `finish`) is seen.
#[derive(Debug)]
pub(crate) struct ItemSplitter<L> {
    baseline: Option<usize>,
    open: bool,
    body: Vec<L>,
    ready: VecDeque<Item<L>>,
}

impl<L: Borrow<Line>> ItemSplitter<L> {
    pub(crate) fn new() -> Self {
        Self {
            baseline: None,
            open: false,
            body: Vec::new(),
            ready: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, line: L, ctx: &ParseContext<'_>) -> Result<()> {
        let l = line.borrow();
        let baseline = *self.baseline.get_or_insert(l.indent);

        if l.indent < baseline {
            return Err(Error::indentation(Misalignment::NotAligned, l, ctx));
        }
        if (l.indent - baseline) % 2 != 0 {
            return Err(Error::indentation(Misalignment::OddDelta, l, ctx));
        }

        if l.indent == baseline && l.is_sequence_marker() {
            if l.is_bare_scalar_item() {
                self.close();
                self.ready.push_back(Item::Scalar(line));
            } else if l.marker_content().is_empty() {
                self.close();
                self.open = true;
            } else {
                return Err(Error::misplaced_marker(l, ctx));
            }
        } else if self.open {
            self.body.push(line);
        } else {
            return Err(Error::not_a_sequence(l, ctx));
        }
        Ok(())
    }

    /// Close the pending block item at end of input.
    pub(crate) fn finish(&mut self) {
        self.close();
    }

    pub(crate) fn pop(&mut self) -> Option<Item<L>> {
        self.ready.pop_front()
    }

    // Items with an empty body are dropped.
    fn close(&mut self) {
        if !self.body.is_empty() {
            self.ready.push_back(Item::Block(mem::take(&mut self.body)));
        }
        self.open = false;
    }
}
