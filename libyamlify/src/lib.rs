//! Yamlify: typed decoding of a block-style YAML subset.
//!
//! Documents use two-space nesting, `key: value` mapping lines, and `-`
//! sequence markers. There are no quotes, flow collections, comments,
//! anchors, or multiple documents. Values are decoded directly into Rust
//! types that implement [`Decode`].
//!
//! # Decoding Pipeline
//!
//! Decoding operates in three phases behind the [`Parser`] façade:
//!
//! 1. **Line Classifier**: Drops blank lines, counts indentation, and
//!    recognises sequence markers and key/value separators.
//!
//! 2. **Structural Reader**: Partitions the lines by indentation into a
//!    [`Node`] tree of scalars, mappings, and sequences.
//!
//! 3. **Value Binder**: Walks the tree against the target type's cached
//!    [`TypeDescriptor`], resolving field names and aliases, running
//!    converters, and coercing scalar text.

mod bind;
mod cache;
mod descriptor;
mod emit;
mod error;
mod folder;
mod node;
mod parser;
mod reader;
mod scanner;
mod sequence;

pub use bind::{bind, bind_in, bind_with, Arguments, Decode, LazyItems};
pub use cache::{descriptor, DescriptorCache};
pub use descriptor::{Assembly, Converter, Field, ScalarKind, Shape, TypeDescriptor};
pub use emit::emit;
pub use error::{BoxError, Error, Misalignment, Result};
pub use folder::{list_files, Folder};
pub use node::{Mapping, Node, SCALAR_KEY};
pub use parser::{parser, Parser, DEFAULT_EXTENSION};
pub use sequence::{Sequence, State};

/// Decode a document into `T`.
///
/// # Example
///
/// ```
/// let grades: Vec<u32> = libyamlify::from_str("- 18\n- 14\n").unwrap();
/// assert_eq!(grades, vec![18, 14]);
/// ```
pub fn from_str<T: Decode>(source: &str) -> Result<T> {
    parser::<T>().parse_object_str(source)
}

/// Decode a document read from `reader` into `T`.
pub fn from_reader<T: Decode, R: std::io::Read>(reader: R) -> Result<T> {
    parser::<T>().parse_object(reader)
}

/// Decode each item of a top-level sequence into `T`.
pub fn list_from_str<T: Decode>(source: &str) -> Result<Vec<T>> {
    parser::<T>().parse_list_str(source)
}

/// Read a document into its intermediate tree without binding it.
pub fn read(source: &str) -> Result<Node> {
    read_with_filename(source, None)
}

/// Read a document into its intermediate tree, labelling errors with
/// `filename`.
pub fn read_with_filename(source: &str, filename: Option<&str>) -> Result<Node> {
    let ctx = error::ParseContext::new(filename);

    // Phase 1: Classify lines
    let lines = scanner::scan(source, &ctx)?;

    // Phase 2: Partition into a tree
    reader::read_block(&lines, &ctx)
}
