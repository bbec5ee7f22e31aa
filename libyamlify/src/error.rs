//! Error types for yamlify decoding.

use std::fmt;
use thiserror::Error;

use crate::scanner::Line;

/// Result type for yamlify operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by primitive parsers and custom converters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Parse context carrying the file name and target type for error reporting.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseContext<'a> {
    pub filename: Option<&'a str>,
    pub type_name: Option<&'static str>,
    /// Type of the items when the document is a list of values.
    pub item_type_name: Option<&'static str>,
}

impl<'a> ParseContext<'a> {
    /// Create a new parse context.
    pub fn new(filename: Option<&'a str>) -> Self {
        Self {
            filename,
            type_name: None,
            item_type_name: None,
        }
    }

    /// Attach the name of the type the document is decoded into.
    pub fn with_type_name(mut self, type_name: &'static str) -> Self {
        self.type_name = Some(type_name);
        self
    }

    /// Attach the name of the type each top-level sequence item is decoded
    /// into.
    pub fn with_item_type_name(mut self, type_name: &'static str) -> Self {
        self.item_type_name = Some(type_name);
        self
    }

    /// Context for a nested block. Only the document root belongs to the
    /// target type, so the type name is dropped.
    pub fn nested(self) -> Self {
        Self {
            filename: self.filename,
            type_name: None,
            item_type_name: None,
        }
    }

    /// Context for the body of a sequence item. Items of a list document
    /// belong to the item type.
    pub fn item(self) -> Self {
        Self {
            filename: self.filename,
            type_name: self.item_type_name,
            item_type_name: None,
        }
    }

    /// Format a location suffix for error messages.
    pub fn loc_suffix(&self, line: usize) -> String {
        match self.filename {
            Some(name) => format!(" at line {} of <{}>", line, name),
            None => format!(" at line {}", line),
        }
    }

    fn owner_suffix(&self) -> String {
        match self.type_name {
            Some(name) => format!(" for {}", name),
            None => String::new(),
        }
    }
}

/// Why a line was rejected by the indentation rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Misalignment {
    /// The line does not sit at the baseline of its enclosing block.
    NotAligned,
    /// The line is nested under a sequence by an odd number of spaces.
    OddDelta,
}

impl fmt::Display for Misalignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Misalignment::NotAligned => write!(f, "line not aligned to enclosing block"),
            Misalignment::OddDelta => write!(f, "odd indentation inside sequence"),
        }
    }
}

/// Error type for yamlify decoding.
#[derive(Error, Debug)]
pub enum Error {
    /// Line misaligned to its block, or odd nesting under a sequence.
    #[error("Invalid indentation ({kind}): \"{text}\"{loc}")]
    Indentation {
        kind: Misalignment,
        text: String,
        loc: String,
    },

    /// Tab character used for indentation.
    #[error("Tab not allowed in indentation (use spaces){0}")]
    TabIndentation(String),

    /// Sequence marker where no sequence item can start.
    #[error("Unexpected sequence marker: \"{text}\"{loc}")]
    MisplacedMarker { text: String, loc: String },

    /// Content line inside a sequence before any item was opened.
    #[error("Expected a sequence item: \"{text}\"{loc}")]
    NotASequence { text: String, loc: String },

    /// Repeated key within one mapping level.
    #[error("Duplicate key \"{key}\"{owner}{loc}")]
    DuplicateKey {
        key: String,
        owner: String,
        loc: String,
    },

    /// Source key with no matching constructor parameter.
    #[error("Unknown property \"{key}\" for {type_name}")]
    UnknownProperty {
        key: String,
        type_name: &'static str,
    },

    /// Two source keys resolving to the same parameter.
    #[error("Duplicate property \"{key}\": \"{field}\" of {type_name} is already set by \"{first}\"")]
    DuplicateProperty {
        key: String,
        first: String,
        field: &'static str,
        type_name: &'static str,
    },

    /// Mandatory parameter with no source key.
    #[error("Missing required property \"{field}\" for {type_name}")]
    MissingRequiredProperty {
        field: &'static str,
        type_name: &'static str,
    },

    /// Scalar text that cannot be converted into the declared type. The
    /// underlying failure is available through `source()`.
    #[error("Cannot convert \"{text}\" to {target}: {source}")]
    TypeCoercion {
        text: String,
        target: &'static str,
        #[source]
        source: BoxError,
    },

    /// Intermediate value of the wrong shape for the target type.
    #[error("Expected {expected} for {target}, found {found}")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
        target: &'static str,
    },

    /// Sequence length differs from a fixed-size array target.
    #[error("Expected {expected} elements for {target}, found {found}")]
    LengthMismatch {
        expected: usize,
        found: usize,
        target: &'static str,
    },

    /// A constructor asked for a field it did not declare, or with a type
    /// other than the declared one.
    #[error("Field \"{field}\" of {type_name} is not declared as {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
        type_name: &'static str,
    },

    /// Empty block where a value was required.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Failure reading the input source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn indentation(kind: Misalignment, line: &Line, ctx: &ParseContext<'_>) -> Self {
        Error::Indentation {
            kind,
            text: line.content().to_string(),
            loc: ctx.loc_suffix(line.line_num),
        }
    }

    pub(crate) fn misplaced_marker(line: &Line, ctx: &ParseContext<'_>) -> Self {
        Error::MisplacedMarker {
            text: line.content().to_string(),
            loc: ctx.loc_suffix(line.line_num),
        }
    }

    pub(crate) fn not_a_sequence(line: &Line, ctx: &ParseContext<'_>) -> Self {
        Error::NotASequence {
            text: line.content().to_string(),
            loc: ctx.loc_suffix(line.line_num),
        }
    }

    pub(crate) fn duplicate_key(key: &str, line: &Line, ctx: &ParseContext<'_>) -> Self {
        Error::DuplicateKey {
            key: key.to_string(),
            owner: ctx.owner_suffix(),
            loc: ctx.loc_suffix(line.line_num),
        }
    }

    pub(crate) fn coercion(text: &str, target: &'static str, source: impl Into<BoxError>) -> Self {
        Error::TypeCoercion {
            text: text.to_string(),
            target,
            source: source.into(),
        }
    }

    /// Returns `true` for errors raised by the structural reader.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::Indentation { .. }
                | Error::TabIndentation(_)
                | Error::MisplacedMarker { .. }
                | Error::NotASequence { .. }
                | Error::DuplicateKey { .. }
        )
    }

    /// The underlying parse failure of a `TypeCoercion`, if it has type `E`.
    pub fn coercion_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Error::TypeCoercion { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}
