//! Type descriptors: the binding contract of a target type.
//!
//! A descriptor records the shape of a type and, for record types, the
//! parameters of its designated constructor in declaration order. Each
//! parameter carries its name, any renaming aliases, whether it is
//! mandatory, and how its value is produced: either by binding the node
//! against the parameter's declared type, or by a custom converter fed the
//! raw scalar text.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::bind::{bind_in, Decode};
use crate::cache::DescriptorCache;
use crate::error::{BoxError, Error, Result};
use crate::node::Node;

/// Primitive kinds a scalar can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Char,
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    /// Arbitrary-precision integer.
    BigInt,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Char => "char",
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::I128 => "i128",
            ScalarKind::Isize => "isize",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::U128 => "u128",
            ScalarKind::Usize => "usize",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::BigInt => "BigInt",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal container built from bound sequence elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assembly {
    /// `Vec<T>`
    List,
    /// `VecDeque<T>`
    Deque,
    /// `HashSet<T>`, deduplicating.
    Set,
    /// `BTreeSet<T>`, deduplicating and ordered.
    SortedSet,
    /// `[T; N]`
    Array(usize),
    /// `Box<[T]>`
    Boxed,
    /// [`LazyItems<T>`](crate::LazyItems), bound as elements are pulled.
    Lazy,
}

/// Structural shape of a target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Plain value wrapping a primitive.
    Scalar(ScalarKind),
    /// Named record type built from a mapping.
    Record(&'static str),
    /// Container built from a sequence.
    Collection {
        assembly: Assembly,
        element: Box<Shape>,
    },
    /// Produced from scalar text by a custom converter.
    Converted(&'static str),
    /// The intermediate tree itself, of any shape.
    Tree,
}

impl Shape {
    /// Node kind this shape is bound from.
    pub fn node_kind(&self) -> &'static str {
        match self {
            Shape::Scalar(_) | Shape::Converted(_) => "scalar",
            Shape::Record(_) => "mapping",
            Shape::Collection { .. } => "sequence",
            Shape::Tree => "node",
        }
    }
}

/// Custom conversion from raw scalar text to a field value.
///
/// Converters may keep external state and may call back into the parser to
/// decode structure embedded in the text.
pub trait Converter: Send + Sync + 'static {
    type Output: 'static;

    fn convert(&self, text: &str) -> std::result::Result<Self::Output, BoxError>;
}

pub(crate) type ErasedValue = Box<dyn Any>;

type DecodeFn = fn(&DescriptorCache, &Node) -> Result<ErasedValue>;
type ShapeFn = fn(&DescriptorCache) -> Shape;
type ConvertFn = Arc<dyn Fn(&str) -> std::result::Result<ErasedValue, BoxError> + Send + Sync>;

#[derive(Clone)]
enum Binding {
    Decode { decode: DecodeFn, shape: ShapeFn },
    Convert(ConvertFn),
}

fn decode_erased<T: Decode>(cache: &DescriptorCache, node: &Node) -> Result<ErasedValue> {
    bind_in::<T>(cache, node).map(|value| Box::new(value) as ErasedValue)
}

fn shape_of<T: Decode>(cache: &DescriptorCache) -> Shape {
    cache.get::<T>().shape(cache)
}

/// One constructor parameter.
#[derive(Clone)]
pub struct Field {
    name: &'static str,
    aliases: Vec<&'static str>,
    required: bool,
    type_name: &'static str,
    binding: Binding,
}

impl Field {
    /// A mandatory parameter bound against `T`.
    pub fn new<T: Decode>(name: &'static str) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            required: true,
            type_name: type_name::<T>(),
            binding: Binding::Decode {
                decode: decode_erased::<T>,
                shape: shape_of::<T>,
            },
        }
    }

    /// A mandatory parameter produced by `converter` from scalar text.
    pub fn converted<C: Converter>(name: &'static str, converter: C) -> Self {
        let convert: ConvertFn = Arc::new(move |text: &str| {
            converter
                .convert(text)
                .map(|value| Box::new(value) as ErasedValue)
        });
        Self {
            name,
            aliases: Vec::new(),
            required: true,
            type_name: type_name::<C::Output>(),
            binding: Binding::Convert(convert),
        }
    }

    /// Accept `alias` as a source key for this parameter.
    pub fn alias(mut self, alias: &'static str) -> Self {
        self.aliases.push(alias);
        self
    }

    /// Mark the parameter as having a default.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn aliases(&self) -> &[&'static str] {
        &self.aliases
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Rust type name of the parameter value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn has_converter(&self) -> bool {
        matches!(self.binding, Binding::Convert(_))
    }

    /// Declared shape, with nested types described through `cache`.
    /// Resolved on demand so self-referential types can be described.
    pub fn shape(&self, cache: &DescriptorCache) -> Shape {
        match &self.binding {
            Binding::Decode { shape, .. } => shape(cache),
            Binding::Convert(_) => Shape::Converted(self.type_name),
        }
    }

    /// Produce this parameter's value from its source node.
    pub(crate) fn bind(&self, cache: &DescriptorCache, node: &Node) -> Result<ErasedValue> {
        match &self.binding {
            Binding::Decode { decode, .. } => decode(cache, node),
            Binding::Convert(convert) => {
                let text = node.as_scalar().ok_or(Error::ShapeMismatch {
                    expected: "scalar",
                    found: node.kind(),
                    target: self.type_name,
                })?;
                convert(text).map_err(|source| Error::coercion(text, self.type_name, source))
            }
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("required", &self.required)
            .field("type_name", &self.type_name)
            .field("converter", &self.has_converter())
            .finish()
    }
}

/// How a descriptor's values are laid out. Element shapes of collections
/// stay unresolved until asked for, through the cache in use.
#[derive(Clone, Copy)]
pub(crate) enum Layout {
    Scalar(ScalarKind),
    Record,
    Collection { assembly: Assembly, element: ShapeFn },
    Tree,
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Scalar(kind) => write!(f, "Scalar({})", kind),
            Layout::Record => f.write_str("Record"),
            Layout::Collection { assembly, .. } => write!(f, "Collection({:?})", assembly),
            Layout::Tree => f.write_str("Tree"),
        }
    }
}

/// Binding contract of one target type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    type_name: &'static str,
    layout: Layout,
    fields: Vec<Field>,
}

impl TypeDescriptor {
    /// Descriptor of a plain value type wrapping a primitive.
    pub fn scalar(kind: ScalarKind) -> Self {
        Self {
            type_name: kind.name(),
            layout: Layout::Scalar(kind),
            fields: Vec::new(),
        }
    }

    /// Descriptor of a container of `E`.
    pub fn collection<E: Decode>(type_name: &'static str, assembly: Assembly) -> Self {
        Self {
            type_name,
            layout: Layout::Collection {
                assembly,
                element: shape_of::<E>,
            },
            fields: Vec::new(),
        }
    }

    /// Descriptor of a record type; add parameters with [`field`](Self::field).
    pub fn record(type_name: &'static str) -> Self {
        Self {
            type_name,
            layout: Layout::Record,
            fields: Vec::new(),
        }
    }

    /// Descriptor of a type that keeps the intermediate tree as is.
    pub fn tree(type_name: &'static str) -> Self {
        Self {
            type_name,
            layout: Layout::Tree,
            fields: Vec::new(),
        }
    }

    /// Append a constructor parameter.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Structural shape, with element types described through `cache`.
    pub fn shape(&self, cache: &DescriptorCache) -> Shape {
        match self.layout {
            Layout::Scalar(kind) => Shape::Scalar(kind),
            Layout::Record => Shape::Record(self.type_name),
            Layout::Collection { assembly, element } => Shape::Collection {
                assembly,
                element: Box::new(element(cache)),
            },
            Layout::Tree => Shape::Tree,
        }
    }

    pub(crate) fn layout(&self) -> Layout {
        self.layout
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Position of the parameter with canonical name `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Position of the parameter a source key binds to: exact names first,
    /// then aliases in declaration order.
    pub fn resolve(&self, key: &str) -> Option<usize> {
        self.index_of(key).or_else(|| {
            self.fields
                .iter()
                .position(|f| f.aliases.iter().any(|alias| *alias == key))
        })
    }
}
