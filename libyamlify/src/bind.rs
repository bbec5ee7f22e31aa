//! Phase 3: Value Binder
//!
//! The binder turns a `Node` into a value of a target type, guided by the
//! type's descriptor:
//! - Scalars are coerced with the primitive's `FromStr` parser
//! - Sequences are bound element by element and assembled into a container
//! - Mappings are matched against constructor parameters, then each value is
//!   bound against the parameter's type or fed to its converter
//!
//! Key-level checks (unknown, duplicate, missing) all run before any value is
//! coerced.

use std::any::type_name;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::str::FromStr;
use std::vec;

use num_bigint::BigInt;
use tracing::trace;

use crate::cache::DescriptorCache;
use crate::descriptor::{Assembly, ErasedValue, Layout, ScalarKind, TypeDescriptor};
use crate::error::{BoxError, Error, Result};
use crate::node::{Mapping, Node};

/// A type that can be decoded from a document.
///
/// `describe` states the binding contract once per type; `construct` builds
/// a value from the arguments collected under that contract.
///
/// ```
/// use libyamlify::{Arguments, Decode, Field, Result, TypeDescriptor};
///
/// struct Address {
///     street: String,
///     nr: u32,
/// }
///
/// impl Decode for Address {
///     fn describe() -> TypeDescriptor {
///         TypeDescriptor::record("Address")
///             .field(Field::new::<String>("street"))
///             .field(Field::new::<u32>("nr"))
///     }
///
///     fn construct(mut args: Arguments<'_>) -> Result<Self> {
///         Ok(Address {
///             street: args.take("street")?,
///             nr: args.take("nr")?,
///         })
///     }
/// }
///
/// let address: Address = libyamlify::from_str("street: Rua Rosa\nnr: 78\n").unwrap();
/// assert_eq!(address.street, "Rua Rosa");
/// assert_eq!(address.nr, 78);
/// ```
pub trait Decode: Sized + 'static {
    fn describe() -> TypeDescriptor;

    fn construct(args: Arguments<'_>) -> Result<Self>;
}

enum Payload<'a> {
    Scalar(&'a str),
    Elements(&'a [Node]),
    Fields(Vec<Option<ErasedValue>>),
    Tree(&'a Node),
}

impl Payload<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Payload::Scalar(_) => "scalar",
            Payload::Elements(_) => "sequence",
            Payload::Fields(_) => "mapping",
            Payload::Tree(node) => node.kind(),
        }
    }
}

/// Values collected for one construction.
pub struct Arguments<'a> {
    cache: &'a DescriptorCache,
    descriptor: &'a TypeDescriptor,
    payload: Payload<'a>,
}

impl<'a> Arguments<'a> {
    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        self.descriptor
    }

    /// The cache nested types are described through.
    pub fn cache(&self) -> &DescriptorCache {
        self.cache
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::ShapeMismatch {
            expected,
            found: self.payload.kind(),
            target: self.type_name(),
        }
    }

    /// Raw scalar text.
    pub fn scalar(&self) -> Result<&'a str> {
        match self.payload {
            Payload::Scalar(text) => Ok(text),
            _ => Err(self.mismatch("scalar")),
        }
    }

    /// Scalar text parsed with `V`'s `FromStr`.
    pub fn parse_scalar<V>(&self) -> Result<V>
    where
        V: FromStr,
        V::Err: Into<BoxError>,
    {
        let text = self.scalar()?;
        text.parse()
            .map_err(|e| Error::coercion(text, self.type_name(), e))
    }

    /// Sequence items bound as `E`, in source order.
    pub fn elements<E: Decode>(&self) -> Result<Vec<E>> {
        match self.payload {
            Payload::Elements(items) => items.iter().map(|item| bind_in(self.cache, item)).collect(),
            _ => Err(self.mismatch("sequence")),
        }
    }

    /// Sequence items left unbound until pulled.
    pub fn lazy_elements<E: Decode>(&self) -> Result<LazyItems<E>> {
        match self.payload {
            Payload::Elements(items) => Ok(LazyItems {
                items: items.to_vec().into_iter(),
                cache: self.cache.clone(),
                _marker: PhantomData,
            }),
            _ => Err(self.mismatch("sequence")),
        }
    }

    /// The intermediate tree, for descriptors built with
    /// [`TypeDescriptor::tree`].
    pub fn tree(&self) -> Result<&'a Node> {
        match self.payload {
            Payload::Tree(node) => Ok(node),
            _ => Err(self.mismatch("node")),
        }
    }

    fn slot(&mut self, name: &str, expected: &'static str) -> Result<Option<ErasedValue>> {
        let index = self.descriptor.index_of(name).ok_or_else(|| Error::FieldType {
            field: name.to_string(),
            expected,
            type_name: self.descriptor.type_name(),
        })?;
        if let Payload::Fields(values) = &mut self.payload {
            return Ok(values[index].take());
        }
        Err(self.mismatch("mapping"))
    }

    /// Value of parameter `name`, if the document supplied one.
    pub fn optional<V: 'static>(&mut self, name: &str) -> Result<Option<V>> {
        let expected = type_name::<V>();
        match self.slot(name, expected)? {
            None => Ok(None),
            Some(value) => value.downcast::<V>().map(|v| Some(*v)).map_err(|_| {
                Error::FieldType {
                    field: name.to_string(),
                    expected,
                    type_name: self.type_name(),
                }
            }),
        }
    }

    /// Value of mandatory parameter `name`.
    pub fn take<V: 'static>(&mut self, name: &str) -> Result<V> {
        match self.optional(name)? {
            Some(value) => Ok(value),
            None => Err(Error::MissingRequiredProperty {
                field: self.field_name(name),
                type_name: self.type_name(),
            }),
        }
    }

    /// Value of parameter `name`, or `V::default()` when absent.
    pub fn or_default<V: Default + 'static>(&mut self, name: &str) -> Result<V> {
        Ok(self.optional(name)?.unwrap_or_default())
    }

    fn field_name(&self, name: &str) -> &'static str {
        self.descriptor
            .index_of(name)
            .map_or("", |i| self.descriptor.fields()[i].name())
    }
}

/// Bind `node` into a `T`, describing types through the global cache.
pub fn bind<T: Decode>(node: &Node) -> Result<T> {
    bind_in(DescriptorCache::global(), node)
}

/// Bind `node` into a `T`, describing `T` and every nested type through
/// `cache`.
pub fn bind_in<T: Decode>(cache: &DescriptorCache, node: &Node) -> Result<T> {
    let desc = cache.get::<T>();
    bind_with(cache, &desc, node)
}

/// Bind `node` into a `T` described by `desc`. Nested types are described
/// through `cache`.
pub fn bind_with<T: Decode>(cache: &DescriptorCache, desc: &TypeDescriptor, node: &Node) -> Result<T> {
    let payload = match desc.layout() {
        Layout::Scalar(_) => Payload::Scalar(scalar_text(desc, node)?),
        Layout::Collection { .. } => Payload::Elements(sequence_items(desc, node)?),
        Layout::Record => {
            let mapping = node.as_mapping().ok_or(Error::ShapeMismatch {
                expected: "mapping",
                found: node.kind(),
                target: desc.type_name(),
            })?;
            Payload::Fields(bind_fields(cache, desc, mapping)?)
        }
        Layout::Tree => Payload::Tree(node),
    };
    T::construct(Arguments {
        cache,
        descriptor: desc,
        payload,
    })
}

// A bare scalar item sits under the synthetic key of a mapping block.
fn scalar_text<'n>(desc: &TypeDescriptor, node: &'n Node) -> Result<&'n str> {
    match node {
        Node::Scalar(text) => Ok(text),
        Node::Mapping(m) => match m.lone_scalar() {
            Some(text) => Ok(text),
            None if m.is_empty() => Err(Error::EmptyInput(format!(
                "no value for {}",
                desc.type_name()
            ))),
            None => Err(Error::ShapeMismatch {
                expected: "scalar",
                found: "mapping",
                target: desc.type_name(),
            }),
        },
        Node::Sequence(_) => Err(Error::ShapeMismatch {
            expected: "scalar",
            found: "sequence",
            target: desc.type_name(),
        }),
    }
}

// A key with no block reads as an empty mapping, which stands for no items.
fn sequence_items<'n>(desc: &TypeDescriptor, node: &'n Node) -> Result<&'n [Node]> {
    match node {
        Node::Sequence(items) => Ok(items),
        Node::Mapping(m) if m.is_empty() => Ok(&[]),
        other => Err(Error::ShapeMismatch {
            expected: "sequence",
            found: other.kind(),
            target: desc.type_name(),
        }),
    }
}

fn bind_fields(
    cache: &DescriptorCache,
    desc: &TypeDescriptor,
    mapping: &Mapping,
) -> Result<Vec<Option<ErasedValue>>> {
    let fields = desc.fields();
    let mut sources: Vec<Option<(&str, &Node)>> = vec![None; fields.len()];

    for (key, node) in mapping.iter() {
        let index = desc.resolve(key).ok_or_else(|| Error::UnknownProperty {
            key: key.to_string(),
            type_name: desc.type_name(),
        })?;
        if let Some((first, _)) = sources[index] {
            return Err(Error::DuplicateProperty {
                key: key.to_string(),
                first: first.to_string(),
                field: fields[index].name(),
                type_name: desc.type_name(),
            });
        }
        sources[index] = Some((key, node));
    }

    if let Some(missing) = fields
        .iter()
        .zip(&sources)
        .find(|(field, source)| field.is_required() && source.is_none())
    {
        return Err(Error::MissingRequiredProperty {
            field: missing.0.name(),
            type_name: desc.type_name(),
        });
    }

    trace!(
        type_name = desc.type_name(),
        keys = mapping.len(),
        "binding record"
    );
    fields
        .iter()
        .zip(sources)
        .map(|(field, source)| source.map(|(_, node)| field.bind(cache, node)).transpose())
        .collect()
}

macro_rules! decode_parsed {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::scalar(ScalarKind::$kind)
                }

                fn construct(args: Arguments<'_>) -> Result<Self> {
                    args.parse_scalar()
                }
            }
        )*
    };
}

decode_parsed! {
    char => Char,
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    BigInt => BigInt,
}

impl Decode for String {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarKind::String)
    }

    fn construct(args: Arguments<'_>) -> Result<Self> {
        args.scalar().map(str::to_string)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::collection::<T>(type_name::<Self>(), Assembly::List)
    }

    fn construct(args: Arguments<'_>) -> Result<Self> {
        args.elements()
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::collection::<T>(type_name::<Self>(), Assembly::Deque)
    }

    fn construct(args: Arguments<'_>) -> Result<Self> {
        args.elements::<T>().map(VecDeque::from)
    }
}

impl<T: Decode + Eq + Hash> Decode for HashSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::collection::<T>(type_name::<Self>(), Assembly::Set)
    }

    fn construct(args: Arguments<'_>) -> Result<Self> {
        Ok(args.elements::<T>()?.into_iter().collect())
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::collection::<T>(type_name::<Self>(), Assembly::SortedSet)
    }

    fn construct(args: Arguments<'_>) -> Result<Self> {
        Ok(args.elements::<T>()?.into_iter().collect())
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::collection::<T>(type_name::<Self>(), Assembly::Array(N))
    }

    fn construct(args: Arguments<'_>) -> Result<Self> {
        args.elements::<T>()?
            .try_into()
            .map_err(|items: Vec<T>| Error::LengthMismatch {
                expected: N,
                found: items.len(),
                target: type_name::<Self>(),
            })
    }
}

impl<T: Decode> Decode for Box<[T]> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::collection::<T>(type_name::<Self>(), Assembly::Boxed)
    }

    fn construct(args: Arguments<'_>) -> Result<Self> {
        args.elements::<T>().map(Vec::into_boxed_slice)
    }
}

/// Sequence whose elements are bound one at a time as they are pulled.
///
/// Binding the container only checks that the source is a sequence; each
/// element's errors surface from the `next` that reaches it and do not stop
/// the elements after it.
pub struct LazyItems<T> {
    items: vec::IntoIter<Node>,
    cache: DescriptorCache,
    _marker: PhantomData<fn() -> T>,
}

impl<T> LazyItems<T> {
    /// Elements not yet pulled.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl<T: Decode> Iterator for LazyItems<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        let node = self.items.next()?;
        Some(bind_in(&self.cache, &node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<T: Decode> ExactSizeIterator for LazyItems<T> {}

impl<T: Decode> FusedIterator for LazyItems<T> {}

impl<T: Decode> Decode for LazyItems<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::collection::<T>(type_name::<Self>(), Assembly::Lazy)
    }

    fn construct(args: Arguments<'_>) -> Result<Self> {
        args.lazy_elements()
    }
}

impl Decode for Node {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::tree("Node")
    }

    fn construct(args: Arguments<'_>) -> Result<Self> {
        args.tree().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Field;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct Grade {
        subject: String,
        classification: i32,
    }

    impl Decode for Grade {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::record("Grade")
                .field(Field::new::<String>("subject"))
                .field(Field::new::<i32>("classification").alias("mark"))
        }

        fn construct(mut args: Arguments<'_>) -> Result<Self> {
            Ok(Grade {
                subject: args.take("subject")?,
                classification: args.take("classification")?,
            })
        }
    }

    fn seq(items: &[&str]) -> Node {
        Node::Sequence(items.iter().map(|s| Node::from(*s)).collect())
    }

    fn grade(subject: &str, classification: &str) -> Node {
        Node::Mapping(
            [
                ("subject", Node::from(subject)),
                ("classification", Node::from(classification)),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn test_bind_primitives() {
        assert_eq!(bind::<i32>(&Node::from("-42")).unwrap(), -42);
        assert_eq!(bind::<u8>(&Node::from("255")).unwrap(), 255);
        assert_eq!(bind::<f64>(&Node::from("1.5")).unwrap(), 1.5);
        assert_eq!(bind::<char>(&Node::from("x")).unwrap(), 'x');
        assert_eq!(bind::<String>(&Node::from("Maria Candida")).unwrap(), "Maria Candida");
        assert_eq!(
            bind::<BigInt>(&Node::from("123456789012345678901234567890")).unwrap(),
            "123456789012345678901234567890".parse::<BigInt>().unwrap()
        );
    }

    #[test]
    fn test_bool_is_strict() {
        assert!(bind::<bool>(&Node::from("true")).unwrap());
        assert!(!bind::<bool>(&Node::from("false")).unwrap());
        let err = bind::<bool>(&Node::from("yes")).unwrap_err();
        assert!(matches!(err, Error::TypeCoercion { target: "bool", .. }));
    }

    #[test]
    fn test_coercion_failure_message() {
        let err = bind::<i32>(&Node::from("abc")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot convert \"abc\" to i32: invalid digit found in string"
        );
        assert!(err.coercion_source::<std::num::ParseIntError>().is_some());
    }

    #[test]
    fn test_bind_scalar_from_lone_mapping_entry() {
        let node = Node::Mapping([("", Node::from("7"))].into_iter().collect());
        assert_eq!(bind::<u32>(&node).unwrap(), 7);
    }

    #[test]
    fn test_bind_scalar_from_empty_mapping() {
        let err = bind::<u32>(&Node::Mapping(Mapping::new())).unwrap_err();
        assert!(matches!(err, Error::EmptyInput(_)));
    }

    #[test]
    fn test_bind_scalar_from_sequence() {
        let err = bind::<String>(&seq(&["a"])).unwrap_err();
        assert_eq!(err.to_string(), "Expected scalar for String, found sequence");
    }

    #[test]
    fn test_bind_collections() {
        let node = seq(&["3", "1", "2", "1"]);
        assert_eq!(bind::<Vec<u8>>(&node).unwrap(), vec![3, 1, 2, 1]);
        assert_eq!(
            bind::<VecDeque<u8>>(&node).unwrap(),
            VecDeque::from(vec![3, 1, 2, 1])
        );
        assert_eq!(bind::<HashSet<u8>>(&node).unwrap().len(), 3);
        assert_eq!(
            bind::<BTreeSet<u8>>(&node).unwrap().into_iter().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(bind::<[u8; 4]>(&node).unwrap(), [3, 1, 2, 1]);
        assert_eq!(&*bind::<Box<[u8]>>(&node).unwrap(), &[3, 1, 2, 1]);
    }

    #[test]
    fn test_array_length_mismatch() {
        let err = bind::<[u8; 2]>(&seq(&["1", "2", "3"])).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_bind_nested_collections() {
        let node = Node::Sequence(vec![seq(&["1", "2"]), seq(&[]), seq(&["3"])]);
        assert_eq!(
            bind::<Vec<Vec<i64>>>(&node).unwrap(),
            vec![vec![1, 2], vec![], vec![3]]
        );
    }

    #[test]
    fn test_collection_from_keyless_block() {
        assert!(bind::<Vec<u8>>(&Node::Mapping(Mapping::new()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_bind_records() {
        let node = Node::Sequence(vec![grade("LAE", "18"), grade("PDM", "14")]);
        assert_eq!(
            bind::<Vec<Grade>>(&node).unwrap(),
            vec![
                Grade {
                    subject: "LAE".to_string(),
                    classification: 18
                },
                Grade {
                    subject: "PDM".to_string(),
                    classification: 14
                },
            ]
        );
    }

    #[test]
    fn test_record_key_checks() {
        let unknown: Mapping = [("subject", Node::from("LAE")), ("teacher", Node::from("X"))]
            .into_iter()
            .collect();
        let err = bind::<Grade>(&Node::Mapping(unknown)).unwrap_err();
        assert_eq!(err.to_string(), "Unknown property \"teacher\" for Grade");

        let duplicate: Mapping = [
            ("subject", Node::from("LAE")),
            ("classification", Node::from("1")),
            ("mark", Node::from("2")),
        ]
        .into_iter()
        .collect();
        let err = bind::<Grade>(&Node::Mapping(duplicate)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate property \"mark\": \"classification\" of Grade is already set by \"classification\""
        );

        let missing: Mapping = [("subject", Node::from("LAE"))].into_iter().collect();
        let err = bind::<Grade>(&Node::Mapping(missing)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required property \"classification\" for Grade"
        );
    }

    #[test]
    fn test_key_checks_precede_coercion() {
        let node: Mapping = [
            ("classification", Node::from("not a number")),
            ("teacher", Node::from("X")),
        ]
        .into_iter()
        .collect();
        let err = bind::<Grade>(&Node::Mapping(node)).unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { .. }));
    }

    #[test]
    fn test_record_from_scalar() {
        let err = bind::<Grade>(&Node::from("LAE")).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: "mapping",
                found: "scalar",
                ..
            }
        ));
    }

    #[test]
    fn test_take_undeclared_field() {
        struct Sloppy;

        impl Decode for Sloppy {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::record("Sloppy").field(Field::new::<i32>("a").optional())
            }

            fn construct(mut args: Arguments<'_>) -> Result<Self> {
                let _: Option<String> = args.optional("a")?;
                Ok(Sloppy)
            }
        }

        let node: Mapping = [("a", Node::from("1"))].into_iter().collect();
        let err = bind::<Sloppy>(&Node::Mapping(node)).err().unwrap();
        assert!(matches!(err, Error::FieldType { .. }));
        // Absent values never reach the type check
        assert!(bind::<Sloppy>(&Node::Mapping(Mapping::new())).is_ok());
    }

    #[test]
    fn test_lazy_items_bind_on_pull() {
        let mut items = bind::<LazyItems<i32>>(&seq(&["1", "x", "3"])).unwrap();
        assert_eq!(items.remaining(), 3);
        assert_eq!(items.next().unwrap().unwrap(), 1);
        assert!(matches!(items.next(), Some(Err(Error::TypeCoercion { .. }))));
        assert_eq!(items.next().unwrap().unwrap(), 3);
        assert!(items.next().is_none());
    }

    #[test]
    fn test_lazy_items_shape() {
        let cache = DescriptorCache::new();
        let desc = cache.get::<LazyItems<Grade>>();
        assert_eq!(
            desc.shape(&cache),
            crate::descriptor::Shape::Collection {
                assembly: Assembly::Lazy,
                element: Box::new(crate::descriptor::Shape::Record("Grade")),
            }
        );
        let err = bind::<LazyItems<Grade>>(&Node::from("LAE")).err().unwrap();
        assert!(matches!(err, Error::ShapeMismatch { expected: "sequence", .. }));
    }

    #[test]
    fn test_bind_tree() {
        let node = Node::Sequence(vec![grade("LAE", "18"), Node::from("x")]);
        assert_eq!(bind::<Node>(&node).unwrap(), node);
    }

    #[test]
    fn test_nested_types_use_the_callers_cache() {
        let cache = DescriptorCache::new();
        let node = Node::Sequence(vec![grade("LAE", "18")]);
        let grades: Vec<Grade> = bind_in(&cache, &node).unwrap();
        assert_eq!(grades[0].classification, 18);
        assert!(cache.contains::<Vec<Grade>>());
        assert!(cache.contains::<Grade>());
        assert!(cache.contains::<String>());
        assert!(cache.contains::<i32>());
        assert_eq!(cache.len(), 4);
    }
}
