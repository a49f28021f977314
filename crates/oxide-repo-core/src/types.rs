//! Field type classification.
//!
//! A [`TypeShape`] is the raw description of a field's type, as written in a
//! record document or produced by [`Shaped`] for Rust types. Resolving a shape
//! yields a [`TypeDescriptor`], the storage-oriented view every later stage
//! works with.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeResolutionError};

/// Storage kind of a resolved type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Platform-sized signed integer.
    Int,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Platform-sized unsigned integer.
    Uint,
    /// Byte.
    Uint8,
    /// 32-bit unsigned integer.
    Uint32,
    /// 64-bit unsigned integer.
    Uint64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Struct value.
    Struct,
    /// Key/value map.
    Map,
    /// Growable list.
    Slice,
    /// Fixed-size array.
    Array,
    /// Opaque type from another module, carried by name.
    External,
}

impl Kind {
    /// Returns whether this is one of the built-in scalar kinds.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(
            self,
            Self::Struct | Self::Map | Self::Slice | Self::Array | Self::External
        )
    }

    /// Returns whether this is a container kind.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Map | Self::Slice | Self::Array)
    }

    /// Returns whether values of this kind are integers.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::Int32
                | Self::Int64
                | Self::Uint
                | Self::Uint8
                | Self::Uint32
                | Self::Uint64
        )
    }
}

/// Raw description of a field type.
///
/// In a JSON record document a shape is an object tagged by `kind`:
///
/// ```json
/// { "kind": "optional", "inner": { "kind": "string" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeShape {
    /// Nullable wrapper around another shape.
    Optional {
        /// Wrapped shape.
        inner: Box<TypeShape>,
    },
    /// Platform-sized signed integer.
    Int,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Platform-sized unsigned integer.
    Uint,
    /// Byte.
    Uint8,
    /// 32-bit unsigned integer.
    Uint32,
    /// 64-bit unsigned integer.
    Uint64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Anonymous struct body.
    Struct,
    /// Key/value map.
    Map {
        /// Key shape.
        key: Box<TypeShape>,
        /// Value shape.
        value: Box<TypeShape>,
    },
    /// Fixed-size array.
    Array {
        /// Number of elements.
        len: usize,
        /// Element shape.
        element: Box<TypeShape>,
    },
    /// Growable list.
    List {
        /// Element shape.
        element: Box<TypeShape>,
    },
    /// A named type, possibly from another module.
    Named {
        /// Module path; empty for local aliases of built-in types.
        #[serde(default)]
        path: String,
        /// Type name.
        name: String,
        /// Shape the name stands for.
        underlying: Box<TypeShape>,
        /// Whether the type encodes itself to a single scalar column.
        #[serde(default)]
        value_codec: bool,
    },
    /// Any kind outside the supported set.
    Other {
        /// Kind as reported by the source.
        raw: String,
    },
}

impl TypeShape {
    /// Wraps a shape as nullable.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional {
            inner: Box::new(inner),
        }
    }

    /// Creates a list shape.
    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::List {
            element: Box::new(element),
        }
    }

    /// Creates a fixed-size array shape.
    #[must_use]
    pub fn array(len: usize, element: Self) -> Self {
        Self::Array {
            len,
            element: Box::new(element),
        }
    }

    /// Creates a map shape.
    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Creates a named shape from another module.
    #[must_use]
    pub fn named(path: &str, name: &str, underlying: Self) -> Self {
        Self::Named {
            path: String::from(path),
            name: String::from(name),
            underlying: Box::new(underlying),
            value_codec: false,
        }
    }

    /// Creates a named shape that encodes itself to a single column.
    #[must_use]
    pub fn codec(path: &str, name: &str, underlying: Self) -> Self {
        Self::Named {
            path: String::from(path),
            name: String::from(name),
            underlying: Box::new(underlying),
            value_codec: true,
        }
    }

    const fn scalar_kind(&self) -> Option<Kind> {
        match self {
            Self::Int => Some(Kind::Int),
            Self::Int32 => Some(Kind::Int32),
            Self::Int64 => Some(Kind::Int64),
            Self::Uint => Some(Kind::Uint),
            Self::Uint8 => Some(Kind::Uint8),
            Self::Uint32 => Some(Kind::Uint32),
            Self::Uint64 => Some(Kind::Uint64),
            Self::Float32 => Some(Kind::Float32),
            Self::Float64 => Some(Kind::Float64),
            Self::Bool => Some(Kind::Bool),
            Self::String => Some(Kind::String),
            _ => None,
        }
    }
}

/// Resolved storage description of a field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Storage kind.
    pub kind: Kind,
    /// Whether the field can hold NULL.
    pub nullable: bool,
    /// Fully-qualified name for named types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Element type for lists, arrays and map values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<TypeDescriptor>>,
    /// Key type for maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Box<TypeDescriptor>>,
    /// Length of fixed-size arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,
    /// Whether the type encodes itself to a single scalar column.
    pub value_codec: bool,
}

impl TypeDescriptor {
    /// Creates a non-nullable scalar descriptor.
    #[must_use]
    pub const fn scalar(kind: Kind) -> Self {
        Self {
            kind,
            nullable: false,
            name: None,
            element: None,
            key: None,
            len: None,
            value_codec: false,
        }
    }

    /// Resolves the descriptor of a Rust type.
    pub fn of<T: Shaped>() -> Result<Self> {
        Self::resolve(&T::shape())
    }

    /// Resolves a raw shape into a descriptor.
    ///
    /// Optional wrappers are stripped and recorded as `nullable`. Named
    /// shapes without a module path collapse to their underlying shape;
    /// named shapes with a path keep their qualified name and become
    /// `External`, `Struct`, or a named container.
    pub fn resolve(shape: &TypeShape) -> Result<Self> {
        resolve_shape(shape).map_err(Into::into)
    }

    /// Returns the fully-qualified name, if the type is named.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns whether the column stores a list or array of bytes.
    #[must_use]
    pub fn is_bytes(&self) -> bool {
        matches!(self.kind, Kind::Slice | Kind::Array)
            && self
                .element
                .as_deref()
                .is_some_and(|element| element.kind == Kind::Uint8 && !element.nullable)
    }

    /// Returns whether values must go through the SQL array adapter.
    #[must_use]
    pub fn needs_array_adapter(&self) -> bool {
        matches!(self.kind, Kind::Slice | Kind::Array) && !self.value_codec && !self.is_bytes()
    }

    /// Returns whether values must go through the JSON adapter.
    #[must_use]
    pub fn needs_json_adapter(&self) -> bool {
        self.kind == Kind::Map && !self.value_codec
    }

    /// Returns whether the dialect must provide native container support.
    #[must_use]
    pub fn needs_container_support(&self) -> bool {
        self.needs_array_adapter() || self.needs_json_adapter()
    }

    /// Returns whether identity values of this type are strings.
    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind == Kind::String
    }
}

fn resolve_shape(shape: &TypeShape) -> std::result::Result<TypeDescriptor, TypeResolutionError> {
    if let Some(kind) = shape.scalar_kind() {
        return Ok(TypeDescriptor::scalar(kind));
    }

    match shape {
        TypeShape::Optional { inner } => {
            let mut descriptor = resolve_shape(inner)?;
            descriptor.nullable = true;
            Ok(descriptor)
        }
        TypeShape::Struct => Ok(TypeDescriptor::scalar(Kind::Struct)),
        TypeShape::Map { key, value } => Ok(TypeDescriptor {
            key: Some(Box::new(resolve_shape(key)?)),
            element: Some(Box::new(resolve_shape(value)?)),
            ..TypeDescriptor::scalar(Kind::Map)
        }),
        TypeShape::Array { len, element } => Ok(TypeDescriptor {
            element: Some(Box::new(resolve_shape(element)?)),
            len: Some(*len),
            ..TypeDescriptor::scalar(Kind::Array)
        }),
        TypeShape::List { element } => Ok(TypeDescriptor {
            element: Some(Box::new(resolve_shape(element)?)),
            ..TypeDescriptor::scalar(Kind::Slice)
        }),
        TypeShape::Named {
            path,
            name,
            underlying,
            value_codec,
        } => resolve_named(path, name, underlying, *value_codec),
        TypeShape::Other { raw } => Err(TypeResolutionError::Unsupported { raw: raw.clone() }),
        // Scalars returned above.
        _ => Err(TypeResolutionError::Unsupported {
            raw: format!("{shape:?}"),
        }),
    }
}

fn resolve_named(
    path: &str,
    name: &str,
    underlying: &TypeShape,
    value_codec: bool,
) -> std::result::Result<TypeDescriptor, TypeResolutionError> {
    if name.is_empty() {
        return Err(TypeResolutionError::MissingName {
            path: String::from(path),
        });
    }

    let inner = resolve_shape(underlying)?;
    if path.is_empty() && !value_codec {
        return Ok(inner);
    }

    let qualified = if path.is_empty() {
        String::from(name)
    } else {
        format!("{path}::{name}")
    };

    if value_codec {
        return Ok(TypeDescriptor {
            nullable: inner.nullable,
            name: Some(qualified),
            value_codec: true,
            ..TypeDescriptor::scalar(Kind::External)
        });
    }

    let kind = match inner.kind {
        Kind::Struct => Kind::Struct,
        kind if kind.is_container() => kind,
        _ => Kind::External,
    };
    Ok(TypeDescriptor {
        kind,
        name: Some(qualified),
        ..inner
    })
}

/// Types that can describe their own shape.
///
/// Implemented for the scalar types, `Option`, `Vec`, fixed-size arrays,
/// maps, and the common value-codec types. Custom types implement it to
/// take part in `#[derive(Record)]`.
pub trait Shaped {
    /// Returns the raw shape of the type.
    fn shape() -> TypeShape;
}

macro_rules! impl_shaped_scalar {
    ($($ty:ty => $shape:ident),+ $(,)?) => {
        $(
            impl Shaped for $ty {
                fn shape() -> TypeShape {
                    TypeShape::$shape
                }
            }
        )+
    };
}

impl_shaped_scalar!(
    isize => Int,
    i32 => Int32,
    i64 => Int64,
    usize => Uint,
    u8 => Uint8,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    bool => Bool,
    String => String,
);

impl<T: Shaped> Shaped for Option<T> {
    fn shape() -> TypeShape {
        TypeShape::optional(T::shape())
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::list(T::shape())
    }
}

impl<T: Shaped, const N: usize> Shaped for [T; N] {
    fn shape() -> TypeShape {
        TypeShape::array(N, T::shape())
    }
}

impl<K: Shaped, V: Shaped, S> Shaped for HashMap<K, V, S> {
    fn shape() -> TypeShape {
        TypeShape::map(K::shape(), V::shape())
    }
}

impl<K: Shaped, V: Shaped> Shaped for BTreeMap<K, V> {
    fn shape() -> TypeShape {
        TypeShape::map(K::shape(), V::shape())
    }
}

impl Shaped for chrono::DateTime<chrono::Utc> {
    fn shape() -> TypeShape {
        TypeShape::codec("chrono", "DateTime<Utc>", TypeShape::Struct)
    }
}

impl Shaped for serde_json::Value {
    fn shape() -> TypeShape {
        TypeShape::codec("serde_json", "Value", TypeShape::Struct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_resolution() {
        let descriptor = TypeDescriptor::of::<i64>().unwrap();
        assert_eq!(descriptor.kind, Kind::Int64);
        assert!(!descriptor.nullable);
        assert!(descriptor.element.is_none());
    }

    #[test]
    fn test_optional_sets_nullable() {
        let descriptor = TypeDescriptor::of::<Option<String>>().unwrap();
        assert_eq!(descriptor.kind, Kind::String);
        assert!(descriptor.nullable);
    }

    #[test]
    fn test_containers_carry_elements() {
        let list = TypeDescriptor::of::<Vec<Option<i32>>>().unwrap();
        assert_eq!(list.kind, Kind::Slice);
        let element = list.element.as_deref().unwrap();
        assert_eq!(element.kind, Kind::Int32);
        assert!(element.nullable);
        assert!(list.needs_array_adapter());

        let array = TypeDescriptor::of::<[f64; 3]>().unwrap();
        assert_eq!(array.kind, Kind::Array);
        assert_eq!(array.len, Some(3));

        let map = TypeDescriptor::of::<HashMap<String, bool>>().unwrap();
        assert_eq!(map.kind, Kind::Map);
        assert_eq!(map.key.as_deref().unwrap().kind, Kind::String);
        assert_eq!(map.element.as_deref().unwrap().kind, Kind::Bool);
        assert!(map.needs_json_adapter());
    }

    #[test]
    fn test_bytes_skip_array_adapter() {
        let bytes = TypeDescriptor::of::<Vec<u8>>().unwrap();
        assert!(bytes.is_bytes());
        assert!(!bytes.needs_array_adapter());
    }

    #[test]
    fn test_local_named_collapses_to_scalar() {
        let shape = TypeShape::Named {
            path: String::new(),
            name: String::from("Age"),
            underlying: Box::new(TypeShape::Int32),
            value_codec: false,
        };
        assert_eq!(
            TypeDescriptor::resolve(&shape).unwrap(),
            TypeDescriptor::scalar(Kind::Int32)
        );
    }

    #[test]
    fn test_external_named_keeps_identity() {
        let shape = TypeShape::named("billing", "Status", TypeShape::String);
        let descriptor = TypeDescriptor::resolve(&shape).unwrap();
        assert_eq!(descriptor.kind, Kind::External);
        assert_eq!(descriptor.name(), Some("billing::Status"));

        let shape = TypeShape::named("geo", "Point", TypeShape::Struct);
        assert_eq!(TypeDescriptor::resolve(&shape).unwrap().kind, Kind::Struct);

        let shape = TypeShape::named("tags", "Tags", TypeShape::list(TypeShape::String));
        let descriptor = TypeDescriptor::resolve(&shape).unwrap();
        assert_eq!(descriptor.kind, Kind::Slice);
        assert!(descriptor.needs_array_adapter());
    }

    #[test]
    fn test_value_codec_is_not_wrapped() {
        let shape = TypeShape::codec("ids", "Uuid", TypeShape::array(16, TypeShape::Uint8));
        let descriptor = TypeDescriptor::resolve(&shape).unwrap();
        assert_eq!(descriptor.kind, Kind::External);
        assert!(descriptor.value_codec);
        assert!(!descriptor.needs_container_support());

        let timestamp = TypeDescriptor::of::<Option<chrono::DateTime<chrono::Utc>>>().unwrap();
        assert!(timestamp.value_codec);
        assert!(timestamp.nullable);
    }

    #[test]
    fn test_unsupported_kind() {
        let err = TypeDescriptor::resolve(&TypeShape::Other {
            raw: String::from("chan"),
        })
        .unwrap_err();
        assert!(err.to_string().contains("unsupported field type 'chan'"));

        let nested = TypeShape::list(TypeShape::Other {
            raw: String::from("func"),
        });
        assert!(TypeDescriptor::resolve(&nested).is_err());
    }

    #[test]
    fn test_missing_name() {
        let shape = TypeShape::named("models", "", TypeShape::Int);
        let err = resolve_shape(&shape).unwrap_err();
        assert_eq!(
            err,
            TypeResolutionError::MissingName {
                path: String::from("models")
            }
        );
    }

    #[test]
    fn test_shape_from_json() {
        let shape: TypeShape =
            serde_json::from_str(r#"{"kind":"optional","inner":{"kind":"list","element":{"kind":"string"}}}"#)
                .unwrap();
        let descriptor = TypeDescriptor::resolve(&shape).unwrap();
        assert_eq!(descriptor.kind, Kind::Slice);
        assert!(descriptor.nullable);
    }
}
