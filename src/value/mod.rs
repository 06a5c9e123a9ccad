//! Runtime values.
//!
//! [`Value`] is what slot mappers produce, constructors consume and instances hold: either a
//! primitive, `null`, or a reference to a [`ManagedObject`]. Managed objects are immutable once
//! published and shared through [`ObjectRef`].
//!
//! # Equality
//!
//! - Primitives compare by value; floats compare by bit pattern, so `NaN == NaN`
//! - References are equal if they point to the same object
//! - Strings additionally compare by content
//! - Composite instances additionally compare by type and slot values

mod instance;

use std::{fmt, sync::Arc};

pub use instance::Instance;

use crate::typesystem::{corelib, PrimitiveKind, TypeRef, WRAPPER_VALUE_SLOT};

/// Shared handle to a published managed object
pub type ObjectRef = Arc<ManagedObject>;

/// A primitive, `null` or an object reference
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Unicode scalar value
    Char(char),
    /// Signed 8-bit integer
    I8(i8),
    /// Signed 16-bit integer
    I16(i16),
    /// Signed 32-bit integer
    I32(i32),
    /// Signed 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// The null reference
    Null,
    /// A reference to a managed object
    Ref(ObjectRef),
}

impl Value {
    /// The primitive kind of the value, `None` for `null` and references
    #[must_use]
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Bool(_) => Some(PrimitiveKind::Bool),
            Value::Char(_) => Some(PrimitiveKind::Char),
            Value::I8(_) => Some(PrimitiveKind::I8),
            Value::I16(_) => Some(PrimitiveKind::I16),
            Value::I32(_) => Some(PrimitiveKind::I32),
            Value::I64(_) => Some(PrimitiveKind::I64),
            Value::F32(_) => Some(PrimitiveKind::F32),
            Value::F64(_) => Some(PrimitiveKind::F64),
            Value::Null | Value::Ref(_) => None,
        }
    }

    /// Returns `true` for the null reference
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The referenced object, if any
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Ref(object) => Some(object),
            _ => None,
        }
    }

    /// The content of a referenced string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_object().and_then(|object| object.as_str())
    }

    /// The runtime type of the value, `None` for `null`
    #[must_use]
    pub fn runtime_type(&self) -> Option<TypeRef> {
        match self {
            Value::Null => None,
            Value::Ref(object) => Some(object.type_descriptor()),
            primitive => primitive
                .primitive_kind()
                .map(|kind| corelib().primitive(kind)),
        }
    }

    /// Name of the runtime type, `null` for the null reference
    #[must_use]
    pub fn type_name(&self) -> String {
        match self.runtime_type() {
            Some(ty) => ty.name().to_string(),
            None => "null".to_string(),
        }
    }

    /// The primitive boxed by a wrapper instance
    ///
    /// Returns `None` unless the value references an instance of a wrapper class.
    #[must_use]
    pub fn unbox(&self) -> Option<Value> {
        let instance = self.as_object()?.as_instance()?;
        corelib().wrapped_primitive(instance.type_descriptor())?;
        instance.get(WRAPPER_VALUE_SLOT)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Null, Value::Null) => true,
            (Value::Ref(a), Value::Ref(b)) => Arc::ptr_eq(a, b) || **a == **b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{:?}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Null => f.write_str("null"),
            Value::Ref(object) => write!(f, "{}", object),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Ref(Arc::new(ManagedObject::Str(value.into())))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Ref(Arc::new(ManagedObject::Str(value.into_boxed_str())))
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Ref(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A fixed-length array of values
#[derive(Debug)]
pub struct ArrayObject {
    ty: TypeRef,
    elements: Box<[Value]>,
}

impl ArrayObject {
    pub(crate) fn new(ty: TypeRef, elements: Box<[Value]>) -> Self {
        ArrayObject { ty, elements }
    }

    /// The array type
    #[must_use]
    pub fn type_descriptor(&self) -> &TypeRef {
        &self.ty
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` for a zero-length array
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }

    /// All elements
    #[must_use]
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }
}

/// A published heap object
#[derive(Debug)]
pub enum ManagedObject {
    /// An instance of a class or composite
    Instance(Instance),
    /// An array
    Array(ArrayObject),
    /// An immutable string
    Str(Box<str>),
}

impl ManagedObject {
    /// The runtime type of the object
    #[must_use]
    pub fn type_descriptor(&self) -> TypeRef {
        match self {
            ManagedObject::Instance(instance) => instance.type_descriptor().clone(),
            ManagedObject::Array(array) => array.type_descriptor().clone(),
            ManagedObject::Str(_) => corelib().string(),
        }
    }

    /// The object as an instance
    #[must_use]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            ManagedObject::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// The object as an array
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayObject> {
        match self {
            ManagedObject::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The object as a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ManagedObject::Str(content) => Some(content),
            _ => None,
        }
    }
}

impl PartialEq for ManagedObject {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ManagedObject::Instance(a), ManagedObject::Instance(b)) => a == b,
            (ManagedObject::Str(a), ManagedObject::Str(b)) => a == b,
            (ManagedObject::Array(a), ManagedObject::Array(b)) => std::ptr::eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for ManagedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagedObject::Instance(instance) => write!(f, "{}", instance),
            ManagedObject::Array(array) => {
                f.write_str("[")?;
                for (index, element) in array.elements.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
            ManagedObject::Str(content) => write!(f, "{:?}", content),
        }
    }
}
