//! Primitive value shapes.
//!
//! A primitive is a type whose instances are plain values instead of heap objects. Every
//! primitive has a storage representation (size and alignment inside an instance), a zero
//! value and a boxed wrapper type in the [`CoreLibrary`](crate::CoreLibrary).
//!
//! | Kind | Storage | Zero value | Wrapper |
//! |------|---------|------------|---------|
//! | `bool` | 1 byte | `false` | `Boolean` |
//! | `char` | 4 bytes | `'\0'` | `Char` |
//! | `i8` | 1 byte | `0` | `Int8` |
//! | `i16` | 2 bytes | `0` | `Int16` |
//! | `i32` | 4 bytes | `0` | `Int32` |
//! | `i64` | 8 bytes | `0` | `Int64` |
//! | `f32` | 4 bytes | `0.0` | `Float32` |
//! | `f64` | 8 bytes | `0.0` | `Float64` |

use std::alloc::Layout;

use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

use crate::value::Value;

/// The primitive kinds known to the runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumCount, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveKind {
    /// Boolean, stored as a single byte (0 = false)
    Bool,
    /// Unicode scalar value, stored as its 32-bit code point
    Char,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl PrimitiveKind {
    /// The name of the primitive type, e.g. `i32`
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The simple name of the boxed wrapper type of this primitive
    #[must_use]
    pub fn wrapper_name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "Boolean",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::I8 => "Int8",
            PrimitiveKind::I16 => "Int16",
            PrimitiveKind::I32 => "Int32",
            PrimitiveKind::I64 => "Int64",
            PrimitiveKind::F32 => "Float32",
            PrimitiveKind::F64 => "Float64",
        }
    }

    /// Storage layout of the primitive inside an instance
    #[must_use]
    pub fn layout(self) -> Layout {
        match self {
            PrimitiveKind::Bool => Layout::new::<u8>(),
            PrimitiveKind::Char => Layout::new::<u32>(),
            PrimitiveKind::I8 => Layout::new::<i8>(),
            PrimitiveKind::I16 => Layout::new::<i16>(),
            PrimitiveKind::I32 => Layout::new::<i32>(),
            PrimitiveKind::I64 => Layout::new::<i64>(),
            PrimitiveKind::F32 => Layout::new::<f32>(),
            PrimitiveKind::F64 => Layout::new::<f64>(),
        }
    }

    /// Number of bytes the primitive occupies inside instance storage
    #[must_use]
    pub fn size(self) -> usize {
        self.layout().size()
    }

    /// Required alignment of the primitive inside instance storage
    #[must_use]
    pub fn align(self) -> usize {
        self.layout().align()
    }

    /// The value an all-zero storage slot of this kind represents
    #[must_use]
    pub fn zero(self) -> Value {
        match self {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::Char => Value::Char('\0'),
            PrimitiveKind::I8 => Value::I8(0),
            PrimitiveKind::I16 => Value::I16(0),
            PrimitiveKind::I32 => Value::I32(0),
            PrimitiveKind::I64 => Value::I64(0),
            PrimitiveKind::F32 => Value::F32(0.0),
            PrimitiveKind::F64 => Value::F64(0.0),
        }
    }
}
