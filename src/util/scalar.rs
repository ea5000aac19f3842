//! Scalar types - the fixed-width numeric storage types of PLY properties.

use std::fmt;

use super::{Error, Result};

/// Scalar type code.
///
/// Every PLY property value, and every list count, is stored as one of these
/// types. Each type has a fixed size and a well-defined binary representation
/// (two's-complement integers, IEEE 754 floats).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ScalarType {
    /// Signed 8-bit integer (`char`)
    Int8 = 1,
    /// Unsigned 8-bit integer (`uchar`)
    Uint8 = 2,
    /// Signed 16-bit integer (`short`)
    Int16 = 3,
    /// Unsigned 16-bit integer (`ushort`)
    Uint16 = 4,
    /// Signed 32-bit integer (`int`)
    Int32 = 5,
    /// Unsigned 32-bit integer (`uint`)
    Uint32 = 6,
    /// 32-bit floating point (`float`)
    Float32 = 7,
    /// 64-bit floating point (`double`)
    Float64 = 8,
}

impl ScalarType {
    /// All scalar types, in type code order.
    pub const ALL: [Self; 8] = [
        Self::Int8,
        Self::Uint8,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::Float32,
        Self::Float64,
    ];

    /// Returns the size in bytes of a single value of this type.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Returns the canonical PLY name of this type, as written in headers.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "char",
            Self::Uint8 => "uchar",
            Self::Int16 => "short",
            Self::Uint16 => "ushort",
            Self::Int32 => "int",
            Self::Uint32 => "uint",
            Self::Float32 => "float",
            Self::Float64 => "double",
        }
    }

    /// Parse a type token, accepting the PLY names and their sized aliases.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "char" | "int8" => Ok(Self::Int8),
            "uchar" | "uint8" => Ok(Self::Uint8),
            "short" | "int16" => Ok(Self::Int16),
            "ushort" | "uint16" => Ok(Self::Uint16),
            "int" | "int32" => Ok(Self::Int32),
            "uint" | "uint32" => Ok(Self::Uint32),
            "float" | "float32" => Ok(Self::Float32),
            "double" | "float64" => Ok(Self::Float64),
            _ => Err(Error::UnsupportedType(name.to_string())),
        }
    }

    /// Returns true if this is an integer type.
    #[inline]
    pub const fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// Returns true if this is a floating point type.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns true if this type can hold negative values.
    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Float32 | Self::Float64
        )
    }

    /// Parse a decimal ASCII token as a value of this type.
    ///
    /// Integer tokens must be in range for the type; no float-to-int
    /// coercion is performed.
    pub fn parse(self, token: &str) -> Option<Scalar> {
        let value = match self {
            Self::Int8 => Scalar::Int8(token.parse().ok()?),
            Self::Uint8 => Scalar::Uint8(token.parse().ok()?),
            Self::Int16 => Scalar::Int16(token.parse().ok()?),
            Self::Uint16 => Scalar::Uint16(token.parse().ok()?),
            Self::Int32 => Scalar::Int32(token.parse().ok()?),
            Self::Uint32 => Scalar::Uint32(token.parse().ok()?),
            Self::Float32 => Scalar::Float32(token.parse().ok()?),
            Self::Float64 => Scalar::Float64(token.parse().ok()?),
        };
        Some(value)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single decoded property value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Float32(f32),
    Float64(f64),
}

impl Scalar {
    /// The type code of this value.
    #[inline]
    pub const fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Int8(_) => ScalarType::Int8,
            Self::Uint8(_) => ScalarType::Uint8,
            Self::Int16(_) => ScalarType::Int16,
            Self::Uint16(_) => ScalarType::Uint16,
            Self::Int32(_) => ScalarType::Int32,
            Self::Uint32(_) => ScalarType::Uint32,
            Self::Float32(_) => ScalarType::Float32,
            Self::Float64(_) => ScalarType::Float64,
        }
    }

    /// Widen to f64. Exact for every type.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int8(v) => f64::from(v),
            Self::Uint8(v) => f64::from(v),
            Self::Int16(v) => f64::from(v),
            Self::Uint16(v) => f64::from(v),
            Self::Int32(v) => f64::from(v),
            Self::Uint32(v) => f64::from(v),
            Self::Float32(v) => f64::from(v),
            Self::Float64(v) => v,
        }
    }

    /// Integer value, or `None` for float values.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int8(v) => Some(i64::from(v)),
            Self::Uint8(v) => Some(i64::from(v)),
            Self::Int16(v) => Some(i64::from(v)),
            Self::Uint16(v) => Some(i64::from(v)),
            Self::Int32(v) => Some(i64::from(v)),
            Self::Uint32(v) => Some(i64::from(v)),
            Self::Float32(_) | Self::Float64(_) => None,
        }
    }

    /// Interpret this value as a list length.
    pub fn as_count(&self) -> Result<usize> {
        let count = self
            .as_i64()
            .ok_or_else(|| Error::invalid(format!("list count {self} is not an integer")))?;
        usize::try_from(count).map_err(|_| Error::invalid(format!("negative list count {count}")))
    }

    /// Build a count value of type `ty` for a list of `len` items.
    pub fn count(ty: ScalarType, len: usize) -> Result<Self> {
        let overflow = || Error::invalid(format!("list length {len} does not fit in {ty}"));
        let value = match ty {
            ScalarType::Int8 => Self::Int8(i8::try_from(len).map_err(|_| overflow())?),
            ScalarType::Uint8 => Self::Uint8(u8::try_from(len).map_err(|_| overflow())?),
            ScalarType::Int16 => Self::Int16(i16::try_from(len).map_err(|_| overflow())?),
            ScalarType::Uint16 => Self::Uint16(u16::try_from(len).map_err(|_| overflow())?),
            ScalarType::Int32 => Self::Int32(i32::try_from(len).map_err(|_| overflow())?),
            ScalarType::Uint32 => Self::Uint32(u32::try_from(len).map_err(|_| overflow())?),
            ScalarType::Float32 | ScalarType::Float64 => {
                return Err(Error::invalid(format!("list count type {ty} is not an integer")))
            }
        };
        Ok(value)
    }
}

/// Decimal text form used for ASCII payloads.
///
/// Floats use the shortest representation that parses back to the same
/// value, for every property of a given type.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int8(v) => write!(f, "{v}"),
            Self::Uint8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Uint16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Uint32(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                #[inline]
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_scalar_from! {
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    f32 => Float32,
    f64 => Float64,
}
