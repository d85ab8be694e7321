//! Value model for the native boundary.
//!
//! `ValueKind` describes the types a declared interface may use; `Value`
//! carries the runtime values. Kinds outside the fixed complex catalogue
//! (strings, booleans, optional-by-value wrappers) are blittable: their
//! native representation is already bit-for-bit compatible and they cross
//! the boundary as a single call word.

use std::ffi::CString;
use std::fmt;

/// Type descriptors for interface parameters and return values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No value
    Void,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Pointer (usize, platform-dependent)
    Ptr,
    /// Boolean; complex, lowered to an integer
    Bool,
    /// Owned string; complex, lowered to a NUL-terminated pointer
    Str,
    /// Optional-by-value wrapper; complex, lowered to a nullable pointer
    Opt(Box<ValueKind>),
}

impl ValueKind {
    /// Whether this kind must be lowered to a simpler one before a native
    /// call. True exactly for strings, booleans, and optional-by-value
    /// wrappers; every other component defers to this predicate.
    pub fn requires_lowering(&self) -> bool {
        matches!(self, ValueKind::Str | ValueKind::Bool | ValueKind::Opt(_))
    }

    /// Whether this kind crosses the boundary without conversion.
    pub fn is_blittable(&self) -> bool {
        !self.requires_lowering()
    }

    /// Check if this kind is an integer kind
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueKind::U8
                | ValueKind::U16
                | ValueKind::U32
                | ValueKind::U64
                | ValueKind::I8
                | ValueKind::I16
                | ValueKind::I32
                | ValueKind::I64
        )
    }

    /// Check if this kind is a floating point kind
    pub fn is_float(&self) -> bool {
        matches!(self, ValueKind::F32 | ValueKind::F64)
    }

    /// Check if this kind is a pointer kind
    pub fn is_pointer(&self) -> bool {
        matches!(self, ValueKind::Ptr)
    }

    /// Get the size in bytes of the blittable representation
    pub fn size(&self) -> usize {
        match self {
            ValueKind::Void => 0,
            ValueKind::U8 | ValueKind::I8 | ValueKind::Bool => 1,
            ValueKind::U16 | ValueKind::I16 => 2,
            ValueKind::U32 | ValueKind::I32 | ValueKind::F32 => 4,
            ValueKind::U64 | ValueKind::I64 | ValueKind::F64 => 8,
            ValueKind::Ptr | ValueKind::Str | ValueKind::Opt(_) => std::mem::size_of::<usize>(),
        }
    }

    /// Parse from a string representation (used by interface manifests).
    /// A trailing `?` marks an optional-by-value wrapper, e.g. `i32?`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('?') {
            return Some(ValueKind::Opt(Box::new(ValueKind::parse(inner)?)));
        }
        match s.to_lowercase().as_str() {
            "void" => Some(ValueKind::Void),
            "u8" | "uint8" | "uint8_t" | "byte" => Some(ValueKind::U8),
            "u16" | "uint16" | "uint16_t" => Some(ValueKind::U16),
            "u32" | "uint32" | "uint32_t" => Some(ValueKind::U32),
            "u64" | "uint64" | "uint64_t" | "usize" | "size_t" => Some(ValueKind::U64),
            "i8" | "int8" | "int8_t" => Some(ValueKind::I8),
            "i16" | "int16" | "int16_t" => Some(ValueKind::I16),
            "i32" | "int32" | "int32_t" | "int" => Some(ValueKind::I32),
            "i64" | "int64" | "int64_t" | "long" => Some(ValueKind::I64),
            "f32" | "float" => Some(ValueKind::F32),
            "f64" | "double" => Some(ValueKind::F64),
            "ptr" | "pointer" | "void*" => Some(ValueKind::Ptr),
            "bool" | "boolean" => Some(ValueKind::Bool),
            "str" | "string" | "char*" | "const char*" => Some(ValueKind::Str),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Void => write!(f, "void"),
            ValueKind::U8 => write!(f, "u8"),
            ValueKind::U16 => write!(f, "u16"),
            ValueKind::U32 => write!(f, "u32"),
            ValueKind::U64 => write!(f, "u64"),
            ValueKind::I8 => write!(f, "i8"),
            ValueKind::I16 => write!(f, "i16"),
            ValueKind::I32 => write!(f, "i32"),
            ValueKind::I64 => write!(f, "i64"),
            ValueKind::F32 => write!(f, "f32"),
            ValueKind::F64 => write!(f, "f64"),
            ValueKind::Ptr => write!(f, "ptr"),
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Str => write!(f, "str"),
            ValueKind::Opt(inner) => write!(f, "{}?", inner),
        }
    }
}

/// A value crossing the native boundary.
///
/// `CString` and `Slot` are lowered-storage variants: they own the memory a
/// lowered argument points at and must stay alive for the duration of the
/// native call.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value
    Void,
    /// Signed integer (covers all signed widths)
    Int(i64),
    /// Unsigned integer (covers all unsigned widths)
    UInt(u64),
    /// 32-bit floating point
    F32(f32),
    /// 64-bit floating point
    F64(f64),
    /// Raw pointer value
    Ptr(usize),
    /// Boolean (complex)
    Bool(bool),
    /// Optional owned string (complex; `None` crosses as a null pointer)
    Str(Option<String>),
    /// Optional-by-value wrapper around a blittable value (complex)
    Opt(Option<Box<Value>>),
    /// Lowered string: owned NUL-terminated buffer
    CString(CString),
    /// Lowered optional: owned word slot, or null
    Slot(Option<Box<u64>>),
}

impl Value {
    /// Convert to a raw call word. Floats travel by bit pattern; lowered
    /// storage variants contribute the address of their owned memory.
    pub fn to_word(&self) -> u64 {
        match self {
            Value::Void => 0,
            Value::Int(v) => *v as u64,
            Value::UInt(v) => *v,
            Value::F32(v) => v.to_bits() as u64,
            Value::F64(v) => v.to_bits(),
            Value::Ptr(v) => *v as u64,
            Value::Bool(v) => *v as u64,
            Value::Str(Some(s)) => s.as_ptr() as u64,
            Value::Str(None) => 0,
            Value::Opt(Some(v)) => v.to_word(),
            Value::Opt(None) => 0,
            Value::CString(s) => s.as_ptr() as u64,
            Value::Slot(Some(word)) => &**word as *const u64 as u64,
            Value::Slot(None) => 0,
        }
    }

    /// Interpret a raw call word as a value of the given blittable kind.
    /// Narrow integers are truncated or sign-extended from the low bits.
    /// Complex kinds come back as raw pointers; their transformers raise
    /// them to the full value.
    pub fn from_word(word: u64, kind: &ValueKind) -> Value {
        match kind {
            ValueKind::Void => Value::Void,
            ValueKind::U8 => Value::UInt(word & 0xff),
            ValueKind::U16 => Value::UInt(word & 0xffff),
            ValueKind::U32 => Value::UInt(word & 0xffff_ffff),
            ValueKind::U64 => Value::UInt(word),
            ValueKind::I8 => Value::Int(word as u8 as i8 as i64),
            ValueKind::I16 => Value::Int(word as u16 as i16 as i64),
            ValueKind::I32 => Value::Int(word as u32 as i32 as i64),
            ValueKind::I64 => Value::Int(word as i64),
            ValueKind::F32 => Value::F32(f32::from_bits(word as u32)),
            ValueKind::F64 => Value::F64(f64::from_bits(word)),
            ValueKind::Ptr | ValueKind::Str | ValueKind::Bool | ValueKind::Opt(_) => {
                Value::Ptr(word as usize)
            }
        }
    }

    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Void => ValueKind::Void,
            Value::Int(_) => ValueKind::I64,
            Value::UInt(_) => ValueKind::U64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Ptr(_) | Value::Slot(_) => ValueKind::Ptr,
            Value::Bool(_) => ValueKind::Bool,
            Value::Str(_) | Value::CString(_) => ValueKind::Str,
            Value::Opt(Some(v)) => ValueKind::Opt(Box::new(v.kind())),
            Value::Opt(None) => ValueKind::Opt(Box::new(ValueKind::Void)),
        }
    }

    /// Get the string content, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(Some(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the boolean content, if this is a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer content, if this is an integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get the unsigned content, if this is an integer value
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) => Some(*v as u64),
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }
}

/// A method signature at one side of the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Method name
    pub name: String,
    /// Parameter kinds
    pub params: Vec<ValueKind>,
    /// Return kind
    pub ret: ValueKind,
}

impl Signature {
    /// Create a new signature
    pub fn new(name: impl Into<String>, params: Vec<ValueKind>, ret: ValueKind) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.ret, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}
