//! Transformers for the fixed complex catalogue.

use std::ffi::{CStr, CString};

use crate::error::{BindError, BindResult};
use crate::types::{Value, ValueKind};

/// Lowers owned strings to NUL-terminated pointers and raises returned
/// `char*` results back to owned strings. A `None` string crosses the
/// boundary as a null pointer in both directions.
pub struct StringTransformer;

impl super::TypeTransformer for StringTransformer {
    fn simple_kind(&self) -> ValueKind {
        ValueKind::Ptr
    }

    fn lower(&self, value: Value) -> BindResult<Value> {
        match value {
            Value::Str(Some(s)) => {
                let c = CString::new(s).map_err(|_| {
                    BindError::Marshal("string contains an interior NUL byte".to_string())
                })?;
                Ok(Value::CString(c))
            }
            Value::Str(None) => Ok(Value::Ptr(0)),
            other => Err(BindError::Marshal(format!(
                "expected a string value, got {}",
                other.kind()
            ))),
        }
    }

    fn raise(&self, value: Value) -> BindResult<Value> {
        let addr = match value {
            Value::Ptr(p) => p,
            Value::CString(c) => {
                // Round trip of a still-lowered value
                return Ok(Value::Str(Some(
                    c.into_string()
                        .map_err(|e| BindError::Marshal(e.to_string()))?,
                )));
            }
            other => {
                return Err(BindError::Marshal(format!(
                    "expected a pointer result, got {}",
                    other.kind()
                )))
            }
        };

        if addr == 0 {
            return Ok(Value::Str(None));
        }

        // Safety: the native side handed back this pointer as a C string;
        // the contents are copied out before the caller regains control.
        let s = unsafe { CStr::from_ptr(addr as *const libc::c_char) }
            .to_str()
            .map_err(|e| BindError::Marshal(format!("invalid UTF-8 in native string: {}", e)))?
            .to_owned();
        Ok(Value::Str(Some(s)))
    }
}

/// Lowers booleans to a single integer byte (1/0); any nonzero native
/// result raises to `true`.
pub struct BoolTransformer;

impl super::TypeTransformer for BoolTransformer {
    fn simple_kind(&self) -> ValueKind {
        ValueKind::I8
    }

    fn lower(&self, value: Value) -> BindResult<Value> {
        match value {
            Value::Bool(b) => Ok(Value::Int(b as i64)),
            other => Err(BindError::Marshal(format!(
                "expected a boolean value, got {}",
                other.kind()
            ))),
        }
    }

    fn raise(&self, value: Value) -> BindResult<Value> {
        match value {
            Value::Int(v) => Ok(Value::Bool(v != 0)),
            Value::UInt(v) => Ok(Value::Bool(v != 0)),
            Value::Ptr(v) => Ok(Value::Bool(v != 0)),
            other => Err(BindError::Marshal(format!(
                "expected an integer result, got {}",
                other.kind()
            ))),
        }
    }
}

/// Lowers optional-by-value wrappers to a nullable pointer: `Some(v)`
/// becomes a pointer to an owned word slot holding the inner value, `None`
/// becomes null. The inner kind must be blittable.
pub struct OptionTransformer {
    inner: ValueKind,
}

impl OptionTransformer {
    /// Create a transformer for `Opt(inner)`
    pub fn new(inner: ValueKind) -> BindResult<Self> {
        if inner.requires_lowering() {
            return Err(BindError::Marshal(format!(
                "optional wrapper around complex type '{}' is not supported",
                inner
            )));
        }
        Ok(Self { inner })
    }

    /// The inner kind the wrapped value carries
    pub fn inner_kind(&self) -> &ValueKind {
        &self.inner
    }
}

impl super::TypeTransformer for OptionTransformer {
    fn simple_kind(&self) -> ValueKind {
        ValueKind::Ptr
    }

    fn lower(&self, value: Value) -> BindResult<Value> {
        match value {
            Value::Opt(Some(v)) => Ok(Value::Slot(Some(Box::new(v.to_word())))),
            Value::Opt(None) => Ok(Value::Slot(None)),
            other => Err(BindError::Marshal(format!(
                "expected an optional value, got {}",
                other.kind()
            ))),
        }
    }

    fn raise(&self, value: Value) -> BindResult<Value> {
        let addr = match value {
            Value::Ptr(p) => p,
            Value::Slot(None) => 0,
            Value::Slot(Some(word)) => {
                // Round trip of a still-lowered value
                return Ok(Value::Opt(Some(Box::new(Value::from_word(
                    *word,
                    &self.inner,
                )))));
            }
            other => {
                return Err(BindError::Marshal(format!(
                    "expected a pointer result, got {}",
                    other.kind()
                )))
            }
        };

        if addr == 0 {
            return Ok(Value::Opt(None));
        }

        // Safety: a non-null result points at a value slot of the inner
        // kind; it is read once, immediately, into an owned value.
        let word = unsafe { (addr as *const u64).read_unaligned() };
        Ok(Value::Opt(Some(Box::new(Value::from_word(
            word,
            &self.inner,
        )))))
    }
}
