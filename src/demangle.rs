//! Symbol demangling via libiberty.
//!
//! A downstream consumer of the binding core, not part of it: the
//! demangler declares a three-method interface against the system
//! libiberty and activates it through the same machinery any caller would
//! use.

use std::ops::BitOr;

use crate::activate::InterfaceBuilder;
use crate::binding::MethodSpec;
use crate::error::{BindError, BindResult};
use crate::instance::NativeInstance;
use crate::resolve::{platform_library_name, PathResolver};
use crate::types::{Value, ValueKind};

/// Demangling styles understood by libiberty. Combined with
/// `DemangleOptions` into one flag word for the demangle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum DemangleStyle {
    None = -1,
    Unknown = 0,
    Auto = 1 << 8,
    Gnu = 1 << 9,
    Lucid = 1 << 10,
    Arm = 1 << 1,
    Hp = 1 << 12,
    Edg = 1 << 13,
    GnuV3 = 1 << 14,
    Java = 1 << 2,
    Gnat = 1 << 15,
    DLang = 1 << 16,
}

impl DemangleStyle {
    /// Map a raw libiberty style value back to the enum
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            -1 => DemangleStyle::None,
            x if x == DemangleStyle::Auto as i32 => DemangleStyle::Auto,
            x if x == DemangleStyle::Gnu as i32 => DemangleStyle::Gnu,
            x if x == DemangleStyle::Lucid as i32 => DemangleStyle::Lucid,
            x if x == DemangleStyle::Arm as i32 => DemangleStyle::Arm,
            x if x == DemangleStyle::Hp as i32 => DemangleStyle::Hp,
            x if x == DemangleStyle::Edg as i32 => DemangleStyle::Edg,
            x if x == DemangleStyle::GnuV3 as i32 => DemangleStyle::GnuV3,
            x if x == DemangleStyle::Java as i32 => DemangleStyle::Java,
            x if x == DemangleStyle::Gnat as i32 => DemangleStyle::Gnat,
            x if x == DemangleStyle::DLang as i32 => DemangleStyle::DLang,
            _ => DemangleStyle::Unknown,
        }
    }
}

/// Demangling option flags, OR-combinable with each other and a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemangleOptions(pub i32);

impl DemangleOptions {
    pub const NONE: DemangleOptions = DemangleOptions(0);
    /// Include function parameters in the demangled name
    pub const PARAMS: DemangleOptions = DemangleOptions(1 << 0);
    pub const ANSI: DemangleOptions = DemangleOptions(1 << 1);
    pub const VERBOSE: DemangleOptions = DemangleOptions(1 << 3);
    pub const TYPES: DemangleOptions = DemangleOptions(1 << 4);
    pub const RET_POSTFIX: DemangleOptions = DemangleOptions(1 << 5);
    pub const RET_DROP: DemangleOptions = DemangleOptions(1 << 6);
}

impl BitOr for DemangleOptions {
    type Output = DemangleOptions;

    fn bitor(self, rhs: DemangleOptions) -> DemangleOptions {
        DemangleOptions(self.0 | rhs.0)
    }
}

/// Demangler for C++ (and related) symbols, backed by the system
/// libiberty through an activated interface.
pub struct SymbolDemangler {
    instance: NativeInstance,
}

impl SymbolDemangler {
    /// Activate the demangling interface against the platform libiberty
    pub fn new() -> BindResult<Self> {
        Self::with_resolver(PathResolver::new())
    }

    /// Activate with a custom path resolver
    pub fn with_resolver(resolver: PathResolver) -> BindResult<Self> {
        let instance = InterfaceBuilder::new()
            .resolver(resolver)
            .method(MethodSpec::new(
                "cplus_demangle",
                vec![ValueKind::Str, ValueKind::I32],
                ValueKind::Str,
            ))
            .method(MethodSpec::new(
                "cplus_demangle_set_style",
                vec![ValueKind::I32],
                ValueKind::I32,
            ))
            .method(MethodSpec::new(
                "cplus_demangle_name_to_style",
                vec![ValueKind::Str],
                ValueKind::I32,
            ))
            .activate(&platform_library_name("iberty"))?;
        Ok(Self { instance })
    }

    /// Demangle a symbol using the given options and style. Returns `None`
    /// when libiberty does not recognize the input as a mangled name.
    pub fn demangle(
        &self,
        mangled: &str,
        options: DemangleOptions,
        style: DemangleStyle,
    ) -> BindResult<Option<String>> {
        let combined = options.0 | style as i32;
        let result = self.instance.call(
            "cplus_demangle",
            &[
                Value::Str(Some(mangled.to_string())),
                Value::Int(combined as i64),
            ],
        )?;
        match result {
            Value::Str(s) => Ok(s),
            other => Err(BindError::Marshal(format!(
                "unexpected demangle result {}",
                other.kind()
            ))),
        }
    }

    /// Detect the mangling style used for a name
    pub fn name_to_style(&self, name: &str) -> BindResult<DemangleStyle> {
        let result = self.instance.call(
            "cplus_demangle_name_to_style",
            &[Value::Str(Some(name.to_string()))],
        )?;
        let raw = result
            .as_i64()
            .ok_or_else(|| BindError::Marshal("non-integer style result".to_string()))?;
        Ok(DemangleStyle::from_raw(raw as i32))
    }

    /// Set the style used for subsequent demangling calls
    pub fn set_style(&self, style: DemangleStyle) -> BindResult<DemangleStyle> {
        let result = self
            .instance
            .call("cplus_demangle_set_style", &[Value::Int(style as i64)])?;
        let raw = result
            .as_i64()
            .ok_or_else(|| BindError::Marshal("non-integer style result".to_string()))?;
        Ok(DemangleStyle::from_raw(raw as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_combine_with_styles() {
        let combined = (DemangleOptions::PARAMS | DemangleOptions::ANSI).0
            | DemangleStyle::Auto as i32;
        assert_eq!(combined, 0b11 | (1 << 8));
    }

    #[test]
    fn style_raw_round_trip() {
        for style in [
            DemangleStyle::None,
            DemangleStyle::Auto,
            DemangleStyle::Gnu,
            DemangleStyle::GnuV3,
            DemangleStyle::Java,
        ] {
            assert_eq!(DemangleStyle::from_raw(style as i32), style);
        }
        assert_eq!(DemangleStyle::from_raw(12345), DemangleStyle::Unknown);
    }
}
