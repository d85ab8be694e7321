//! Declarative interface manifests (TOML).
//!
//! Lets an interface be declared in configuration instead of code:
//!
//! ```toml
//! library = "libc.so.6"
//!
//! [options]
//! resolution = "lazy"
//!
//! [[methods]]
//! name = "string_length"
//! params = ["str"]
//! returns = "u64"
//! entry_point = "strlen"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activate::{ActivationOptions, InterfaceBuilder};
use crate::binding::{CallingConvention, MethodSpec};
use crate::error::BindError;
use crate::instance::NativeInstance;
use crate::types::ValueKind;

/// Manifest errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown value kind '{0}' in manifest")]
    UnknownKind(String),

    #[error(transparent)]
    Bind(#[from] BindError),
}

/// One declared method in a manifest. Kinds are spelled as strings and
/// parsed by `ValueKind::parse`; a trailing `?` marks an optional wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodEntry {
    /// Method name on the interface
    pub name: String,
    /// Parameter kinds
    #[serde(default)]
    pub params: Vec<String>,
    /// Return kind
    #[serde(default = "default_returns")]
    pub returns: String,
    /// Optional native entry point override
    #[serde(default)]
    pub entry_point: Option<String>,
    /// Optional calling convention tag
    #[serde(default)]
    pub convention: Option<CallingConvention>,
}

fn default_returns() -> String {
    "void".to_string()
}

/// A complete declarative interface description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceManifest {
    /// Library name, resolved through the platform search order
    pub library: String,
    /// Activation options
    #[serde(default)]
    pub options: ActivationOptions,
    /// Declared methods
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

impl InterfaceManifest {
    /// Load a manifest from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a manifest from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Convert the manifest into a populated builder
    pub fn builder(&self) -> Result<InterfaceBuilder, ManifestError> {
        let mut builder = InterfaceBuilder::new().options(self.options);
        for entry in &self.methods {
            builder = builder.method(entry.to_spec()?);
        }
        Ok(builder)
    }

    /// Activate an instance of the declared interface
    pub fn activate(&self) -> Result<NativeInstance, ManifestError> {
        Ok(self.builder()?.activate(&self.library)?)
    }
}

impl MethodEntry {
    fn to_spec(&self) -> Result<MethodSpec, ManifestError> {
        let parse = |s: &str| {
            ValueKind::parse(s).ok_or_else(|| ManifestError::UnknownKind(s.to_string()))
        };

        let params = self
            .params
            .iter()
            .map(|p| parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        let ret = parse(&self.returns)?;

        let mut spec = MethodSpec::new(self.name.clone(), params, ret);
        if let Some(entry_point) = &self.entry_point {
            spec = spec.with_entry_point(entry_point.clone());
        }
        if let Some(convention) = self.convention {
            spec = spec.with_convention(convention);
        }
        Ok(spec)
    }
}
