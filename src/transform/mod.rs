//! Type transformers and their repository.
//!
//! A native ABI understands fixed-width scalars, pointers, and blittable
//! aggregates only; convenience types must be explicitly converted at the
//! boundary. Each transformer is a pure bidirectional conversion between one
//! complex kind and its simple representation, obeying the round-trip law:
//! `raise(lower(v))` is observably equivalent to `v` for every `v` in the
//! complex domain.

mod primitives;

pub use primitives::{BoolTransformer, OptionTransformer, StringTransformer};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{BindError, BindResult};
use crate::types::{Value, ValueKind};

/// Bidirectional conversion between a complex kind and its simple
/// ABI-compatible representation.
pub trait TypeTransformer: Send + Sync {
    /// The simple kind this transformer lowers to
    fn simple_kind(&self) -> ValueKind;

    /// Convert a complex value to its simple representation
    fn lower(&self, value: Value) -> BindResult<Value>;

    /// Convert a simple native result back to the complex value
    fn raise(&self, value: Value) -> BindResult<Value>;
}

/// Registry mapping complex kinds to their transformers.
///
/// Shared by reference between the synthesizer and every activated
/// instance; never ambient global state. At most one transformer is
/// registered per complex kind, later registrations overwriting earlier
/// ones. Optional-wrapper transformers are synthesized and cached on
/// demand, one per inner kind.
pub struct TransformerRepository {
    transformers: RwLock<HashMap<ValueKind, Arc<dyn TypeTransformer>>>,
}

impl TransformerRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            transformers: RwLock::new(HashMap::new()),
        }
    }

    /// Create a repository with the default catalogue registered
    /// (strings and booleans; optionals are built on demand)
    pub fn with_defaults() -> Self {
        let repo = Self::new();
        repo.register(ValueKind::Str, Arc::new(StringTransformer));
        repo.register(ValueKind::Bool, Arc::new(BoolTransformer));
        repo
    }

    /// Register a transformer for a complex kind, overwriting any prior
    /// entry for the same kind
    pub fn register(&self, kind: ValueKind, transformer: Arc<dyn TypeTransformer>) {
        self.transformers.write().insert(kind, transformer);
    }

    /// Whether a kind must be lowered before a native call
    pub fn requires_lowering(&self, kind: &ValueKind) -> bool {
        kind.requires_lowering()
    }

    /// Get the transformer for a complex kind.
    ///
    /// Optional-wrapper kinds without an explicit registration get an
    /// `OptionTransformer` built for their inner kind and cached. Fails
    /// with `TransformerMissing` when the kind requires lowering but no
    /// transformer can be provided.
    pub fn get_complex(&self, kind: &ValueKind) -> BindResult<Arc<dyn TypeTransformer>> {
        if let Some(t) = self.transformers.read().get(kind) {
            return Ok(Arc::clone(t));
        }

        if let ValueKind::Opt(inner) = kind {
            let transformer: Arc<dyn TypeTransformer> =
                Arc::new(OptionTransformer::new((**inner).clone())?);
            self.transformers
                .write()
                .insert(kind.clone(), Arc::clone(&transformer));
            return Ok(transformer);
        }

        Err(BindError::TransformerMissing(kind.clone()))
    }
}

impl Default for TransformerRepository {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests;
