//! Runtime implementation instance.
//!
//! Owns the loaded library handle and the synthesized dispatch table.
//! State machine: Uninitialized → Active (the activation driver only hands
//! out fully-bound instances) → Disposed (terminal; the handle is released
//! exactly once). Concurrent invocation of distinct methods is safe; racing
//! `dispose` against in-flight calls is an external synchronization
//! obligation, the internal lock merely keeps such a race memory-safe.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::binding::MethodBinding;
use crate::error::{BindError, BindResult};
use crate::library::SharedLibrary;
use crate::transform::TransformerRepository;
use crate::types::Value;

/// An activated implementation of a declared interface.
pub struct NativeInstance {
    /// Loaded handle; taken on disposal
    library: RwLock<Option<SharedLibrary>>,
    /// Dispatch table, method name → synthesized binding
    bindings: HashMap<String, MethodBinding>,
    /// Shared transformer repository (referenced, not owned)
    repository: Arc<TransformerRepository>,
    /// Terminal-state flag
    disposed: AtomicBool,
    /// Whether calls fail fast on a disposed instance before marshalling
    guard_disposal: bool,
}

impl NativeInstance {
    pub(crate) fn new(
        library: SharedLibrary,
        bindings: HashMap<String, MethodBinding>,
        repository: Arc<TransformerRepository>,
        guard_disposal: bool,
    ) -> Self {
        Self {
            library: RwLock::new(Some(library)),
            bindings,
            repository,
            disposed: AtomicBool::new(false),
            guard_disposal,
        }
    }

    /// Invoke a declared method by name.
    ///
    /// With disposal guards enabled, a disposed instance fails with
    /// `DisposedAccess` before any marshalling or native call occurs.
    /// Without guards the check happens at dispatch, after arguments have
    /// been validated; a released handle is never dereferenced either way.
    pub fn call(&self, method: &str, args: &[Value]) -> BindResult<Value> {
        if self.guard_disposal && self.disposed.load(Ordering::Acquire) {
            return Err(BindError::DisposedAccess);
        }

        let binding = self
            .bindings
            .get(method)
            .ok_or_else(|| BindError::MethodNotBound(method.to_string()))?;

        let guard = self.library.read();
        let library = guard.as_ref().ok_or(BindError::DisposedAccess)?;
        binding.invoke(library, args)
    }

    /// Release the library handle and mark the instance terminal.
    ///
    /// Idempotent: repeated disposal succeeds without error and the handle
    /// is freed at most once. Callers must not dispose an instance while
    /// other threads may still be invoking it.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            // First disposal wins; in-flight calls finish before the
            // write lock is granted and the handle dropped.
            *self.library.write() = None;
        }
    }

    /// Whether this instance has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Look up the synthesized binding for a method
    pub fn binding(&self, method: &str) -> Option<&MethodBinding> {
        self.bindings.get(method)
    }

    /// List the bound method names
    pub fn methods(&self) -> Vec<&str> {
        self.bindings.keys().map(String::as_str).collect()
    }

    /// The shared transformer repository this instance was bound against
    pub fn transformer_repository(&self) -> &Arc<TransformerRepository> {
        &self.repository
    }

    /// The path of the underlying library, while not disposed
    pub fn library_path(&self) -> Option<PathBuf> {
        self.library.read().as_ref().map(|l| l.path().to_path_buf())
    }
}
