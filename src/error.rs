//! Error taxonomy for binding synthesis and invocation.
//!
//! Every resolution or synthesis failure surfaces synchronously during
//! activation; call-time failures affect only the call that triggered them.
//! Nothing is swallowed, nothing is retried.

use thiserror::Error;

use crate::types::ValueKind;

/// Errors produced while resolving, synthesizing, or invoking bindings.
#[derive(Debug, Error)]
pub enum BindError {
    /// The library was not found in any loader search path.
    #[error("library '{0}' was not found in any of the loader search paths")]
    LibraryNotFound(String),

    /// The library file exists but could not be loaded.
    #[error("failed to load library '{path}': {source}")]
    LibraryLoad {
        path: String,
        #[source]
        source: libloading::Error,
    },

    /// A required entry point is not exported by the loaded library.
    #[error("entry point '{0}' was not found in the loaded library")]
    EntryPointNotFound(String),

    /// A type requires lowering but no transformer is registered for it.
    #[error("no type transformer is registered for complex type '{0}'")]
    TransformerMissing(ValueKind),

    /// The implementation instance has been disposed.
    #[error("the implementation instance has been disposed")]
    DisposedAccess,

    /// The named method was never declared on the activated interface.
    #[error("method '{0}' is not bound on this instance")]
    MethodNotBound(String),

    /// Wrong number of arguments for a bound method.
    #[error("invalid argument count: expected {expected}, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    /// More parameters than the native dispatcher supports.
    #[error("too many parameters: {0} (max 6)")]
    TooManyArgs(usize),

    /// A value could not be lowered or raised across the boundary.
    #[error("marshalling error: {0}")]
    Marshal(String),
}

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;
