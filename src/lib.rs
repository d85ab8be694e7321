//! dlbind - Runtime Native Interface Binding
//!
//! Synthesizes, at runtime, a working implementation of a caller-declared
//! interface whose operations forward to entry points inside a dynamically
//! loaded native library. Values in the fixed complex catalogue (strings,
//! booleans, optional-by-value wrappers) are automatically lowered to the
//! primitive representations the native calling convention understands and
//! raised back on return; everything else crosses the boundary blittably.
//!
//! # Architecture
//!
//! ```text
//! Caller
//!   │
//!   ▼
//! InterfaceBuilder (declared methods + options)
//!   │
//!   ▼
//! PathResolver (env paths → loader cache → fallback dirs)
//!   │
//!   ▼
//! BindingSynthesizer (lowering plan + eager/lazy symbol slot per method)
//!   │
//!   ▼
//! NativeInstance (dispatch table over the loaded library)
//!   │
//!   ▼
//! Native Function Call (libloading)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dlbind::{InterfaceBuilder, MethodSpec, Value, ValueKind};
//!
//! let instance = InterfaceBuilder::new()
//!     .method(MethodSpec::new("strlen", vec![ValueKind::Str], ValueKind::U64))
//!     .activate("libc.so.6")?;
//!
//! let len = instance.call("strlen", &[Value::Str(Some("hello".into()))])?;
//! instance.dispose();
//! ```

mod activate;
mod binding;
mod demangle;
mod error;
mod instance;
mod library;
mod manifest;
mod resolve;
mod transform;
mod types;

pub use activate::{ActivationOptions, InterfaceBuilder};
pub use binding::{
    BindingSynthesizer, CallingConvention, MethodBinding, MethodSpec, ResolutionMode,
    SymbolMetadata,
};
pub use demangle::{DemangleOptions, DemangleStyle, SymbolDemangler};
pub use error::{BindError, BindResult};
pub use instance::NativeInstance;
pub use library::SharedLibrary;
pub use manifest::{InterfaceManifest, ManifestError, MethodEntry};
pub use resolve::{platform_library_name, PathResolver};
pub use transform::{
    BoolTransformer, OptionTransformer, StringTransformer, TransformerRepository, TypeTransformer,
};
pub use types::{Signature, Value, ValueKind};
