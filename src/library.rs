//! Shared library handle.
//!
//! Thin safe wrapper around libloading. Symbol addresses are handed out as
//! raw `usize` values; signature safety is the binding layer's concern.

use std::ffi::CString;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::error::{BindError, BindResult};

/// A loaded native shared library.
pub struct SharedLibrary {
    /// Path the library was loaded from
    path: PathBuf,
    /// The loaded library handle
    library: Library,
}

impl SharedLibrary {
    /// Load a library from the given path
    pub fn load(path: impl AsRef<Path>) -> BindResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Safety: loading a dynamic library runs its initializers. The
        // caller vouches for the library behind the resolved path.
        let library = unsafe {
            Library::new(&path).map_err(|source| BindError::LibraryLoad {
                path: path.display().to_string(),
                source,
            })?
        };

        Ok(Self { path, library })
    }

    /// Get the path this library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up an exported entry point by name, returning its address
    pub fn symbol(&self, name: &str) -> BindResult<usize> {
        let c_name = CString::new(name)
            .map_err(|_| BindError::Marshal(format!("invalid symbol name '{}'", name)))?;

        // Safety: the symbol is treated as an opaque address; the binding
        // that resolved it enforces the signature at the call site.
        let symbol: Symbol<*const ()> = unsafe {
            self.library
                .get(c_name.as_bytes_with_nul())
                .map_err(|_| BindError::EntryPointNotFound(name.to_string()))?
        };

        Ok(*symbol as usize)
    }
}
