//! Library path resolution.
//!
//! Locates a named native library file on disk using the platform search
//! order: directories from a colon-separated environment variable, then the
//! flat NUL-delimited loader cache, then a fixed list of system directories.
//! Absent environment configuration and missing cache files contribute no
//! candidates; only a library that exists nowhere produces an error.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{BindError, BindResult};

/// Resolves library names to full on-disk paths.
///
/// All three search knobs carry platform defaults but are plain fields, so
/// embedders and tests can construct hermetic resolvers.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Environment variable holding colon-separated search directories
    search_path_var: String,
    /// Flat NUL-delimited loader cache file
    cache_path: PathBuf,
    /// Standard system directories, consulted last, in order
    fallback_dirs: Vec<PathBuf>,
}

impl PathResolver {
    /// Create a resolver with the platform search order
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with explicit search knobs
    pub fn with_search(
        search_path_var: impl Into<String>,
        cache_path: impl Into<PathBuf>,
        fallback_dirs: Vec<PathBuf>,
    ) -> Self {
        Self {
            search_path_var: search_path_var.into(),
            cache_path: cache_path.into(),
            fallback_dirs,
        }
    }

    /// Resolve a library name to the first existing path in the search
    /// order. Returns `BindError::LibraryNotFound` carrying the original
    /// name when no candidate exists anywhere; never panics on missing
    /// environment configuration.
    pub fn resolve(&self, library: &str) -> BindResult<PathBuf> {
        if let Ok(paths) = env::var(&self.search_path_var) {
            for dir in paths.split(':').filter(|p| !p.trim().is_empty()) {
                let candidate = Path::new(dir).join(library);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }

        if let Some(cached) = self.resolve_from_cache(library) {
            return Ok(cached);
        }

        for dir in &self.fallback_dirs {
            let candidate = dir.join(library);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(BindError::LibraryNotFound(library.to_string()))
    }

    /// Scan the loader cache for an entry matching the library. The cache
    /// is a flat blob of NUL-separated path strings; an entry matches when
    /// it ends with the requested name AND its basename equals the name
    /// exactly, so `libfoo.so` never matches a request for `foo.so`.
    fn resolve_from_cache(&self, library: &str) -> Option<PathBuf> {
        let raw = std::fs::read(&self.cache_path).ok()?;
        let wanted = Path::new(library).file_name()?;

        for chunk in raw.split(|&b| b == 0) {
            let entry = String::from_utf8_lossy(chunk);
            if !entry.ends_with(library) {
                continue;
            }
            let candidate = Path::new(entry.as_ref());
            if candidate.file_name() == Some(wanted) && candidate.is_file() {
                return Some(candidate.to_path_buf());
            }
        }

        None
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        #[cfg(target_os = "linux")]
        {
            Self {
                search_path_var: "LD_LIBRARY_PATH".to_string(),
                cache_path: PathBuf::from("/etc/ld.so.cache"),
                fallback_dirs: vec![
                    PathBuf::from("/lib"),
                    PathBuf::from("/usr/lib"),
                    PathBuf::from("/usr/local/lib"),
                    PathBuf::from("/lib64"),
                    PathBuf::from("/usr/lib64"),
                ],
            }
        }

        #[cfg(target_os = "macos")]
        {
            // No loader cache on macOS; the nonexistent path yields no candidates
            Self {
                search_path_var: "DYLD_LIBRARY_PATH".to_string(),
                cache_path: PathBuf::from("/var/db/dyld/nonexistent.cache"),
                fallback_dirs: vec![
                    PathBuf::from("/usr/lib"),
                    PathBuf::from("/usr/local/lib"),
                    PathBuf::from("/opt/homebrew/lib"),
                ],
            }
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            Self {
                search_path_var: "LD_LIBRARY_PATH".to_string(),
                cache_path: PathBuf::from("/etc/ld.so.cache"),
                fallback_dirs: Vec::new(),
            }
        }
    }
}

/// Construct the platform-specific filename for a bare library name,
/// e.g. `iberty` becomes `libiberty.so` on Linux.
pub fn platform_library_name(name: &str) -> String {
    #[cfg(target_os = "linux")]
    {
        if name.starts_with("lib") && name.contains(".so") {
            name.to_string()
        } else {
            format!("lib{}.so", name)
        }
    }

    #[cfg(target_os = "macos")]
    {
        if name.starts_with("lib") && name.ends_with(".dylib") {
            name.to_string()
        } else {
            format!("lib{}.dylib", name)
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        name.to_string()
    }
}
