//! Activation driver.
//!
//! Thin orchestration over the leaves: resolve the library path, load the
//! handle, synthesize one binding per declared method, and hand out the
//! finished instance. Activation is all-or-nothing: any resolution or
//! synthesis failure aborts the whole activation and no instance exists.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::binding::{BindingSynthesizer, MethodSpec, ResolutionMode};
use crate::error::BindResult;
use crate::instance::NativeInstance;
use crate::library::SharedLibrary;
use crate::resolve::PathResolver;
use crate::transform::TransformerRepository;

/// Configuration for one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationOptions {
    /// Eager or lazy symbol resolution, applied uniformly to all bindings
    #[serde(default)]
    pub resolution: ResolutionMode,
    /// Whether bindings fail fast on a disposed instance
    #[serde(default = "default_guards")]
    pub disposal_guards: bool,
}

fn default_guards() -> bool {
    true
}

impl Default for ActivationOptions {
    fn default() -> Self {
        Self {
            resolution: ResolutionMode::Eager,
            disposal_guards: true,
        }
    }
}

/// Builder collecting declared methods and options, then activating an
/// implementation instance against a named or explicitly located library.
///
/// Interface declaration is explicit and compile-time-visible: methods are
/// registered through this API (or a manifest), never discovered through
/// runtime introspection.
pub struct InterfaceBuilder {
    resolver: PathResolver,
    repository: Arc<TransformerRepository>,
    options: ActivationOptions,
    methods: Vec<MethodSpec>,
}

impl InterfaceBuilder {
    /// Create a builder with the default transformer catalogue
    pub fn new() -> Self {
        Self::with_repository(Arc::new(TransformerRepository::with_defaults()))
    }

    /// Create a builder over a shared transformer repository
    pub fn with_repository(repository: Arc<TransformerRepository>) -> Self {
        Self {
            resolver: PathResolver::new(),
            repository,
            options: ActivationOptions::default(),
            methods: Vec::new(),
        }
    }

    /// Use a custom path resolver
    pub fn resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the activation options
    pub fn options(mut self, options: ActivationOptions) -> Self {
        self.options = options;
        self
    }

    /// Declare one interface method
    pub fn method(mut self, spec: MethodSpec) -> Self {
        self.methods.push(spec);
        self
    }

    /// Declare several interface methods
    pub fn methods(mut self, specs: impl IntoIterator<Item = MethodSpec>) -> Self {
        self.methods.extend(specs);
        self
    }

    /// Resolve the named library and activate an instance against it
    pub fn activate(&self, library: &str) -> BindResult<NativeInstance> {
        let path = self.resolver.resolve(library)?;
        self.activate_path(path)
    }

    /// Activate an instance against an explicitly located library file
    pub fn activate_path(&self, path: impl AsRef<Path>) -> BindResult<NativeInstance> {
        let library = SharedLibrary::load(path)?;
        let synthesizer =
            BindingSynthesizer::new(Arc::clone(&self.repository), self.options.resolution);

        let mut bindings = HashMap::with_capacity(self.methods.len());
        for spec in &self.methods {
            let binding = synthesizer.synthesize(&library, spec)?;
            bindings.insert(spec.name.clone(), binding);
        }

        Ok(NativeInstance::new(
            library,
            bindings,
            Arc::clone(&self.repository),
            self.options.disposal_guards,
        ))
    }
}

impl Default for InterfaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
