//! Method binding synthesis.
//!
//! Given one declared interface method plus its symbol metadata, the
//! synthesizer produces a `MethodBinding`: the dispatch-table entry that
//! lowers arguments, calls the native entry point, and raises the result.
//! Synthesis is pure construction except for eager symbol resolution, which
//! performs a lookup against the loaded library so that a missing entry
//! point fails the whole activation instead of some later call.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{BindError, BindResult};
use crate::library::SharedLibrary;
use crate::transform::{TransformerRepository, TypeTransformer};
use crate::types::{Signature, Value, ValueKind};

/// Calling convention tag recorded from member metadata.
///
/// On the supported 64-bit targets both map to the platform C convention;
/// the tag is carried through for diagnostics and future 32-bit dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallingConvention {
    /// Platform default C convention
    #[default]
    C,
    /// Operating-system default ("stdcall" on 32-bit Windows)
    System,
}

/// Symbol resolution policy, orthogonal to the simple/complex
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Resolve every entry point at construction, failing activation fast
    #[default]
    Eager,
    /// Defer resolution to first invocation, then cache the address
    Lazy,
}

/// Per-member override record. The entry point defaults to the declared
/// method's own name when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolMetadata {
    /// Explicit native entry point name
    pub entry_point: Option<String>,
    /// Calling convention tag
    pub convention: CallingConvention,
}

/// One declared interface method.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// Method name as declared on the interface
    pub name: String,
    /// Parameter kinds
    pub params: Vec<ValueKind>,
    /// Return kind
    pub ret: ValueKind,
    /// Per-member binding metadata
    pub metadata: SymbolMetadata,
}

impl MethodSpec {
    /// Declare a method with default metadata
    pub fn new(name: impl Into<String>, params: Vec<ValueKind>, ret: ValueKind) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            metadata: SymbolMetadata::default(),
        }
    }

    /// Override the native entry point name
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.metadata.entry_point = Some(entry_point.into());
        self
    }

    /// Tag the calling convention
    pub fn with_convention(mut self, convention: CallingConvention) -> Self {
        self.metadata.convention = convention;
        self
    }
}

/// Resolved-or-lazy entry point address.
enum SymbolSlot {
    /// Address resolved at synthesis time
    Eager(usize),
    /// Address resolved on first invocation; first successful resolution
    /// wins, concurrent resolutions cannot race or double-resolve
    Lazy {
        symbol: String,
        cell: OnceCell<usize>,
    },
}

impl SymbolSlot {
    fn address(&self, library: &SharedLibrary) -> BindResult<usize> {
        match self {
            SymbolSlot::Eager(addr) => Ok(*addr),
            SymbolSlot::Lazy { symbol, cell } => {
                cell.get_or_try_init(|| library.symbol(symbol)).copied()
            }
        }
    }
}

/// Per-parameter and return transformers, fetched at synthesis time so a
/// missing transformer fails activation, never a call.
struct LoweringPlan {
    params: Vec<Option<Arc<dyn TypeTransformer>>>,
    ret: Option<Arc<dyn TypeTransformer>>,
}

/// A synthesized binding from one interface method to a native entry point.
pub struct MethodBinding {
    symbol_name: String,
    convention: CallingConvention,
    is_lowered: bool,
    public_sig: Signature,
    native_sig: Signature,
    slot: SymbolSlot,
    plan: LoweringPlan,
}

impl MethodBinding {
    /// The native entry point name this binding dispatches to
    pub fn symbol_name(&self) -> &str {
        &self.symbol_name
    }

    /// The recorded calling convention tag
    pub fn convention(&self) -> CallingConvention {
        self.convention
    }

    /// Whether any parameter or the return type required lowering
    pub fn is_lowered(&self) -> bool {
        self.is_lowered
    }

    /// The declared (complex) signature callers see
    pub fn public_signature(&self) -> &Signature {
        &self.public_sig
    }

    /// The derived signature the native entry point is called with
    pub fn native_signature(&self) -> &Signature {
        &self.native_sig
    }

    /// The resolution policy this binding was synthesized under
    pub fn resolution_mode(&self) -> ResolutionMode {
        match self.slot {
            SymbolSlot::Eager(_) => ResolutionMode::Eager,
            SymbolSlot::Lazy { .. } => ResolutionMode::Lazy,
        }
    }

    /// Invoke the bound entry point: lower flagged arguments, call the
    /// native function, raise the result when the plan says so.
    pub fn invoke(&self, library: &SharedLibrary, args: &[Value]) -> BindResult<Value> {
        if args.len() != self.public_sig.params.len() {
            return Err(BindError::ArityMismatch {
                expected: self.public_sig.params.len(),
                got: args.len(),
            });
        }

        // Lowered storage must outlive the native call; the vector owns it.
        let mut lowered = Vec::with_capacity(args.len());
        for (arg, transformer) in args.iter().zip(self.plan.params.iter()) {
            match transformer {
                Some(t) => lowered.push(t.lower(arg.clone())?),
                None => lowered.push(arg.clone()),
            }
        }

        let addr = self.slot.address(library)?;
        let words: Vec<u64> = lowered.iter().map(Value::to_word).collect();
        let result_word = unsafe { call_words(addr, &words) };
        drop(lowered);

        let result = Value::from_word(result_word, &self.native_sig.ret);
        match &self.plan.ret {
            Some(t) => t.raise(result),
            None => Ok(result),
        }
    }
}

/// Produces method bindings against a shared transformer repository.
pub struct BindingSynthesizer {
    repository: Arc<TransformerRepository>,
    mode: ResolutionMode,
}

impl BindingSynthesizer {
    /// Create a synthesizer
    pub fn new(repository: Arc<TransformerRepository>, mode: ResolutionMode) -> Self {
        Self { repository, mode }
    }

    /// Synthesize a binding for one declared method.
    ///
    /// Classification: *simple* when no parameter or return kind requires
    /// lowering, *complex* otherwise. The native signature replaces each
    /// lowering-required kind with its transformer's simple kind and leaves
    /// everything else untouched.
    pub fn synthesize(
        &self,
        library: &SharedLibrary,
        spec: &MethodSpec,
    ) -> BindResult<MethodBinding> {
        let (symbol_name, public_sig, native_sig, plan, is_lowered) = self.lower_signature(spec)?;

        let slot = match self.mode {
            ResolutionMode::Eager => SymbolSlot::Eager(library.symbol(&symbol_name)?),
            ResolutionMode::Lazy => SymbolSlot::Lazy {
                symbol: symbol_name.clone(),
                cell: OnceCell::new(),
            },
        };

        Ok(MethodBinding {
            symbol_name,
            convention: spec.metadata.convention,
            is_lowered,
            public_sig,
            native_sig,
            slot,
            plan,
        })
    }

    /// Pure part of synthesis: symbol name resolution, classification,
    /// native-signature derivation, and lowering-plan construction.
    fn lower_signature(
        &self,
        spec: &MethodSpec,
    ) -> BindResult<(String, Signature, Signature, LoweringPlan, bool)> {
        if spec.params.len() > MAX_ARITY {
            return Err(BindError::TooManyArgs(spec.params.len()));
        }

        let symbol_name = spec
            .metadata
            .entry_point
            .clone()
            .unwrap_or_else(|| spec.name.clone());

        let mut native_params = Vec::with_capacity(spec.params.len());
        let mut param_plan = Vec::with_capacity(spec.params.len());
        for kind in &spec.params {
            if kind.requires_lowering() {
                let t = self.repository.get_complex(kind)?;
                native_params.push(t.simple_kind());
                param_plan.push(Some(t));
            } else {
                native_params.push(kind.clone());
                param_plan.push(None);
            }
        }

        let (native_ret, ret_plan) = if spec.ret.requires_lowering() {
            let t = self.repository.get_complex(&spec.ret)?;
            (t.simple_kind(), Some(t))
        } else {
            (spec.ret.clone(), None)
        };

        let is_lowered = param_plan.iter().any(Option::is_some) || ret_plan.is_some();

        Ok((
            symbol_name.clone(),
            Signature::new(spec.name.clone(), spec.params.clone(), spec.ret.clone()),
            Signature::new(symbol_name, native_params, native_ret),
            LoweringPlan {
                params: param_plan,
                ret: ret_plan,
            },
            is_lowered,
        ))
    }
}

/// Maximum parameter count the word dispatcher supports.
const MAX_ARITY: usize = 6;

// Word-based native dispatch. Rust FFI requires the exact parameter count
// at compile time, so each arity gets its own transmuted function type.
//
// Safety: `addr` must be the address of an exported function whose
// parameters and return value are each representable as one call word, and
// `words.len()` must match the function's true arity.
unsafe fn call_words(addr: usize, words: &[u64]) -> u64 {
    type Fn0 = extern "C" fn() -> u64;
    type Fn1 = extern "C" fn(u64) -> u64;
    type Fn2 = extern "C" fn(u64, u64) -> u64;
    type Fn3 = extern "C" fn(u64, u64, u64) -> u64;
    type Fn4 = extern "C" fn(u64, u64, u64, u64) -> u64;
    type Fn5 = extern "C" fn(u64, u64, u64, u64, u64) -> u64;
    type Fn6 = extern "C" fn(u64, u64, u64, u64, u64, u64) -> u64;

    match words.len() {
        0 => std::mem::transmute::<usize, Fn0>(addr)(),
        1 => std::mem::transmute::<usize, Fn1>(addr)(words[0]),
        2 => std::mem::transmute::<usize, Fn2>(addr)(words[0], words[1]),
        3 => std::mem::transmute::<usize, Fn3>(addr)(words[0], words[1], words[2]),
        4 => std::mem::transmute::<usize, Fn4>(addr)(words[0], words[1], words[2], words[3]),
        5 => std::mem::transmute::<usize, Fn5>(addr)(
            words[0], words[1], words[2], words[3], words[4],
        ),
        6 => std::mem::transmute::<usize, Fn6>(addr)(
            words[0], words[1], words[2], words[3], words[4], words[5],
        ),
        // Arity is validated at synthesis time
        n => unreachable!("unsupported arity {}", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesizer() -> BindingSynthesizer {
        BindingSynthesizer::new(
            Arc::new(TransformerRepository::with_defaults()),
            ResolutionMode::Lazy,
        )
    }

    #[test]
    fn simple_methods_keep_their_signature() {
        let spec = MethodSpec::new(
            "add",
            vec![ValueKind::I32, ValueKind::I32],
            ValueKind::I32,
        );
        let (symbol, public_sig, native_sig, _, is_lowered) =
            synthesizer().lower_signature(&spec).unwrap();

        assert_eq!(symbol, "add");
        assert!(!is_lowered);
        assert_eq!(public_sig.params, native_sig.params);
        assert_eq!(public_sig.ret, native_sig.ret);
    }

    #[test]
    fn complex_methods_lower_exactly_the_flagged_kinds() {
        let spec = MethodSpec::new(
            "check",
            vec![ValueKind::Str, ValueKind::I32, ValueKind::Bool],
            ValueKind::Str,
        );
        let (_, public_sig, native_sig, plan, is_lowered) =
            synthesizer().lower_signature(&spec).unwrap();

        assert!(is_lowered);
        assert_eq!(
            native_sig.params,
            vec![ValueKind::Ptr, ValueKind::I32, ValueKind::I8]
        );
        assert_eq!(native_sig.ret, ValueKind::Ptr);
        assert_eq!(public_sig.params[1], ValueKind::I32);

        assert!(plan.params[0].is_some());
        assert!(plan.params[1].is_none());
        assert!(plan.params[2].is_some());
        assert!(plan.ret.is_some());
    }

    #[test]
    fn entry_point_override_wins_over_method_name() {
        let spec = MethodSpec::new("string_length", vec![ValueKind::Str], ValueKind::U64)
            .with_entry_point("strlen");
        let (symbol, public_sig, native_sig, _, _) =
            synthesizer().lower_signature(&spec).unwrap();

        assert_eq!(symbol, "strlen");
        assert_eq!(public_sig.name, "string_length");
        assert_eq!(native_sig.name, "strlen");
    }

    #[test]
    fn missing_transformer_fails_at_synthesis_time() {
        let synth = BindingSynthesizer::new(
            Arc::new(TransformerRepository::new()),
            ResolutionMode::Lazy,
        );
        let spec = MethodSpec::new("f", vec![ValueKind::Str], ValueKind::Void);
        assert!(matches!(
            synth.lower_signature(&spec),
            Err(BindError::TransformerMissing(ValueKind::Str))
        ));
    }

    #[test]
    fn arity_cap_is_enforced_at_synthesis_time() {
        let spec = MethodSpec::new("wide", vec![ValueKind::I32; 7], ValueKind::Void);
        assert!(matches!(
            synthesizer().lower_signature(&spec),
            Err(BindError::TooManyArgs(7))
        ));
    }

    #[test]
    fn convention_tag_defaults_to_c() {
        let spec = MethodSpec::new("f", vec![], ValueKind::Void);
        assert_eq!(spec.metadata.convention, CallingConvention::C);
        let tagged = spec.with_convention(CallingConvention::System);
        assert_eq!(tagged.metadata.convention, CallingConvention::System);
    }
}
