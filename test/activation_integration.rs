//! End-to-end activation tests against the system C library.
//!
//! These tests bind real libc entry points. When libc cannot be resolved
//! through the platform search order (non-glibc systems), each test skips
//! by returning early.

use std::path::PathBuf;

use dlbind::{
    ActivationOptions, BindError, DemangleOptions, DemangleStyle, InterfaceBuilder,
    InterfaceManifest, MethodSpec, PathResolver, ResolutionMode, SymbolDemangler, Value, ValueKind,
};

fn libc_path() -> Option<PathBuf> {
    PathResolver::new().resolve("libc.so.6").ok()
}

fn lazy_options() -> ActivationOptions {
    ActivationOptions {
        resolution: ResolutionMode::Lazy,
        disposal_guards: true,
    }
}

#[test]
fn eager_activation_fails_on_missing_symbol() {
    let Some(path) = libc_path() else { return };

    let result = InterfaceBuilder::new()
        .method(MethodSpec::new("getpid", vec![], ValueKind::I32))
        .method(MethodSpec::new(
            "definitely_not_exported_by_libc",
            vec![],
            ValueKind::Void,
        ))
        .activate_path(&path);

    // The whole activation fails; no partially-functional instance exists.
    match result {
        Err(BindError::EntryPointNotFound(symbol)) => {
            assert_eq!(symbol, "definitely_not_exported_by_libc");
        }
        other => panic!("expected EntryPointNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn lazy_activation_defers_symbol_failure_to_first_call() {
    let Some(path) = libc_path() else { return };

    let instance = InterfaceBuilder::new()
        .options(lazy_options())
        .method(MethodSpec::new("getpid", vec![], ValueKind::I32))
        .method(MethodSpec::new(
            "definitely_not_exported_by_libc",
            vec![],
            ValueKind::Void,
        ))
        .activate_path(&path)
        .expect("lazy activation tolerates unused absent symbols");

    // The present symbol works
    let pid = instance.call("getpid", &[]).unwrap();
    assert!(pid.as_i64().unwrap() > 0);

    // Only the first invocation of the absent symbol fails
    for _ in 0..2 {
        match instance.call("definitely_not_exported_by_libc", &[]) {
            Err(BindError::EntryPointNotFound(_)) => {}
            other => panic!("expected EntryPointNotFound, got {:?}", other.map(|_| ())),
        }
    }
}

#[test]
fn string_arguments_are_lowered_for_strlen() {
    let Some(path) = libc_path() else { return };

    let instance = InterfaceBuilder::new()
        .method(
            MethodSpec::new("string_length", vec![ValueKind::Str], ValueKind::U64)
                .with_entry_point("strlen"),
        )
        .activate_path(&path)
        .unwrap();

    let binding = instance.binding("string_length").unwrap();
    assert!(binding.is_lowered());
    assert_eq!(binding.symbol_name(), "strlen");
    assert_eq!(binding.native_signature().params, vec![ValueKind::Ptr]);

    let len = instance
        .call("string_length", &[Value::Str(Some("hello".to_string()))])
        .unwrap();
    assert_eq!(len.as_u64(), Some(5));

    let len = instance
        .call("string_length", &[Value::Str(Some(String::new()))])
        .unwrap();
    assert_eq!(len.as_u64(), Some(0));
}

#[test]
fn boolean_results_are_raised_from_isdigit() {
    let Some(path) = libc_path() else { return };

    let instance = InterfaceBuilder::new()
        .method(MethodSpec::new(
            "isdigit",
            vec![ValueKind::I32],
            ValueKind::Bool,
        ))
        .activate_path(&path)
        .unwrap();

    let digit = instance.call("isdigit", &[Value::Int('7' as i64)]).unwrap();
    assert_eq!(digit.as_bool(), Some(true));

    let letter = instance.call("isdigit", &[Value::Int('a' as i64)]).unwrap();
    assert_eq!(letter.as_bool(), Some(false));
}

#[test]
fn optional_arguments_lower_to_nullable_pointers() {
    let Some(path) = libc_path() else { return };

    // time(NULL) returns the current epoch second
    let instance = InterfaceBuilder::new()
        .method(MethodSpec::new(
            "time",
            vec![ValueKind::Opt(Box::new(ValueKind::I64))],
            ValueKind::I64,
        ))
        .activate_path(&path)
        .unwrap();

    let now = instance.call("time", &[Value::Opt(None)]).unwrap();
    assert!(now.as_i64().unwrap() > 1_000_000_000);
}

#[test]
fn wrong_arity_is_rejected_before_dispatch() {
    let Some(path) = libc_path() else { return };

    let instance = InterfaceBuilder::new()
        .method(MethodSpec::new("getpid", vec![], ValueKind::I32))
        .activate_path(&path)
        .unwrap();

    match instance.call("getpid", &[Value::Int(1)]) {
        Err(BindError::ArityMismatch { expected, got }) => {
            assert_eq!((expected, got), (0, 1));
        }
        other => panic!("expected ArityMismatch, got {:?}", other.map(|_| ())),
    }

    match instance.call("no_such_method", &[]) {
        Err(BindError::MethodNotBound(name)) => assert_eq!(name, "no_such_method"),
        other => panic!("expected MethodNotBound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn disposal_is_idempotent_and_guarded() {
    let Some(path) = libc_path() else { return };

    let instance = InterfaceBuilder::new()
        .method(MethodSpec::new("getpid", vec![], ValueKind::I32))
        .activate_path(&path)
        .unwrap();

    assert!(instance.call("getpid", &[]).is_ok());
    assert!(!instance.is_disposed());

    instance.dispose();
    instance.dispose();
    assert!(instance.is_disposed());
    assert!(instance.library_path().is_none());

    match instance.call("getpid", &[]) {
        Err(BindError::DisposedAccess) => {}
        other => panic!("expected DisposedAccess, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn unguarded_instances_still_refuse_a_released_handle() {
    let Some(path) = libc_path() else { return };

    let instance = InterfaceBuilder::new()
        .options(ActivationOptions {
            resolution: ResolutionMode::Eager,
            disposal_guards: false,
        })
        .method(MethodSpec::new("getpid", vec![], ValueKind::I32))
        .activate_path(&path)
        .unwrap();

    instance.dispose();
    assert!(matches!(
        instance.call("getpid", &[]),
        Err(BindError::DisposedAccess)
    ));
}

#[test]
fn manifest_driven_activation() {
    if libc_path().is_none() {
        return;
    }

    let manifest = InterfaceManifest::from_toml(
        r#"
library = "libc.so.6"

[[methods]]
name = "string_length"
params = ["str"]
returns = "u64"
entry_point = "strlen"
"#,
    )
    .unwrap();

    let instance = manifest.activate().unwrap();
    let len = instance
        .call("string_length", &[Value::Str(Some("manifest".to_string()))])
        .unwrap();
    assert_eq!(len.as_u64(), Some(8));
}

#[test]
fn concurrent_lazy_calls_resolve_once() {
    let Some(path) = libc_path() else { return };

    let instance = std::sync::Arc::new(
        InterfaceBuilder::new()
            .options(lazy_options())
            .method(MethodSpec::new("getpid", vec![], ValueKind::I32))
            .activate_path(&path)
            .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let instance = std::sync::Arc::clone(&instance);
            std::thread::spawn(move || instance.call("getpid", &[]).unwrap().as_i64().unwrap())
        })
        .collect();

    let pids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(pids.windows(2).all(|w| w[0] == w[1]));
}

// Requires the system libiberty; run with `cargo test -- --ignored` on a
// machine that has it installed.
#[test]
#[ignore = "requires libiberty"]
fn demangles_gnu_style_symbol() {
    let demangler = SymbolDemangler::new().unwrap();

    let demangled = demangler
        .demangle(
            "_ZN7MyClass15MyClassFunctionEii",
            DemangleOptions::PARAMS,
            DemangleStyle::Auto,
        )
        .unwrap();

    assert_eq!(
        demangled.as_deref(),
        Some("MyClass::MyClassFunction(int, int)")
    );
}
