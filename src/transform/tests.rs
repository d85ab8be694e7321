//! Transformer round-trip and repository tests.

use std::sync::Arc;

use super::*;

#[test]
fn string_round_trip_law() {
    let repo = TransformerRepository::with_defaults();
    let t = repo.get_complex(&ValueKind::Str).unwrap();

    for input in ["hello", "", "with spaces and ünïcode"] {
        let lowered = t.lower(Value::Str(Some(input.to_string()))).unwrap();
        let raised = t.raise(lowered).unwrap();
        assert_eq!(raised, Value::Str(Some(input.to_string())));
    }

    // Null strings round-trip as null pointers
    let lowered = t.lower(Value::Str(None)).unwrap();
    assert_eq!(lowered.to_word(), 0);
    assert_eq!(t.raise(lowered).unwrap(), Value::Str(None));
}

#[test]
fn string_with_interior_nul_is_rejected() {
    let repo = TransformerRepository::with_defaults();
    let t = repo.get_complex(&ValueKind::Str).unwrap();
    assert!(matches!(
        t.lower(Value::Str(Some("a\0b".to_string()))),
        Err(BindError::Marshal(_))
    ));
}

#[test]
fn bool_round_trip_law() {
    let repo = TransformerRepository::with_defaults();
    let t = repo.get_complex(&ValueKind::Bool).unwrap();

    for b in [true, false] {
        let lowered = t.lower(Value::Bool(b)).unwrap();
        assert_eq!(t.raise(lowered).unwrap(), Value::Bool(b));
    }

    // Any nonzero native result is truth
    assert_eq!(t.raise(Value::Int(42)).unwrap(), Value::Bool(true));
    assert_eq!(t.raise(Value::Int(0)).unwrap(), Value::Bool(false));
}

#[test]
fn option_round_trip_law() {
    let repo = TransformerRepository::with_defaults();
    let kind = ValueKind::Opt(Box::new(ValueKind::I32));
    let t = repo.get_complex(&kind).unwrap();

    let lowered = t.lower(Value::Opt(Some(Box::new(Value::Int(-7))))).unwrap();
    assert_eq!(
        t.raise(lowered).unwrap(),
        Value::Opt(Some(Box::new(Value::Int(-7))))
    );

    let lowered = t.lower(Value::Opt(None)).unwrap();
    assert_eq!(lowered.to_word(), 0);
    assert_eq!(t.raise(lowered).unwrap(), Value::Opt(None));
}

#[test]
fn option_transformers_are_built_on_demand_and_cached() {
    let repo = TransformerRepository::with_defaults();
    let kind = ValueKind::Opt(Box::new(ValueKind::F64));

    let first = repo.get_complex(&kind).unwrap();
    let second = repo.get_complex(&kind).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn option_around_complex_kind_is_rejected() {
    let repo = TransformerRepository::with_defaults();
    let kind = ValueKind::Opt(Box::new(ValueKind::Str));
    assert!(matches!(
        repo.get_complex(&kind),
        Err(BindError::Marshal(_))
    ));
}

#[test]
fn missing_transformer_is_reported() {
    let repo = TransformerRepository::new();
    match repo.get_complex(&ValueKind::Str) {
        Err(BindError::TransformerMissing(kind)) => assert_eq!(kind, ValueKind::Str),
        other => panic!("expected TransformerMissing, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn registration_overwrites_prior_entry() {
    let repo = TransformerRepository::new();
    repo.register(ValueKind::Bool, Arc::new(BoolTransformer));

    // Replacement transformer lowers booleans to pointers instead
    struct PtrBool;
    impl TypeTransformer for PtrBool {
        fn simple_kind(&self) -> ValueKind {
            ValueKind::Ptr
        }
        fn lower(&self, value: Value) -> BindResult<Value> {
            match value {
                Value::Bool(b) => Ok(Value::Ptr(b as usize)),
                _ => Err(BindError::Marshal("not a bool".to_string())),
            }
        }
        fn raise(&self, value: Value) -> BindResult<Value> {
            match value {
                Value::Ptr(p) => Ok(Value::Bool(p != 0)),
                _ => Err(BindError::Marshal("not a ptr".to_string())),
            }
        }
    }
    repo.register(ValueKind::Bool, Arc::new(PtrBool));

    let t = repo.get_complex(&ValueKind::Bool).unwrap();
    assert_eq!(t.simple_kind(), ValueKind::Ptr);
}

#[test]
fn repository_predicate_matches_kind_predicate() {
    let repo = TransformerRepository::with_defaults();
    assert!(repo.requires_lowering(&ValueKind::Str));
    assert!(repo.requires_lowering(&ValueKind::Bool));
    assert!(repo.requires_lowering(&ValueKind::Opt(Box::new(ValueKind::U8))));
    assert!(!repo.requires_lowering(&ValueKind::I64));
    assert!(!repo.requires_lowering(&ValueKind::Ptr));
}
