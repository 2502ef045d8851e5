//! Substitution context tests: extracting bindings and substituting them.

use std::sync::Arc;

use ks_common::{Location, Position};
use ks_typesystem::{prelude, NoImplementations, TraitType, Type, TypeSystem, TypeSystemErrorCode};

// ── Helpers ────────────────────────────────────────────────────────────

fn types() -> Arc<TypeSystem> {
    prelude().value
}

fn loc() -> Location {
    Location::no_provided()
}

fn named(types: &TypeSystem, name: &str) -> Type {
    types.get(name).unwrap().clone()
}

fn list(param: Type) -> Type {
    Type::parametric(Type::alias("List"), vec![param])
}

// ── Bindings ───────────────────────────────────────────────────────────

#[test]
fn test_numeric_bindings_widen() {
    let types = types();
    let mut context = types.substitution_context(&NoImplementations);
    let param = Type::fresh_parameter();
    for name in ["Int", "Long", "Int"] {
        assert!(
            context.extract(&loc(), &param, &named(&types, name)).unwrap(),
            "binding {name}"
        );
    }
    assert_eq!(
        context.substitute(&loc(), &param, &param).unwrap(),
        named(&types, "Long")
    );
    assert!(!context.has_errors());
}

#[test]
fn test_conflicting_binding_is_remembered() {
    let types = types();
    let mut context = types.substitution_context(&NoImplementations);
    context.add_mapping(&loc(), "a", &named(&types, "Char")).unwrap();
    let err = context
        .add_mapping(&loc(), "a", &named(&types, "String"))
        .unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::IncompatibleTypes);

    let again = context
        .get_mapping(&loc(), "a", &Type::parameter("a"))
        .unwrap_err();
    assert_eq!(again, err);
    assert_eq!(context.errors().count(), 1);
}

#[test]
fn test_missing_binding() {
    let types = types();
    let context = types.substitution_context(&NoImplementations);
    let location = Location::new("main.ks", Position::new(3, 1), Position::new(3, 9));
    let function = Type::function(vec![Type::parameter("a"), Type::parameter("b")]);
    let err = context.substitute(&location, &function, &function).unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::SubstitutionNotFound);
    assert_eq!(err.argument("param"), Some("a"));
    assert_eq!(err.argument("type"), Some("(a -> b)"));
    assert_eq!(err.location, Some(location));
}

// ── Extract and substitute ─────────────────────────────────────────────

#[test]
fn test_extract_then_substitute() {
    let types = types();
    let mut context = types.substitution_context(&NoImplementations);
    let pattern = Type::function(vec![
        Type::parameter("a"),
        list(Type::parameter("a")),
        Type::parameter("b"),
    ]);
    let actual = Type::function(vec![
        named(&types, "Short"),
        list(Type::alias("Int")),
        named(&types, "Char"),
    ]);
    assert!(context.extract(&loc(), &pattern, &actual).unwrap());
    assert_eq!(context.mapping("a"), Some(&named(&types, "Int")));
    assert_eq!(context.mapping("b"), Some(&named(&types, "Char")));

    let target = Type::tuple(vec![Type::parameter("b"), list(Type::parameter("a"))]);
    let result = context.substitute(&loc(), &target, &target).unwrap();
    assert_eq!(
        result,
        Type::tuple(vec![named(&types, "Char"), list(named(&types, "Int"))])
    );
}

#[test]
fn test_extract_arity_mismatch() {
    let types = types();
    let mut context = types.substitution_context(&NoImplementations);
    let pattern = Type::tuple(vec![Type::parameter("a"), Type::parameter("b")]);
    let actual = Type::tuple(vec![named(&types, "Char")]);
    let err = context.extract(&loc(), &pattern, &actual).unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::IncompatibleTypes);
}

#[test]
fn test_extract_against_parameter_binds_nothing() {
    let types = types();
    let mut context = types.substitution_context(&NoImplementations);
    let pattern = list(Type::parameter("a"));
    assert!(!context
        .extract(&loc(), &pattern, &Type::parameter("x"))
        .unwrap());
    assert_eq!(context.mappings().count(), 0);
}

#[test]
fn test_concrete_pattern_extracts_nothing() {
    let types = types();
    let mut context = types.substitution_context(&NoImplementations);
    let char_type = named(&types, "Char");
    assert!(!context.extract(&loc(), &char_type, &char_type).unwrap());
    assert_eq!(context.substitute(&loc(), &char_type, &char_type).unwrap(), char_type);
}

#[test]
fn test_labels_survive_substitution() {
    let types = types();
    let mut context = types.substitution_context(&NoImplementations);
    context.add_mapping(&loc(), "a", &named(&types, "Char")).unwrap();
    let labeled = Type::labeled("value", Type::parameter("a"));
    assert_eq!(
        context.substitute(&loc(), &labeled, &labeled).unwrap(),
        Type::labeled("value", named(&types, "Char"))
    );
}

// ── Traits ─────────────────────────────────────────────────────────────

#[test]
fn test_trait_witness_is_recorded() {
    let types = types();
    let Type::Trait(num) = named(&types, "Num") else {
        panic!("Num should be a trait");
    };
    let checker = |t: &TraitType, ty: &Type| t.name == "Num" && matches!(ty, Type::Numeric { .. });
    let mut context = types.substitution_context(&checker);

    let pattern = Type::function(vec![num.to_parametric(), Type::parameter("r")]);
    let actual = Type::function(vec![named(&types, "Int"), named(&types, "Char")]);
    assert!(context.extract(&loc(), &pattern, &actual).unwrap());

    let witness = context.mapping("(Num a)").cloned().unwrap();
    assert_eq!(
        witness,
        Type::Impl {
            trait_type: num.clone(),
            implementation: Box::new(named(&types, "Int")),
        }
    );
    assert_eq!(context.substitute(&loc(), &num.to_parametric(), &pattern).unwrap(), witness);
}

#[test]
fn test_impl_pattern_requires_implementation() {
    let types = types();
    let Type::Trait(comparable) = named(&types, "Comparable") else {
        panic!("Comparable should be a trait");
    };
    let pattern = Type::Impl {
        trait_type: comparable.clone(),
        implementation: Box::new(Type::parameter("a")),
    };

    let mut refusing = types.substitution_context(&NoImplementations);
    assert!(refusing
        .extract(&loc(), &pattern, &named(&types, "Char"))
        .is_err());

    let accepting = |_: &TraitType, _: &Type| true;
    let mut context = types.substitution_context(&accepting);
    assert!(context
        .extract(&loc(), &pattern, &named(&types, "Char"))
        .unwrap());
    let substituted = context.substitute(&loc(), &pattern, &pattern).unwrap();
    assert!(matches!(
        substituted,
        Type::Impl { ref implementation, .. } if **implementation == named(&types, "Char")
    ));
}
