//! Registry tests: registration rules, deferred validation, partial results,
//! parent chains and module imports.

use ks_common::Location;
use ks_typesystem::{
    Attribute, Attributes, ModuleTypeSystemBuilder, NoImplementations, PartialTypeSystem, Type,
    TypeError, TypeSystemBuilder, TypeSystemErrorCode,
};

// ── Helpers ────────────────────────────────────────────────────────────

fn codes(result: &PartialTypeSystem) -> Vec<TypeSystemErrorCode> {
    result.errors.iter().map(|e| e.code).collect()
}

fn assert_has_error<F: Fn(&TypeError) -> bool>(result: &PartialTypeSystem, pred: F, desc: &str) {
    assert!(
        result.errors.iter().any(|e| pred(e)),
        "expected error matching `{}`, got errors: {:?}",
        desc,
        result.errors
    );
}

// ── Registration ───────────────────────────────────────────────────────

#[test]
fn test_duplicate_registration_is_reported_once() {
    let mut builder = TypeSystemBuilder::new();
    builder.concrete("Int").unwrap();
    let err = builder.concrete("Int").unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::TypeAlreadyRegistered);
    assert_eq!(err.argument("type"), Some("Int"));

    let result = builder.build();
    assert_eq!(codes(&result), vec![TypeSystemErrorCode::TypeAlreadyRegistered]);
    assert_eq!(result.value.len(), 1);
}

#[test]
fn test_invalid_names_are_rejected() {
    let mut builder = TypeSystemBuilder::new();
    assert_eq!(
        builder.concrete("int").unwrap_err().code,
        TypeSystemErrorCode::TypeNameShouldStartWithUpperCase
    );
    assert_eq!(
        builder.concrete("In t").unwrap_err().code,
        TypeSystemErrorCode::InvalidName
    );
    let err = builder
        .parametric_type("Box", |p| {
            p.parameter("A");
        })
        .unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::TypeParamNameShouldStartWithLowerCase);
    assert!(builder.build().value.is_empty());
}

#[test]
fn test_parametric_type_needs_parameters() {
    let mut builder = TypeSystemBuilder::new();
    let err = builder.parametric_type("Box", |_| {}).unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::ParametricTypeWithoutParameters);
    assert_eq!(err.argument("type"), Some("Box"));
}

#[test]
fn test_function_needs_argument_and_return() {
    let mut builder = TypeSystemBuilder::new();
    builder.concrete("Int").unwrap();
    let err = builder
        .register("Thunk", |item| {
            item.function(|f| {
                f.type_ref("Int");
            })
        })
        .unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::InvalidFunctionType);

    let ty = builder
        .register("Succ", |item| {
            item.function(|f| {
                f.type_ref("Int").type_ref("Int");
            })
        })
        .unwrap();
    assert_eq!(ty.representation(), "(Int -> Int)");
}

#[test]
fn test_registered_attributes_are_kept() {
    let mut builder = TypeSystemBuilder::new();
    let ty = builder
        .register_with(
            "Handle",
            Attributes::of([Attribute::Native, Attribute::name([("ir", "ptr")])]),
            Vec::new(),
            |item| item.concrete(),
        )
        .unwrap();
    assert!(ty.attributes().contains(&Attribute::Native));
    assert_eq!(ty.attributes().name_for("ir"), Some("ptr"));
}

// ── Deferred validation ────────────────────────────────────────────────

#[test]
fn test_forward_references_are_allowed() {
    let mut builder = TypeSystemBuilder::new();
    builder.register("Id", |item| item.alias("Int")).unwrap();
    builder.concrete("Int").unwrap();
    let result = builder.build();
    assert!(!result.is_partial(), "{:?}", result.errors);
    assert_eq!(
        result.value.resolve(&Type::alias("Id")).unwrap(),
        Type::concrete("Int")
    );
}

#[test]
fn test_missing_alias_target_excludes_entry() {
    let mut builder = TypeSystemBuilder::new();
    builder.concrete("Int").unwrap();
    builder.register("Id", |item| item.alias("Missing")).unwrap();
    let result = builder.build();

    assert_eq!(codes(&result), vec![TypeSystemErrorCode::TypeNotFound]);
    assert!(result.value.get("Int").is_ok());
    assert!(result.value.get("Id").is_err());
}

#[test]
fn test_parameter_count_is_checked() {
    let mut builder = TypeSystemBuilder::new();
    builder.concrete("Int").unwrap();
    builder
        .parametric_type("Map", |p| {
            p.parameter("k").parameter("v");
        })
        .unwrap();
    builder
        .register("IntMap", |item| {
            item.parametric("Map", |p| {
                p.type_ref("Int");
            })
        })
        .unwrap();
    let result = builder.build();

    assert_has_error(
        &result,
        |e| {
            e.code == TypeSystemErrorCode::InvalidNumberOfParameters
                && e.argument("number") == Some("2")
                && e.argument("type") == Some("(Map k v)")
                && e.argument("configuredType") == Some("(Map Int)")
        },
        "InvalidNumberOfParameters for Map",
    );
    assert!(result.value.get("IntMap").is_err());
}

#[test]
fn test_non_parametric_head_is_rejected() {
    let mut builder = TypeSystemBuilder::new();
    builder.concrete("Int").unwrap();
    builder
        .register("Bad", |item| {
            item.parametric("Int", |p| {
                p.parameter("a");
            })
        })
        .unwrap();
    let result = builder.build();
    assert_has_error(
        &result,
        |e| e.code == TypeSystemErrorCode::NoParametrizedType && e.argument("type") == Some("Int"),
        "NoParametrizedType for Int",
    );
}

#[test]
fn test_intersection_of_non_traits_is_rejected() {
    let mut builder = TypeSystemBuilder::new();
    builder.concrete("Int").unwrap();
    builder
        .trait_type("Show", Attributes::none(), "a", |t| {
            t.method("show", false, |m| {
                m.parameter("a").type_ref("Int");
            });
        })
        .unwrap();
    builder
        .register("Good", |item| item.intersection(&["Show"]))
        .unwrap();
    builder
        .register("Bad", |item| item.intersection(&["Show", "Int"]))
        .unwrap();
    let result = builder.build();

    assert_eq!(
        codes(&result),
        vec![TypeSystemErrorCode::IntersectionTypeShouldBeTraits]
    );
    assert!(result.value.get("Good").is_ok());
    assert!(result.value.get("Bad").is_err());
}

#[test]
fn test_union_with_missing_case_type_drops_its_labels() {
    let mut builder = TypeSystemBuilder::new();
    builder
        .union_type("Tree", |u| {
            u.case("Leaf").class("Node", |p| {
                p.type_ref("Missing");
            });
        })
        .unwrap();
    let result = builder.build();

    assert_eq!(codes(&result), vec![TypeSystemErrorCode::TypeNotFound]);
    assert!(result.value.get("Tree").is_err());
    assert!(result.value.get("Leaf").is_err());
    assert!(result.value.get("Node").is_err());
    assert!(result.value.is_empty());
}

#[test]
fn test_exclusion_reaches_dependent_aliases() {
    let mut builder = TypeSystemBuilder::new();
    builder.concrete("Int").unwrap();
    builder.register("A", |item| item.alias("Missing")).unwrap();
    builder.register("B", |item| item.alias("A")).unwrap();
    builder.register("C", |item| item.alias("B")).unwrap();
    let result = builder.build();

    let missing: Vec<_> = result
        .errors
        .iter()
        .map(|e| (e.code, e.argument("type").unwrap_or_default().to_string()))
        .collect();
    assert_eq!(
        missing,
        vec![
            (TypeSystemErrorCode::TypeNotFound, "Missing".to_string()),
            (TypeSystemErrorCode::TypeNotFound, "A".to_string()),
            (TypeSystemErrorCode::TypeNotFound, "B".to_string()),
        ]
    );
    assert_eq!(result.value.len(), 1);
    assert!(result.value.get("Int").is_ok());
}

// ── Unions and traits ──────────────────────────────────────────────────

#[test]
fn test_union_labels_must_be_free() {
    let mut builder = TypeSystemBuilder::new();
    builder.concrete("Some").unwrap();
    let err = builder
        .union_type("Option", |u| {
            u.class("Some", |p| {
                p.parameter("a");
            })
            .case("None");
        })
        .unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::TypeAlreadyRegistered);

    let result = builder.build();
    // Failed unions leave no constructors behind.
    assert!(result.value.get("None").is_err());
    assert!(result.value.get("Option").is_err());
}

#[test]
fn test_duplicate_trait_method() {
    let mut builder = TypeSystemBuilder::new();
    let err = builder
        .trait_type("Show", Attributes::none(), "a", |t| {
            t.method("show", false, |m| {
                m.parameter("a").parameter("a");
            })
            .method("show", false, |m| {
                m.parameter("a").parameter("a");
            });
        })
        .unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::DuplicateTraitMethod);
    assert_eq!(err.argument("name"), Some("show/1"));
    assert_eq!(err.argument("trait"), Some("Show"));
}

#[test]
fn test_overloads_by_arity_are_distinct() {
    let mut builder = TypeSystemBuilder::new();
    let ty = builder
        .trait_type("Show", Attributes::none(), "a", |t| {
            t.method("show", false, |m| {
                m.parameter("a").parameter("a");
            })
            .method("show", false, |m| {
                m.parameter("a").parameter("a").parameter("a");
            });
        })
        .unwrap();
    let Type::Trait(show) = ty else {
        panic!("expected a trait");
    };
    assert!(show.method("show", 1).is_some());
    assert!(show.method("show", 2).is_some());
    assert!(show.methods.iter().all(|m| m.attributes.contains(&Attribute::TraitMethod)));
}

#[test]
fn test_trait_method_names_cannot_contain_spaces() {
    let mut builder = TypeSystemBuilder::new();
    let err = builder
        .trait_type("Show", Attributes::none(), "a", |t| {
            t.method("show it", false, |m| {
                m.parameter("a").parameter("a");
            });
        })
        .unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::FunctionNameShouldntHaveSpaces);
}

// ── Parents and modules ────────────────────────────────────────────────

#[test]
fn test_partial_parent_errors_are_carried() {
    let mut parent = TypeSystemBuilder::new();
    parent.concrete("Int").unwrap();
    let _ = parent.concrete("Int");
    let parent = parent.build();
    assert!(parent.is_partial());

    let mut child = TypeSystemBuilder::with_parent(&parent);
    child.concrete("Str").unwrap();
    let child = child.build();
    assert_eq!(codes(&child), vec![TypeSystemErrorCode::TypeAlreadyRegistered]);
    assert!(child.value.get("Int").is_ok());
}

#[test]
fn test_qualified_lookup_through_imports() {
    let mut math = TypeSystemBuilder::new();
    math.concrete("Vector").unwrap();
    let math = math.build();

    let mut modules = ModuleTypeSystemBuilder::new();
    modules.register("math", &math);
    let modules = modules.build();

    assert!(modules.value.get("math.Vector").is_ok());
    assert!(modules.value.get("Vector").is_err());
    let err = modules.value.get("geo.Point").unwrap_err();
    assert_eq!(err.code, TypeSystemErrorCode::TypeNotFound);
    assert_eq!(err.argument("type"), Some("geo.Point"));
    assert_eq!(err.location, None);
}

fn module_with_alias_and_union() -> PartialTypeSystem {
    let mut module = TypeSystemBuilder::new();
    module.concrete("Int").unwrap();
    module.register("Age", |item| item.alias("Int")).unwrap();
    module
        .union_type("Flag", |u| {
            u.case("On").case("Off");
        })
        .unwrap();
    module.build()
}

#[test]
fn test_imported_alias_resolves_in_its_module() {
    let module = module_with_alias_and_union();
    assert!(!module.is_partial(), "{:?}", module.errors);
    let mut modules = ModuleTypeSystemBuilder::new();
    modules.register("M", &module);
    let types = modules.build().value;

    let age = Type::alias("M.Age");
    assert_eq!(types.resolve(&age).unwrap(), Type::concrete("Int"));
    assert_eq!(types.solve(&age).unwrap(), Type::concrete("Int"));
    assert_eq!(
        types
            .unify(&Location::no_provided(), &age, &age, &NoImplementations)
            .unwrap(),
        Type::concrete("Int")
    );
}

#[test]
fn test_imported_case_label_resolves_to_its_union() {
    let module = module_with_alias_and_union();
    let flag = module.value.get("Flag").unwrap().clone();
    let mut modules = ModuleTypeSystemBuilder::new();
    modules.register("M", &module);
    let types = modules.build().value;

    assert_eq!(types.resolve(&Type::alias("M.On")).unwrap(), flag);
    assert_eq!(
        types
            .unify(
                &Location::no_provided(),
                &Type::alias("M.Flag"),
                &Type::alias("M.Off"),
                &NoImplementations
            )
            .unwrap(),
        flag
    );
    assert!(types.resolve(&Type::alias("On")).is_err());
}

#[test]
fn test_registry_serializes_types() {
    let mut builder = TypeSystemBuilder::new();
    builder.concrete("Int").unwrap();
    builder
        .parametric_type("List", |p| {
            p.parameter("a");
        })
        .unwrap();
    let result = builder.build();

    for (name, ty) in result.value.iter() {
        let json = serde_json::to_string(ty).unwrap();
        let back: Type = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, ty, "round trip of {name}");
    }
}
