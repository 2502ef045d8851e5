//! Built-in types every K# module starts from.

use tracing::warn;

use crate::attributes::{Attribute, Attributes};
use crate::error::TypeError;
use crate::numeric::Numeric;
use crate::registry::{PartialTypeSystem, TypeSystemBuilder};

const NUM_OPERATORS: [&str; 6] = ["(+)", "(-)", "(*)", "(/)", "(%)", "(**)"];

const BITWISE_OPERATORS: [&str; 5] = ["(&)", "(|)", "(^)", "(>>)", "(<<)"];

/// Build the prelude registry: `Unit`, `Char`, `String`, `Bool`,
/// `Ordering`, `List a`, the numeric types and the `Num`, `Bitwise` and
/// `Comparable` traits.
pub fn prelude() -> PartialTypeSystem {
    let mut builder = TypeSystemBuilder::new();
    if let Err(err) = declare(&mut builder) {
        warn!(error = %err, "prelude declaration failed");
    }
    builder.build()
}

fn binary_operators(
    builder: &mut TypeSystemBuilder,
    name: &str,
    ir: &str,
    operators: &[&str],
) -> Result<(), TypeError> {
    builder.trait_type(name, Attributes::of([Attribute::name([("ir", ir)])]), "a", |t| {
        for op in operators {
            t.method(op, true, |m| {
                m.parameter("a").parameter("a").parameter("a");
            });
        }
    })?;
    Ok(())
}

fn declare(builder: &mut TypeSystemBuilder) -> Result<(), TypeError> {
    builder.concrete("Unit")?;
    builder.concrete("Char")?;
    builder.concrete("String")?;

    builder.union_type("Bool", |u| {
        u.case("True").case("False");
    })?;
    builder.union_type("Ordering", |u| {
        u.case("Less").case("Equal").case("Greater");
    })?;

    builder.parametric_type("List", |p| {
        p.parameter("a");
    })?;

    for kind in Numeric::ALL {
        builder.register_with(
            kind.name(),
            Attributes::of([Attribute::name([("ir", "num")])]),
            Vec::new(),
            |item| item.numeric(kind),
        )?;
    }

    binary_operators(builder, "Num", "prelude::num", &NUM_OPERATORS)?;
    binary_operators(builder, "Bitwise", "prelude::bit", &BITWISE_OPERATORS)?;

    builder.trait_type("Comparable", Attributes::none(), "a", |t| {
        t.method("compare", false, |m| {
            m.parameter("a").parameter("a").type_ref("Ordering");
        });
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Type;

    #[test]
    fn prelude_builds_cleanly() {
        let types = prelude();
        assert!(!types.is_partial(), "{:?}", types.errors);
        for name in ["Unit", "Char", "String", "Bool", "True", "Ordering", "List", "Int", "Num"] {
            assert!(types.value.get(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn numeric_types_carry_ir_name() {
        let types = prelude();
        let int = types.value.get("Int").unwrap();
        assert_eq!(int, &Type::numeric(Numeric::Int));
        assert_eq!(int.attributes().name_for("ir"), Some("num"));
    }

    #[test]
    fn num_trait_methods() {
        let types = prelude();
        let Type::Trait(num) = types.value.get("Num").unwrap() else {
            panic!("Num should be a trait");
        };
        assert_eq!(num.methods.len(), 6);
        assert!(num.method("(+)", 2).is_some());
        assert_eq!(num.attributes.name_for("ir"), Some("prelude::num"));
    }

    #[test]
    fn comparable_returns_ordering() {
        let types = prelude();
        let Type::Trait(comparable) = types.value.get("Comparable").unwrap() else {
            panic!("Comparable should be a trait");
        };
        let compare = comparable.method("compare", 2).unwrap();
        assert_eq!(compare.to_string(), "compare :: a -> a -> Ordering");
        assert!(!compare.default_impl);
    }
}
