//! Directional unification of an expected type against an actual one.
//!
//! The left type's [`UnificationStrategy`] picks the algorithm. Parameters
//! on either side absorb the other type; compound types unify pairwise and
//! report failures on the enclosing types; trait-bearing types consult a
//! caller-supplied [`TraitChecker`].

use ks_common::Location;
use tracing::trace;

use crate::error::{incompatible_types, TypeError};
use crate::registry::TypeSystem;
use crate::ty::{TraitType, Type, UnificationStrategy};

/// Answers whether a type implements a trait.
pub trait TraitChecker {
    fn is_implemented(&self, trait_type: &TraitType, ty: &Type) -> bool;
}

impl<F> TraitChecker for F
where
    F: Fn(&TraitType, &Type) -> bool,
{
    fn is_implemented(&self, trait_type: &TraitType, ty: &Type) -> bool {
        self(trait_type, ty)
    }
}

/// A checker that knows no implementations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImplementations;

impl TraitChecker for NoImplementations {
    fn is_implemented(&self, _trait_type: &TraitType, _ty: &Type) -> bool {
        false
    }
}

/// The head of a parametric type after solving, unwrapped from any
/// parametric it solves to.
pub(crate) fn solved_head(types: &TypeSystem, head: &Type) -> Result<Type, TypeError> {
    Ok(match types.solve(head)? {
        Type::Parametric { head, .. } => *head,
        other => other,
    })
}

/// Name identifying the family of a parametric head. Two parametric types
/// only unify when their families match.
pub(crate) fn parametric_family(types: &TypeSystem, head: &Type) -> Result<String, TypeError> {
    Ok(match solved_head(types, head)? {
        Type::Concrete { name, .. } => name,
        Type::Trait(trait_type) => trait_type.name,
        other => other.representation(),
    })
}

pub(crate) struct Unifier<'a> {
    types: &'a TypeSystem,
    checker: &'a dyn TraitChecker,
}

impl<'a> Unifier<'a> {
    pub(crate) fn new(types: &'a TypeSystem, checker: &'a dyn TraitChecker) -> Self {
        Self { types, checker }
    }

    pub(crate) fn unify(
        &self,
        location: &Location,
        type1: &Type,
        type2: &Type,
    ) -> Result<Type, TypeError> {
        trace!(
            type1 = %type1.representation(),
            type2 = %type2.representation(),
            "unify"
        );
        match type1.unification() {
            UnificationStrategy::Parameter => self.types.resolve(type2),
            UnificationStrategy::Alias | UnificationStrategy::TypeConstructor => {
                let resolved = self.types.resolve(type1)?;
                self.unify(location, &resolved, type2)
            }
            UnificationStrategy::Inner => match type1 {
                Type::Labeled { ty, .. } | Type::Annotated { ty, .. } => {
                    self.unify(location, ty, type2)
                }
                _ => Err(incompatible_types(location, type1, type2)),
            },
            UnificationStrategy::Default => self.unify_default(location, type1, type2),
            UnificationStrategy::Compound => self.unify_compound(location, type1, type2),
            UnificationStrategy::Union => self.unify_union(location, type1, type2),
            UnificationStrategy::Intersection => {
                self.unify_intersection(location, type1, type2)
            }
            UnificationStrategy::Trait => {
                let resolved = self.types.resolve(type2)?;
                if type1 == resolved.inner() {
                    Ok(type1.clone())
                } else {
                    Err(incompatible_types(location, type1, type2))
                }
            }
            UnificationStrategy::Method => self.unify_method(location, type1, type2),
            UnificationStrategy::Impl => self.unify_impl(location, type1, type2),
            UnificationStrategy::FixedTrait => self.unify_fixed_trait(location, type1, type2),
            UnificationStrategy::Numeric => self.unify_numeric(location, type1, type2),
        }
    }

    fn unify_default(
        &self,
        location: &Location,
        type1: &Type,
        type2: &Type,
    ) -> Result<Type, TypeError> {
        let left = self.types.resolve(type1)?;
        let right = self.types.resolve(type2)?;
        if right.inner().is_parameter() {
            Ok(left)
        } else if right.inner() == left.inner() {
            Ok(right)
        } else {
            Err(incompatible_types(location, type1, type2))
        }
    }

    fn unify_all(
        &self,
        location: &Location,
        type1: &Type,
        type2: &Type,
        left: &[Type],
        right: &[Type],
    ) -> Result<Vec<Type>, TypeError> {
        if left.len() != right.len() {
            return Err(incompatible_types(location, type1, type2));
        }
        left.iter()
            .zip(right)
            .map(|(l, r)| {
                self.unify(location, l, r)
                    .map_err(|_| incompatible_types(location, type1, type2))
            })
            .collect()
    }

    fn unify_compound(
        &self,
        location: &Location,
        type1: &Type,
        type2: &Type,
    ) -> Result<Type, TypeError> {
        let resolved = self.types.resolve(type2)?;
        let right = resolved.inner();
        if right.is_parameter() {
            return Ok(type1.clone());
        }

        if let Type::Parametric { head, .. } = type1 {
            if let Type::Trait(trait_type) = solved_head(self.types, head)? {
                return if type1 == right {
                    Ok(type1.clone())
                } else if self.checker.is_implemented(&trait_type, right) {
                    Ok(Type::Impl {
                        trait_type,
                        implementation: Box::new(right.clone()),
                    })
                } else {
                    Err(incompatible_types(location, type1, type2))
                };
            }
        }

        match (type1, right) {
            (
                Type::Function {
                    arguments: left_args,
                    scope,
                    attributes: left_attrs,
                },
                Type::Function {
                    arguments: right_args,
                    attributes: right_attrs,
                    ..
                },
            ) => Ok(Type::Function {
                arguments: self.unify_all(location, type1, type2, left_args, right_args)?,
                scope: scope.clone(),
                attributes: left_attrs.merge(right_attrs),
            }),
            (
                Type::Tuple {
                    elements: left_elems,
                    attributes: left_attrs,
                },
                Type::Tuple {
                    elements: right_elems,
                    attributes: right_attrs,
                },
            ) => Ok(Type::Tuple {
                elements: self.unify_all(location, type1, type2, left_elems, right_elems)?,
                attributes: left_attrs.merge(right_attrs),
            }),
            (
                Type::Parametric {
                    head: left_head,
                    params: left_params,
                    attributes: left_attrs,
                },
                Type::Parametric {
                    head: right_head,
                    params: right_params,
                    attributes: right_attrs,
                },
            ) => {
                if parametric_family(self.types, left_head)?
                    != parametric_family(self.types, right_head)?
                {
                    return Err(incompatible_types(location, type1, type2));
                }
                Ok(Type::Parametric {
                    head: left_head.clone(),
                    params: self.unify_all(location, type1, type2, left_params, right_params)?,
                    attributes: left_attrs.merge(right_attrs),
                })
            }
            _ => Err(incompatible_types(location, type1, type2)),
        }
    }

    fn unify_union(&self, location: &Location, type1: &Type, type2: &Type) -> Result<Type, TypeError> {
        let Type::Union { cases, .. } = type1 else {
            return Err(incompatible_types(location, type1, type2));
        };
        if type1 == type2 {
            return Ok(type1.clone());
        }
        if let Type::TypeConstructor { name, .. } = type2 {
            if cases.iter().any(|case| &case.label == name) {
                return Ok(type1.clone());
            }
        }
        let resolved = self.types.resolve(type2)?;
        if resolved.inner().is_parameter() || resolved.inner() == type1 {
            Ok(type1.clone())
        } else {
            Err(incompatible_types(location, type1, type2))
        }
    }

    fn unify_intersection(
        &self,
        location: &Location,
        type1: &Type,
        type2: &Type,
    ) -> Result<Type, TypeError> {
        let Type::Intersection { params, .. } = type1 else {
            return Err(incompatible_types(location, type1, type2));
        };
        let resolved = self.types.resolve(type2)?;
        let right = resolved.inner();
        if right.is_parameter() || right == type1 {
            return Ok(type1.clone());
        }
        let implemented = params.iter().all(|param| {
            let Type::Alias { name } = param else {
                return false;
            };
            match self.types.get(name).map(Type::inner) {
                Ok(Type::Trait(trait_type)) => self.checker.is_implemented(trait_type, right),
                _ => false,
            }
        });
        if implemented {
            Ok(type1.clone())
        } else {
            Err(incompatible_types(location, type1, type2))
        }
    }

    fn unify_method(
        &self,
        location: &Location,
        type1: &Type,
        type2: &Type,
    ) -> Result<Type, TypeError> {
        if type1 == type2 {
            return Ok(type1.clone());
        }
        let Type::Method(method) = type1 else {
            return Err(incompatible_types(location, type1, type2));
        };
        let right = match type2 {
            Type::Method(other) => other.to_function(),
            other => other.clone(),
        };
        self.unify(location, &method.to_function(), &right)
    }

    fn unify_impl(&self, location: &Location, type1: &Type, type2: &Type) -> Result<Type, TypeError> {
        let Type::Impl {
            trait_type,
            implementation,
        } = type1
        else {
            return Err(incompatible_types(location, type1, type2));
        };
        if type1 == type2 {
            return Ok(type1.clone());
        }
        match type2 {
            Type::FixedTrait(fixed) if fixed.name == trait_type.name => {
                return Ok(type2.clone());
            }
            Type::Trait(other) if other == trait_type => {
                return Ok(Type::FixedTrait(other.clone()));
            }
            _ => {}
        }

        let resolved = self.types.resolve(type2)?;
        match self.unify(location, implementation, &resolved) {
            Ok(unified) => Ok(Type::Impl {
                trait_type: trait_type.clone(),
                implementation: Box::new(unified),
            }),
            Err(_) if self.checker.is_implemented(trait_type, &resolved) => {
                Ok(Type::FixedTrait(trait_type.clone()))
            }
            Err(_) => Err(incompatible_types(location, type1, type2)),
        }
    }

    fn unify_fixed_trait(
        &self,
        location: &Location,
        type1: &Type,
        type2: &Type,
    ) -> Result<Type, TypeError> {
        let Type::FixedTrait(fixed) = type1 else {
            return Err(incompatible_types(location, type1, type2));
        };
        if type1 == type2 {
            return Ok(type1.clone());
        }
        match type2 {
            Type::Trait(other) if other.name == fixed.name => return Ok(type1.clone()),
            Type::Impl { trait_type, .. } if trait_type.name == fixed.name => {
                return Ok(type1.clone());
            }
            _ => {}
        }
        let resolved = self.types.resolve(type2)?;
        if self.checker.is_implemented(fixed, &resolved) {
            Ok(type1.clone())
        } else {
            Err(incompatible_types(location, type1, type2))
        }
    }

    fn unify_numeric(
        &self,
        location: &Location,
        type1: &Type,
        type2: &Type,
    ) -> Result<Type, TypeError> {
        let Type::Numeric { kind, .. } = type1 else {
            return Err(incompatible_types(location, type1, type2));
        };
        let resolved = self.types.resolve(type2)?;
        match resolved.inner() {
            Type::Parameter { .. } => Ok(type1.clone()),
            Type::Numeric { kind: other, .. } if kind.can_represent(*other) => Ok(type1.clone()),
            Type::Impl { implementation, .. } => self
                .unify(location, type1, implementation)
                .map(|_| type1.clone()),
            _ => Err(incompatible_types(location, type1, type2)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use crate::numeric::Numeric;
    use crate::registry::TypeSystemBuilder;

    fn empty() -> std::sync::Arc<TypeSystem> {
        TypeSystemBuilder::new().build().value
    }

    fn show_trait() -> TraitType {
        TraitType {
            name: "Show".into(),
            param: "a".into(),
            methods: Vec::new(),
            attributes: Attributes::none(),
        }
    }

    #[test]
    fn closure_checker() {
        let checker = |trait_type: &TraitType, ty: &Type| {
            trait_type.name == "Show" && ty == &Type::concrete("Int")
        };
        assert!(checker.is_implemented(&show_trait(), &Type::concrete("Int")));
        assert!(!checker.is_implemented(&show_trait(), &Type::concrete("Char")));
        assert!(!NoImplementations.is_implemented(&show_trait(), &Type::concrete("Int")));
    }

    #[test]
    fn numeric_widening_is_directional() {
        let types = empty();
        let loc = Location::no_provided();
        let int = Type::numeric(Numeric::Int);
        let long = Type::numeric(Numeric::Long);
        assert_eq!(types.unify(&loc, &long, &int, &NoImplementations).unwrap(), long);
        assert!(types.unify(&loc, &int, &long, &NoImplementations).is_err());
    }

    #[test]
    fn impl_absorbs_matching_trait() {
        let types = empty();
        let loc = Location::no_provided();
        let imp = Type::Impl {
            trait_type: show_trait(),
            implementation: Box::new(Type::parameter("a")),
        };
        let unified = types
            .unify(&loc, &imp, &Type::Trait(show_trait()), &NoImplementations)
            .unwrap();
        assert_eq!(unified, Type::FixedTrait(show_trait()));

        let unified = types
            .unify(&loc, &imp, &Type::concrete("Int"), &NoImplementations)
            .unwrap();
        assert_eq!(
            unified,
            Type::Impl {
                trait_type: show_trait(),
                implementation: Box::new(Type::concrete("Int")),
            }
        );
    }

    #[test]
    fn trait_headed_parametric_asks_the_checker() {
        let types = empty();
        let loc = Location::no_provided();
        let show_a = show_trait().to_parametric();
        let checker = |_: &TraitType, ty: &Type| ty == &Type::concrete("Int");

        let unified = types.unify(&loc, &show_a, &Type::concrete("Int"), &checker).unwrap();
        assert!(matches!(unified, Type::Impl { .. }));
        assert!(types
            .unify(&loc, &show_a, &Type::concrete("Char"), &checker)
            .is_err());
    }
}
