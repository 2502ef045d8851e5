//! Substitution contexts: extract parameter bindings from a pattern matched
//! against a concrete type, then substitute them back into other types.

use ks_common::Location;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::{incompatible_types, TypeError, TypeSystemErrorCode};
use crate::registry::TypeSystem;
use crate::ty::{ClassType, SubstitutionStrategy, Type};
use crate::unify::{parametric_family, solved_head, TraitChecker, Unifier};

/// Parameter bindings accumulated while matching patterns.
///
/// A key bound twice keeps the unification of both bindings, so repeated
/// numeric bindings widen (`Int`, `Long`, `Int` ends as `Long`). A key whose
/// bindings cannot be unified records the error, and every later lookup of
/// that key reports it.
pub struct SubstitutionContext<'a> {
    types: &'a TypeSystem,
    checker: &'a dyn TraitChecker,
    mappings: FxHashMap<String, Type>,
    errors: FxHashMap<String, TypeError>,
}

impl<'a> SubstitutionContext<'a> {
    pub(crate) fn new(types: &'a TypeSystem, checker: &'a dyn TraitChecker) -> Self {
        Self {
            types,
            checker,
            mappings: FxHashMap::default(),
            errors: FxHashMap::default(),
        }
    }

    pub fn mapping(&self, key: &str) -> Option<&Type> {
        self.mappings.get(key)
    }

    pub fn mappings(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.mappings.iter().map(|(key, ty)| (key.as_str(), ty))
    }

    pub fn errors(&self) -> impl Iterator<Item = &TypeError> {
        self.errors.values()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn add_mapping(
        &mut self,
        location: &Location,
        key: &str,
        ty: &Type,
    ) -> Result<bool, TypeError> {
        let Some(existing) = self.mappings.get(key).cloned() else {
            self.mappings.insert(key.to_string(), ty.clone());
            return Ok(true);
        };

        let unifier = Unifier::new(self.types, self.checker);
        let unified = unifier
            .unify(location, &existing, ty)
            .or_else(|_| unifier.unify(location, ty, &existing));
        match unified {
            Ok(unified) => {
                if unified != existing {
                    trace!(
                        key,
                        from = %existing.representation(),
                        to = %unified.representation(),
                        "substitution widened"
                    );
                }
                self.mappings.insert(key.to_string(), unified);
                Ok(true)
            }
            Err(err) => {
                self.errors.insert(key.to_string(), err.clone());
                Err(err)
            }
        }
    }

    /// The binding for `key`. `context` is the type being substituted and
    /// only appears in the error when no binding exists.
    pub fn get_mapping(
        &self,
        location: &Location,
        key: &str,
        context: &Type,
    ) -> Result<Type, TypeError> {
        if let Some(err) = self.errors.get(key) {
            return Err(err.clone());
        }
        match self.mappings.get(key) {
            Some(ty) => Ok(ty.clone()),
            None => Err(TypeSystemErrorCode::SubstitutionNotFound
                .at(location)
                .with("param", key)
                .with("type", context.representation())),
        }
    }

    /// Match `pattern` against `ty`, recording a binding for every parameter
    /// found. Returns whether anything was matched.
    pub fn extract(
        &mut self,
        location: &Location,
        pattern: &Type,
        ty: &Type,
    ) -> Result<bool, TypeError> {
        match pattern.substitution() {
            SubstitutionStrategy::Parameter => match pattern {
                Type::Parameter { name, .. } => self.add_mapping(location, name, ty),
                _ => Ok(false),
            },
            SubstitutionStrategy::Alias => {
                let resolved = self.types.resolve(pattern)?;
                self.extract(location, &resolved, ty)
            }
            SubstitutionStrategy::Inner => match pattern {
                Type::Labeled { ty: inner, .. } | Type::Annotated { ty: inner, .. } => {
                    self.extract(location, inner, ty)
                }
                _ => Ok(false),
            },
            SubstitutionStrategy::Compound => self.extract_compound(location, pattern, ty),
            SubstitutionStrategy::Impl => {
                let Type::Impl { trait_type, .. } = pattern else {
                    return Ok(false);
                };
                let resolved = self.types.resolve(ty)?;
                let key = trait_type.mapping_key();
                match resolved.inner() {
                    Type::FixedTrait(fixed)
                        if self
                            .checker
                            .is_implemented(trait_type, &Type::Trait(fixed.clone())) =>
                    {
                        self.add_mapping(location, &key, &resolved)?;
                        Ok(true)
                    }
                    other if self.checker.is_implemented(trait_type, other) => {
                        let witness = Type::Impl {
                            trait_type: trait_type.clone(),
                            implementation: Box::new(other.clone()),
                        };
                        self.add_mapping(location, &key, &witness)?;
                        Ok(true)
                    }
                    _ => Err(incompatible_types(location, pattern, ty)),
                }
            }
            SubstitutionStrategy::FixedTrait => {
                let Type::FixedTrait(fixed) = pattern else {
                    return Ok(false);
                };
                let resolved = self.types.resolve(ty)?;
                if self.checker.is_implemented(fixed, resolved.inner()) {
                    self.add_mapping(location, &fixed.mapping_key(), pattern)?;
                    Ok(true)
                } else {
                    Err(incompatible_types(location, pattern, ty))
                }
            }
            SubstitutionStrategy::Identity => Ok(false),
        }
    }

    fn extract_compound(
        &mut self,
        location: &Location,
        pattern: &Type,
        ty: &Type,
    ) -> Result<bool, TypeError> {
        let resolved = self.types.resolve(ty)?;
        let actual = resolved.inner();
        if actual.is_parameter() {
            return Ok(false);
        }

        if let Type::Parametric { head, .. } = pattern {
            if let Type::Trait(trait_type) = solved_head(self.types, head)? {
                let same_trait = matches!(actual, Type::Parametric { head: other, .. }
                    if parametric_family(self.types, other).ok().as_deref() == Some(trait_type.name.as_str()));
                if !same_trait {
                    if !self.checker.is_implemented(&trait_type, actual) {
                        return Err(incompatible_types(location, pattern, ty));
                    }
                    let witness = Type::Impl {
                        trait_type,
                        implementation: Box::new(actual.clone()),
                    };
                    self.add_mapping(location, &pattern.representation(), &witness)?;
                    return Ok(true);
                }
            }
        }

        let pairs: Option<Vec<(&Type, &Type)>> = match (pattern, actual) {
            (Type::Function { arguments: left, .. }, Type::Function { arguments: right, .. })
            | (Type::Tuple { elements: left, .. }, Type::Tuple { elements: right, .. })
            | (
                Type::Intersection { params: left, .. },
                Type::Intersection { params: right, .. },
            ) => zip_exact(left, right),
            (
                Type::Parametric {
                    head: left_head,
                    params: left,
                    ..
                },
                Type::Parametric {
                    head: right_head,
                    params: right,
                    ..
                },
            ) => {
                if parametric_family(self.types, left_head)?
                    == parametric_family(self.types, right_head)?
                {
                    zip_exact(left, right)
                } else {
                    None
                }
            }
            (Type::Union { cases: left, .. }, Type::Union { cases: right, .. }) => {
                zip_cases(left, right)
            }
            _ => None,
        };

        let Some(pairs) = pairs else {
            return Err(incompatible_types(location, pattern, ty));
        };
        for (left, right) in pairs {
            self.extract(location, left, right)?;
        }
        Ok(true)
    }

    /// Replace every parameter in `ty` by its binding. `context` names the
    /// enclosing type in `SubstitutionNotFound` errors.
    pub fn substitute(
        &self,
        location: &Location,
        ty: &Type,
        context: &Type,
    ) -> Result<Type, TypeError> {
        match ty.substitution() {
            SubstitutionStrategy::Parameter => match ty {
                Type::Parameter { name, .. } => self.get_mapping(location, name, context),
                _ => Ok(ty.clone()),
            },
            SubstitutionStrategy::Alias => {
                let resolved = self.types.resolve(ty)?;
                self.substitute(location, &resolved, context)
            }
            SubstitutionStrategy::Inner => match ty {
                Type::Labeled { label, ty: inner } => Ok(Type::labeled(
                    label.clone(),
                    self.substitute(location, inner, context)?,
                )),
                Type::Annotated {
                    annotations,
                    ty: inner,
                } => Ok(Type::annotated(
                    annotations.clone(),
                    self.substitute(location, inner, context)?,
                )),
                _ => Ok(ty.clone()),
            },
            SubstitutionStrategy::Compound => self.substitute_compound(location, ty, context),
            SubstitutionStrategy::Impl => match ty {
                Type::Impl { trait_type, .. } => {
                    self.get_mapping(location, &trait_type.mapping_key(), context)
                }
                _ => Ok(ty.clone()),
            },
            SubstitutionStrategy::FixedTrait | SubstitutionStrategy::Identity => Ok(ty.clone()),
        }
    }

    fn substitute_all(
        &self,
        location: &Location,
        types: &[Type],
        context: &Type,
    ) -> Result<Vec<Type>, TypeError> {
        types
            .iter()
            .map(|ty| self.substitute(location, ty, context))
            .collect()
    }

    fn substitute_compound(
        &self,
        location: &Location,
        ty: &Type,
        context: &Type,
    ) -> Result<Type, TypeError> {
        match ty {
            Type::Parametric {
                head,
                params,
                attributes,
            } => {
                if let Type::Trait(_) = solved_head(self.types, head)? {
                    if let Ok(witness) = self.get_mapping(location, &ty.representation(), context) {
                        return Ok(witness);
                    }
                }
                Ok(Type::Parametric {
                    head: head.clone(),
                    params: self.substitute_all(location, params, context)?,
                    attributes: attributes.clone(),
                })
            }
            Type::Function {
                arguments,
                scope,
                attributes,
            } => Ok(Type::Function {
                arguments: self.substitute_all(location, arguments, context)?,
                scope: scope.clone(),
                attributes: attributes.clone(),
            }),
            Type::Tuple {
                elements,
                attributes,
            } => Ok(Type::Tuple {
                elements: self.substitute_all(location, elements, context)?,
                attributes: attributes.clone(),
            }),
            Type::Intersection { params, attributes } => Ok(Type::Intersection {
                params: self.substitute_all(location, params, context)?,
                attributes: attributes.clone(),
            }),
            Type::Union { cases, attributes } => {
                let cases = cases
                    .iter()
                    .map(|case| {
                        self.substitute_all(location, &case.params, context)
                            .map(|params| ClassType::new(case.label.clone(), params))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Type::Union {
                    cases,
                    attributes: attributes.clone(),
                })
            }
            _ => Ok(ty.clone()),
        }
    }
}

fn zip_exact<'t>(left: &'t [Type], right: &'t [Type]) -> Option<Vec<(&'t Type, &'t Type)>> {
    (left.len() == right.len()).then(|| left.iter().zip(right).collect())
}

fn zip_cases<'t>(
    left: &'t [ClassType],
    right: &'t [ClassType],
) -> Option<Vec<(&'t Type, &'t Type)>> {
    if left.len() != right.len() {
        return None;
    }
    let mut pairs = Vec::new();
    for (l, r) in left.iter().zip(right) {
        if l.label != r.label {
            return None;
        }
        pairs.extend(zip_exact(&l.params, &r.params)?);
    }
    Some(pairs)
}
