//! Normalization of types into canonical structural form.

use tracing::trace;

use crate::error::TypeError;
use crate::registry::{enter_alias, TypeSystem};
use crate::ty::{ClassType, SolverStrategy, Type};

/// Expands aliases, resolves parametric heads and drops `Impl` wrappers.
///
/// `types` is the registry names are currently looked up in; expanding an
/// alias that lives in an imported module switches to that module.
///
/// `expanding` holds the alias names currently being expanded; a repeat is
/// a cyclic alias. Unions are nominal: inside a union case, a reference to
/// another union (or to the union itself) stays a named alias, so recursive
/// unions solve and solving twice changes nothing.
pub(crate) struct Solver<'a> {
    types: &'a TypeSystem,
    expanding: Vec<String>,
    union_depth: usize,
}

impl<'a> Solver<'a> {
    pub(crate) fn new(types: &'a TypeSystem) -> Self {
        Self {
            types,
            expanding: Vec::new(),
            union_depth: 0,
        }
    }

    pub(crate) fn solve(&mut self, ty: &Type) -> Result<Type, TypeError> {
        match ty.solver() {
            SolverStrategy::PassThrough => Ok(ty.clone()),
            SolverStrategy::Alias => self.solve_alias(ty),
            SolverStrategy::Parametric => self.solve_parametric(ty),
            SolverStrategy::Compound => self.solve_compound(ty),
            SolverStrategy::Impl => match ty {
                Type::Impl { implementation, .. } => self.solve(implementation),
                _ => Ok(ty.clone()),
            },
            SolverStrategy::Inner => match ty {
                Type::Labeled { label, ty } => Ok(Type::labeled(label.clone(), self.solve(ty)?)),
                Type::Annotated { annotations, ty } => {
                    Ok(Type::annotated(annotations.clone(), self.solve(ty)?))
                }
                _ => Ok(ty.clone()),
            },
        }
    }

    fn solve_alias(&mut self, ty: &Type) -> Result<Type, TypeError> {
        let (Type::Alias { name } | Type::TypeAlias { name, .. }) = ty else {
            return Ok(ty.clone());
        };
        let types = self.types;
        if self.union_depth > 0 {
            let (_, resolved) = types.resolve_owned(ty)?;
            if matches!(resolved.inner(), Type::Union { .. }) {
                trace!(name, "union reference");
                return Ok(Type::alias(name.clone()));
            }
        }

        let mut chain = self.expanding.clone();
        enter_alias(name, &mut chain)?;
        self.expanding.push(name.clone());
        let solved = match types.resolve_owned(ty) {
            Ok((owner, resolved)) => {
                self.types = owner;
                let solved = self.solve(&resolved);
                self.types = types;
                solved
            }
            Err(err) => Err(err),
        };
        self.expanding.pop();
        solved
    }

    fn resolve_head(&mut self, head: &Type) -> Result<Type, TypeError> {
        match self.solve(head)? {
            Type::Parametric { head: solved, .. } if solved.as_ref() == head => Ok(*solved),
            Type::Parametric { head: solved, .. } => self.resolve_head(&solved),
            other => Ok(other),
        }
    }

    fn solve_parametric(&mut self, ty: &Type) -> Result<Type, TypeError> {
        let Type::Parametric {
            head,
            params,
            attributes,
        } = ty
        else {
            return Ok(ty.clone());
        };
        let head = self.resolve_head(head)?;
        let params = self.solve_all(params)?;
        let attributes = head.attributes().merge(attributes);
        Ok(Type::Parametric {
            head: Box::new(head),
            params,
            attributes,
        })
    }

    fn solve_compound(&mut self, ty: &Type) -> Result<Type, TypeError> {
        match ty {
            Type::Function {
                arguments,
                scope,
                attributes,
            } => Ok(Type::Function {
                arguments: self.solve_all(arguments)?,
                scope: scope.clone(),
                attributes: attributes.clone(),
            }),
            Type::Tuple {
                elements,
                attributes,
            } => Ok(Type::Tuple {
                elements: self.solve_all(elements)?,
                attributes: attributes.clone(),
            }),
            Type::Union { cases, attributes } => {
                self.union_depth += 1;
                let solved: Result<Vec<ClassType>, TypeError> = cases
                    .iter()
                    .map(|case| -> Result<ClassType, TypeError> {
                        Ok(ClassType::new(
                            case.label.clone(),
                            self.solve_all(&case.params)?,
                        ))
                    })
                    .collect();
                self.union_depth -= 1;
                Ok(Type::Union {
                    cases: solved?,
                    attributes: attributes.clone(),
                })
            }
            _ => Ok(ty.clone()),
        }
    }

    fn solve_all(&mut self, types: &[Type]) -> Result<Vec<Type>, TypeError> {
        types.iter().map(|ty| self.solve(ty)).collect()
    }
}
