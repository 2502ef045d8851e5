//! The K# type-system engine.
//!
//! Types are registered into an immutable [`TypeSystem`] through a staged
//! [`TypeSystemBuilder`] that collects every error instead of failing fast.
//! Once built, a registry can unify two types ([`unify`]), bind and
//! substitute type parameters ([`subst`]) and normalize aliases and
//! parametric indirections into canonical form ([`solve`]).

pub mod annotation;
pub mod attributes;
pub mod diagnostics;
pub mod error;
pub mod numeric;
pub mod prelude;
pub mod registry;
pub mod solve;
pub mod subst;
pub mod ty;
pub mod unify;
pub mod validate;

pub use annotation::Annotation;
pub use attributes::{Attribute, Attributes};
pub use diagnostics::{render_diagnostic, render_errors, DiagnosticOptions};
pub use error::{TypeError, TypeSystemErrorCode};
pub use numeric::Numeric;
pub use prelude::prelude;
pub use registry::{
    ModuleTypeSystemBuilder, PartialTypeSystem, TypeItemBuilder, TypeSystem, TypeSystemBuilder,
};
pub use subst::SubstitutionContext;
pub use ty::{ClassType, FunctionScope, MethodType, TraitType, Type, TypeVisibility};
pub use unify::{NoImplementations, TraitChecker};
