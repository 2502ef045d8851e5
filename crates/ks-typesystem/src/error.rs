//! Error codes produced by the type-system engine.

use ks_common::{Error, ErrorCode, Location};
use serde::Serialize;

use crate::ty::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeSystemErrorCode {
    InvalidName,
    NoParametrizedType,
    ParametricTypeWithoutParameters,
    InvalidNumberOfParameters,
    TypeNotFound,
    TypeAlreadyRegistered,
    TypeNameShouldStartWithUpperCase,
    TypeParamNameShouldStartWithLowerCase,
    FunctionNameShouldntHaveSpaces,
    InvalidFunctionType,
    IntersectionTypeShouldBeTraits,
    IncompatibleTypes,
    SubstitutionNotFound,
    DuplicateTraitMethod,
    CyclicAlias,
}

impl ErrorCode for TypeSystemErrorCode {
    fn name(&self) -> &'static str {
        match self {
            Self::InvalidName => "InvalidName",
            Self::NoParametrizedType => "NoParametrizedType",
            Self::ParametricTypeWithoutParameters => "ParametricTypeWithoutParameters",
            Self::InvalidNumberOfParameters => "InvalidNumberOfParameters",
            Self::TypeNotFound => "TypeNotFound",
            Self::TypeAlreadyRegistered => "TypeAlreadyRegistered",
            Self::TypeNameShouldStartWithUpperCase => "TypeNameShouldStartWithUpperCase",
            Self::TypeParamNameShouldStartWithLowerCase => "TypeParamNameShouldStartWithLowerCase",
            Self::FunctionNameShouldntHaveSpaces => "FunctionNameShouldntHaveSpaces",
            Self::InvalidFunctionType => "InvalidFunctionType",
            Self::IntersectionTypeShouldBeTraits => "IntersectionTypeShouldBeTraits",
            Self::IncompatibleTypes => "IncompatibleTypes",
            Self::SubstitutionNotFound => "SubstitutionNotFound",
            Self::DuplicateTraitMethod => "DuplicateTraitMethod",
            Self::CyclicAlias => "CyclicAlias",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::InvalidName => "Name should contains [a-zA-Z0-9_]: {name}",
            Self::NoParametrizedType => "Type '{type}' is not parametrized",
            Self::ParametricTypeWithoutParameters => "Parametric Type '{type}' without parameters",
            Self::InvalidNumberOfParameters => {
                "Type '{type}' requires {number} parameters: '{configuredType}'"
            }
            Self::TypeNotFound => "Type '{type}' not found",
            Self::TypeAlreadyRegistered => "Type '{type}' already registered",
            Self::TypeNameShouldStartWithUpperCase => {
                "Type name should start with a Uppercase letter: '{name}'"
            }
            Self::TypeParamNameShouldStartWithLowerCase => {
                "Type param should start with a lowercase letter: '{name}'"
            }
            Self::FunctionNameShouldntHaveSpaces => "Function names shouldn't have spaces: '{name}'",
            Self::InvalidFunctionType => {
                "Functions should have at least one argument and a return type"
            }
            Self::IntersectionTypeShouldBeTraits => "Intersection type should be Traits: '{name}'",
            Self::IncompatibleTypes => "Type {type1} is not compatible with {type2}",
            Self::SubstitutionNotFound => "Substitution for param '{param}' not found in '{type}'",
            Self::DuplicateTraitMethod => "Duplicate trait method '{name}' in trait '{trait}'",
            Self::CyclicAlias => "Type '{type}' is defined by a cyclic alias chain: {chain}",
        }
    }
}

/// An error raised by the type-system engine.
pub type TypeError = Error<TypeSystemErrorCode>;

impl TypeSystemErrorCode {
    /// Start an error of this kind without a location.
    pub fn new(self) -> TypeError {
        Error::new(self, None)
    }

    /// Start an error of this kind at `location`.
    pub fn at(self, location: &Location) -> TypeError {
        Error::new(self, Some(location.clone()))
    }
}

/// `IncompatibleTypes` carrying both printable representations.
pub fn incompatible_types(location: &Location, type1: &Type, type2: &Type) -> TypeError {
    TypeSystemErrorCode::IncompatibleTypes
        .at(location)
        .with("type1", type1.representation())
        .with("type2", type2.representation())
}

pub(crate) fn type_not_found(name: &str) -> TypeError {
    TypeSystemErrorCode::TypeNotFound.new().with("type", name)
}
