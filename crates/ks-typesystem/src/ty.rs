//! Type representation for the K# type system.
//!
//! Defines the closed `Type` enum together with the per-kind strategy tags
//! (unification, substitution, solving and serialization) that the engines
//! dispatch on. Types are immutable values: every engine operation that
//! "changes" a type builds a new one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::attributes::Attributes;
use crate::numeric::Numeric;

static NO_ATTRIBUTES: Attributes = Attributes::none();

static NEXT_PARAMETER: AtomicU64 = AtomicU64::new(0);

/// Whether a type parameter was written by the user or synthesized by the
/// compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeVisibility {
    #[default]
    Public,
    Internal,
}

/// Where a function type was declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionScope {
    #[default]
    Module,
    /// Declared as a method of the named trait.
    Trait(String),
}

/// One case of a union: a label applied to positional parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub label: String,
    pub params: Vec<Type>,
}

impl ClassType {
    pub fn new(label: impl Into<String>, params: Vec<Type>) -> Self {
        Self {
            label: label.into(),
            params,
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        for param in &self.params {
            write!(f, " {}", param.representation())?;
        }
        Ok(())
    }
}

/// A method signature declared inside a trait.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodType {
    pub trait_name: String,
    pub name: String,
    /// Parameter types followed by the return type.
    pub arguments: Vec<Type>,
    pub default_impl: bool,
    pub attributes: Attributes,
}

impl MethodType {
    pub fn arity(&self) -> usize {
        self.arguments.len().saturating_sub(1)
    }

    /// The `name/arity` key a trait indexes this method by.
    pub fn key(&self) -> String {
        format!("{}/{}", self.name, self.arity())
    }

    /// The equivalent function type, scoped to the owning trait.
    pub fn to_function(&self) -> Type {
        Type::Function {
            arguments: self.arguments.clone(),
            scope: FunctionScope::Trait(self.trait_name.clone()),
            attributes: self.attributes.clone(),
        }
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.arguments.iter().map(Type::representation).collect();
        write!(f, "{} :: {}", self.name, args.join(" -> "))
    }
}

/// A named set of method signatures over one type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraitType {
    pub name: String,
    pub param: String,
    /// Methods in declaration order.
    pub methods: Vec<MethodType>,
    pub attributes: Attributes,
}

impl TraitType {
    pub fn method(&self, name: &str, arity: usize) -> Option<&MethodType> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arity() == arity)
    }

    /// `Trait param` as a parametric type.
    pub fn to_parametric(&self) -> Type {
        Type::Parametric {
            head: Box::new(Type::Trait(self.clone())),
            params: vec![Type::parameter(self.param.clone())],
            attributes: self.attributes.clone(),
        }
    }

    /// Key under which a substitution context records the witness for this
    /// trait. Matches the representation of [`TraitType::to_parametric`].
    pub fn mapping_key(&self) -> String {
        format!("({} {})", self.name, self.param)
    }
}

impl fmt::Display for TraitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trait {} {} =", self.name, self.param)?;
        for method in &self.methods {
            write!(f, "\n    {method}")?;
        }
        Ok(())
    }
}

/// A K# type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// An unbound type variable.
    Parameter {
        name: String,
        visibility: TypeVisibility,
    },
    /// An atomic named type.
    Concrete { name: String, attributes: Attributes },
    /// A reference to another registered type, solved away.
    Alias { name: String },
    /// A registered name standing for another registered type. Its
    /// attributes are merged into the target when resolved.
    TypeAlias { name: String, attributes: Attributes },
    /// A head applied to positional arguments: `List a`.
    Parametric {
        head: Box<Type>,
        params: Vec<Type>,
        attributes: Attributes,
    },
    /// Parameter types followed by the return type.
    Function {
        arguments: Vec<Type>,
        scope: FunctionScope,
        attributes: Attributes,
    },
    Tuple {
        elements: Vec<Type>,
        attributes: Attributes,
    },
    /// A sum type; case labels are unique.
    Union {
        cases: Vec<ClassType>,
        attributes: Attributes,
    },
    /// An intersection of traits, each constituent an `Alias`.
    Intersection {
        params: Vec<Type>,
        attributes: Attributes,
    },
    Trait(TraitType),
    Method(MethodType),
    /// Records that `implementation` satisfies `trait_type`.
    Impl {
        trait_type: TraitType,
        implementation: Box<Type>,
    },
    /// A proven trait obligation whose witness no longer matters.
    FixedTrait(TraitType),
    /// A union case label, resolving to its owning union `alias`.
    TypeConstructor {
        name: String,
        alias: String,
        attributes: Attributes,
    },
    Labeled { label: String, ty: Box<Type> },
    Annotated {
        annotations: Vec<Annotation>,
        ty: Box<Type>,
    },
    Numeric {
        kind: Numeric,
        attributes: Attributes,
    },
}

/// Which unification algorithm a type drives when it is the left side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnificationStrategy {
    Default,
    Parameter,
    Alias,
    /// Labeled and annotated wrappers unify through their inner type.
    Inner,
    TypeConstructor,
    /// Function, tuple and parametric types.
    Compound,
    Union,
    Intersection,
    Trait,
    Method,
    Impl,
    FixedTrait,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionStrategy {
    Identity,
    Parameter,
    Alias,
    Inner,
    Compound,
    Impl,
    FixedTrait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStrategy {
    PassThrough,
    Alias,
    Parametric,
    Compound,
    Impl,
    Inner,
}

/// Names the writer/reader pair a bytecode serializer uses for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSerializer {
    Parameter,
    Concrete,
    Alias,
    TypeAlias,
    ParametricType,
    FunctionType,
    TupleType,
    UnionType,
    IntersectionType,
    TraitType,
    MethodType,
    ImplType,
    FixedTraitType,
    ConstructorType,
    Labeled,
    Annotated,
    NumericType,
}

impl Type {
    pub fn concrete(name: impl Into<String>) -> Type {
        Type::Concrete {
            name: name.into(),
            attributes: Attributes::none(),
        }
    }

    pub fn alias(name: impl Into<String>) -> Type {
        Type::Alias { name: name.into() }
    }

    pub fn parameter(name: impl Into<String>) -> Type {
        Type::Parameter {
            name: name.into(),
            visibility: TypeVisibility::Public,
        }
    }

    /// A compiler-synthesized parameter with a process-unique name (`@N`).
    pub fn fresh_parameter() -> Type {
        let id = NEXT_PARAMETER.fetch_add(1, Ordering::Relaxed);
        Type::Parameter {
            name: format!("@{id}"),
            visibility: TypeVisibility::Internal,
        }
    }

    pub fn parametric(head: Type, params: Vec<Type>) -> Type {
        Type::Parametric {
            head: Box::new(head),
            params,
            attributes: Attributes::none(),
        }
    }

    pub fn function(arguments: Vec<Type>) -> Type {
        Type::Function {
            arguments,
            scope: FunctionScope::Module,
            attributes: Attributes::none(),
        }
    }

    pub fn tuple(elements: Vec<Type>) -> Type {
        Type::Tuple {
            elements,
            attributes: Attributes::none(),
        }
    }

    pub fn numeric(kind: Numeric) -> Type {
        Type::Numeric {
            kind,
            attributes: Attributes::none(),
        }
    }

    pub fn labeled(label: impl Into<String>, ty: Type) -> Type {
        Type::Labeled {
            label: label.into(),
            ty: Box::new(ty),
        }
    }

    pub fn annotated(annotations: Vec<Annotation>, ty: Type) -> Type {
        Type::Annotated {
            annotations,
            ty: Box::new(ty),
        }
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, Type::Parameter { .. })
    }

    /// Strip labels and annotations.
    pub fn inner(&self) -> &Type {
        let mut ty = self;
        while let Type::Labeled { ty: inner, .. } | Type::Annotated { ty: inner, .. } = ty {
            ty = inner.as_ref();
        }
        ty
    }

    /// Whether the type has structure printed in parentheses.
    pub fn compound(&self) -> bool {
        match self {
            Type::Parametric { .. }
            | Type::Function { .. }
            | Type::Tuple { .. }
            | Type::Intersection { .. } => true,
            Type::Impl { implementation, .. } => implementation.compound(),
            Type::Annotated { ty, .. } => ty.compound(),
            _ => false,
        }
    }

    /// Immediate sub-terms.
    pub fn terms(&self) -> Vec<&Type> {
        match self {
            Type::Parametric { head, params, .. } => {
                std::iter::once(head.as_ref()).chain(params.iter()).collect()
            }
            Type::Function { arguments, .. } => arguments.iter().collect(),
            Type::Tuple { elements, .. } => elements.iter().collect(),
            Type::Union { cases, .. } => cases.iter().flat_map(|c| c.params.iter()).collect(),
            Type::Intersection { params, .. } => params.iter().collect(),
            Type::Trait(trait_type) | Type::FixedTrait(trait_type) => trait_type
                .methods
                .iter()
                .flat_map(|m| m.arguments.iter())
                .collect(),
            Type::Method(method) => method.arguments.iter().collect(),
            Type::Impl { implementation, .. } => implementation.terms(),
            Type::Labeled { ty, .. } | Type::Annotated { ty, .. } => vec![ty.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Canonical printable form. Compound types are parenthesised.
    pub fn representation(&self) -> String {
        match self {
            Type::Annotated { .. } | Type::Impl { .. } => self.to_string(),
            _ if self.compound() => format!("({self})"),
            _ => self.to_string(),
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            Type::Concrete { attributes, .. }
            | Type::TypeAlias { attributes, .. }
            | Type::Parametric { attributes, .. }
            | Type::Function { attributes, .. }
            | Type::Tuple { attributes, .. }
            | Type::Union { attributes, .. }
            | Type::Intersection { attributes, .. }
            | Type::TypeConstructor { attributes, .. }
            | Type::Numeric { attributes, .. } => attributes,
            Type::Trait(trait_type) | Type::FixedTrait(trait_type) => &trait_type.attributes,
            Type::Method(method) => &method.attributes,
            Type::Impl { implementation, .. } => implementation.attributes(),
            Type::Labeled { ty, .. } | Type::Annotated { ty, .. } => ty.attributes(),
            Type::Parameter { .. } | Type::Alias { .. } => &NO_ATTRIBUTES,
        }
    }

    /// A copy of this type carrying `attributes`. Kinds without attributes
    /// are returned unchanged.
    pub fn with_attributes(&self, attributes: Attributes) -> Type {
        let mut ty = self.clone();
        match &mut ty {
            Type::Concrete { attributes: a, .. }
            | Type::TypeAlias { attributes: a, .. }
            | Type::Parametric { attributes: a, .. }
            | Type::Function { attributes: a, .. }
            | Type::Tuple { attributes: a, .. }
            | Type::Union { attributes: a, .. }
            | Type::Intersection { attributes: a, .. }
            | Type::TypeConstructor { attributes: a, .. }
            | Type::Numeric { attributes: a, .. } => *a = attributes,
            Type::Trait(trait_type) | Type::FixedTrait(trait_type) => {
                trait_type.attributes = attributes
            }
            Type::Method(method) => method.attributes = attributes,
            Type::Impl { implementation, .. } => {
                **implementation = implementation.with_attributes(attributes)
            }
            Type::Labeled { ty: inner, .. } | Type::Annotated { ty: inner, .. } => {
                **inner = inner.with_attributes(attributes)
            }
            Type::Parameter { .. } | Type::Alias { .. } => {}
        }
        ty
    }

    pub fn annotations(&self) -> &[Annotation] {
        match self {
            Type::Annotated { annotations, .. } => annotations,
            _ => &[],
        }
    }

    // ── Strategies ──────────────────────────────────────────────────────

    pub fn unification(&self) -> UnificationStrategy {
        match self {
            Type::Parameter { .. } => UnificationStrategy::Parameter,
            Type::Concrete { .. } => UnificationStrategy::Default,
            Type::Alias { .. } | Type::TypeAlias { .. } => UnificationStrategy::Alias,
            Type::Parametric { .. } | Type::Function { .. } | Type::Tuple { .. } => {
                UnificationStrategy::Compound
            }
            Type::Union { .. } => UnificationStrategy::Union,
            Type::Intersection { .. } => UnificationStrategy::Intersection,
            Type::Trait(_) => UnificationStrategy::Trait,
            Type::Method(_) => UnificationStrategy::Method,
            Type::Impl { .. } => UnificationStrategy::Impl,
            Type::FixedTrait(_) => UnificationStrategy::FixedTrait,
            Type::TypeConstructor { .. } => UnificationStrategy::TypeConstructor,
            Type::Labeled { .. } | Type::Annotated { .. } => UnificationStrategy::Inner,
            Type::Numeric { .. } => UnificationStrategy::Numeric,
        }
    }

    pub fn substitution(&self) -> SubstitutionStrategy {
        match self {
            Type::Parameter { .. } => SubstitutionStrategy::Parameter,
            Type::Alias { .. } | Type::TypeAlias { .. } | Type::TypeConstructor { .. } => {
                SubstitutionStrategy::Alias
            }
            Type::Parametric { .. }
            | Type::Function { .. }
            | Type::Tuple { .. }
            | Type::Union { .. }
            | Type::Intersection { .. } => SubstitutionStrategy::Compound,
            Type::Impl { .. } => SubstitutionStrategy::Impl,
            Type::FixedTrait(_) => SubstitutionStrategy::FixedTrait,
            Type::Labeled { .. } | Type::Annotated { .. } => SubstitutionStrategy::Inner,
            Type::Concrete { .. }
            | Type::Trait(_)
            | Type::Method(_)
            | Type::Numeric { .. } => SubstitutionStrategy::Identity,
        }
    }

    pub fn solver(&self) -> SolverStrategy {
        match self {
            Type::Alias { .. } | Type::TypeAlias { .. } => SolverStrategy::Alias,
            Type::Parametric { .. } => SolverStrategy::Parametric,
            Type::Function { .. } | Type::Tuple { .. } | Type::Union { .. } => {
                SolverStrategy::Compound
            }
            Type::Impl { .. } => SolverStrategy::Impl,
            Type::Labeled { .. } | Type::Annotated { .. } => SolverStrategy::Inner,
            _ => SolverStrategy::PassThrough,
        }
    }

    pub fn serializer(&self) -> TypeSerializer {
        match self {
            Type::Parameter { .. } => TypeSerializer::Parameter,
            Type::Concrete { .. } => TypeSerializer::Concrete,
            Type::Alias { .. } => TypeSerializer::Alias,
            Type::TypeAlias { .. } => TypeSerializer::TypeAlias,
            Type::Parametric { .. } => TypeSerializer::ParametricType,
            Type::Function { .. } => TypeSerializer::FunctionType,
            Type::Tuple { .. } => TypeSerializer::TupleType,
            Type::Union { .. } => TypeSerializer::UnionType,
            Type::Intersection { .. } => TypeSerializer::IntersectionType,
            Type::Trait(_) => TypeSerializer::TraitType,
            Type::Method(_) => TypeSerializer::MethodType,
            Type::Impl { .. } => TypeSerializer::ImplType,
            Type::FixedTrait(_) => TypeSerializer::FixedTraitType,
            Type::TypeConstructor { .. } => TypeSerializer::ConstructorType,
            Type::Labeled { .. } => TypeSerializer::Labeled,
            Type::Annotated { .. } => TypeSerializer::Annotated,
            Type::Numeric { .. } => TypeSerializer::NumericType,
        }
    }
}

fn join(types: &[Type], separator: &str) -> String {
    types
        .iter()
        .map(Type::representation)
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Parameter { name, .. }
            | Type::Concrete { name, .. }
            | Type::Alias { name }
            | Type::TypeAlias { name, .. }
            | Type::TypeConstructor { name, .. } => write!(f, "{name}"),
            Type::Parametric { head, params, .. } => match head.as_ref() {
                Type::Trait(trait_type) => write!(f, "{} {}", trait_type.name, join(params, " ")),
                head => write!(f, "{} {}", head.representation(), join(params, " ")),
            },
            Type::Function { arguments, .. } => write!(f, "{}", join(arguments, " -> ")),
            Type::Tuple { elements, .. } => write!(f, "{}", join(elements, ", ")),
            Type::Union { cases, .. } => {
                let cases: Vec<String> = cases.iter().map(ToString::to_string).collect();
                write!(f, "{}", cases.join("\n|"))
            }
            Type::Intersection { params, .. } => write!(f, "{}", join(params, " & ")),
            Type::Trait(trait_type) | Type::FixedTrait(trait_type) => write!(f, "{trait_type}"),
            Type::Method(method) => write!(f, "{method}"),
            Type::Impl { implementation, .. } => write!(f, "{}", implementation.representation()),
            Type::Labeled { label, ty } => write!(f, "{label}: {}", ty.representation()),
            Type::Annotated { annotations, ty } => {
                for annotation in annotations {
                    write!(f, "{annotation} ")?;
                }
                write!(f, "{}", ty.representation())
            }
            Type::Numeric { kind, .. } => write!(f, "numeric<{kind}>"),
        }
    }
}
