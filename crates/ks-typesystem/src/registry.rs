//! Type registry: a staged builder and the immutable `TypeSystem` it
//! produces.
//!
//! Registration never fails fast. Each `register` call returns its own
//! outcome, and every error is also collected so that `build()` can hand
//! back the best-effort registry together with all problems found. Checks
//! that depend on types registered later (alias targets, parametric heads,
//! intersection constituents) are deferred until `build()`; an entry whose
//! deferred checks fail is left out of the built registry.

use std::sync::Arc;

use ks_common::{Location, PartialResult};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::annotation::Annotation;
use crate::attributes::{Attribute, Attributes};
use crate::error::{type_not_found, TypeError, TypeSystemErrorCode};
use crate::numeric::Numeric;
use crate::solve::Solver;
use crate::subst::SubstitutionContext;
use crate::ty::{ClassType, FunctionScope, MethodType, TraitType, Type};
use crate::unify::{TraitChecker, Unifier};
use crate::validate::{validate_function_name, validate_type_name, validate_type_param_name};

/// A built registry together with every error collected while building it.
pub type PartialTypeSystem = PartialResult<Arc<TypeSystem>, TypeError>;

type TypeValidation = Box<dyn Fn(&TypeLookup<'_>) -> Option<TypeError>>;

// ── TypeSystem ─────────────────────────────────────────────────────────

/// An immutable, name-indexed collection of types.
///
/// Lookups fall through to the parent registry. Names of the form
/// `Module.Name` are dispatched to the registry imported under `Module`.
#[derive(Debug, Default)]
pub struct TypeSystem {
    parent: Option<Arc<TypeSystem>>,
    entries: Vec<(String, Type)>,
    index: FxHashMap<String, usize>,
    imports: FxHashMap<String, Arc<TypeSystem>>,
}

impl TypeSystem {
    pub fn parent(&self) -> Option<&TypeSystem> {
        self.parent.as_deref()
    }

    /// Number of types registered directly in this registry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Own types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.entries.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn get(&self, name: &str) -> Result<&Type, TypeError> {
        self.lookup(name).ok_or_else(|| type_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// An `Alias` to `name`, provided the name is registered.
    pub fn alias(&self, name: &str) -> Result<Type, TypeError> {
        self.get(name).map(|_| Type::alias(name))
    }

    fn lookup(&self, name: &str) -> Option<&Type> {
        self.lookup_owned(name).map(|(_, ty)| ty)
    }

    /// The type registered as `name` together with the registry that owns
    /// it. Names inside a type are local to its owner.
    fn lookup_owned(&self, name: &str) -> Option<(&TypeSystem, &Type)> {
        if let Some(&ix) = self.index.get(name) {
            return Some((self, &self.entries[ix].1));
        }
        if let Some((key, rest)) = name.split_once('.') {
            if let Some(module) = self.imports.get(key) {
                return module.lookup_owned(rest);
            }
        }
        self.parent
            .as_deref()
            .and_then(|parent| parent.lookup_owned(name))
    }

    fn get_owned(&self, name: &str) -> Result<(&TypeSystem, &Type), TypeError> {
        self.lookup_owned(name).ok_or_else(|| type_not_found(name))
    }

    fn insert(&mut self, name: String, ty: Type) {
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, ty));
    }

    /// Dealias `ty` one level: aliases are chased through the registry,
    /// labels are kept around the resolved inner type and union case labels
    /// resolve to their union.
    pub fn resolve(&self, ty: &Type) -> Result<Type, TypeError> {
        self.resolve_owned(ty).map(|(_, resolved)| resolved)
    }

    /// Like [`resolve`](Self::resolve), also returning the registry the
    /// resolved type was found in. A type reached through a module import
    /// keeps resolving inside that module.
    pub(crate) fn resolve_owned(&self, ty: &Type) -> Result<(&TypeSystem, Type), TypeError> {
        self.resolve_guarded(ty, &mut Vec::new())
    }

    fn resolve_guarded(
        &self,
        ty: &Type,
        chain: &mut Vec<String>,
    ) -> Result<(&TypeSystem, Type), TypeError> {
        match ty {
            Type::Alias { name } => {
                enter_alias(name, chain)?;
                let (owner, target) = self.get_owned(name)?;
                owner.resolve_guarded(target, chain)
            }
            Type::TypeAlias { name, attributes } => {
                enter_alias(name, chain)?;
                let (owner, target) = self.get_owned(name)?;
                let (owner, resolved) = owner.resolve_guarded(target, chain)?;
                let merged = resolved.attributes().merge(attributes);
                Ok((owner, resolved.with_attributes(merged)))
            }
            Type::Labeled { label, ty } => {
                let (owner, inner) = self.resolve_guarded(ty, chain)?;
                Ok((owner, Type::labeled(label.clone(), inner)))
            }
            Type::TypeConstructor { alias, .. } => {
                let (owner, union) = self.get_owned(alias)?;
                Ok((owner, union.clone()))
            }
            _ => Ok((self, ty.clone())),
        }
    }

    /// Normalize `ty` into its canonical structural form.
    pub fn solve(&self, ty: &Type) -> Result<Type, TypeError> {
        Solver::new(self).solve(ty)
    }

    /// Check `type1` (expected) against `type2` (actual) and return the most
    /// specific compatible type.
    pub fn unify(
        &self,
        location: &Location,
        type1: &Type,
        type2: &Type,
        checker: &dyn TraitChecker,
    ) -> Result<Type, TypeError> {
        let unified = Unifier::new(self, checker).unify(location, type1, type2);
        if let Err(err) = &unified {
            debug!(
                type1 = %type1.representation(),
                type2 = %type2.representation(),
                error = %err,
                "unification failed"
            );
        }
        unified
    }

    /// A fresh, empty substitution context over this registry.
    pub fn substitution_context<'a>(
        &'a self,
        checker: &'a dyn TraitChecker,
    ) -> SubstitutionContext<'a> {
        SubstitutionContext::new(self, checker)
    }
}

pub(crate) fn enter_alias(name: &str, chain: &mut Vec<String>) -> Result<(), TypeError> {
    if chain.iter().any(|seen| seen == name) {
        let mut path = chain.clone();
        path.push(name.to_string());
        let path = path.join(" -> ");
        debug!(name, chain = %path, "cyclic alias");
        return Err(TypeSystemErrorCode::CyclicAlias
            .new()
            .with("type", name)
            .with("chain", path));
    }
    chain.push(name.to_string());
    Ok(())
}

// ── Builder ────────────────────────────────────────────────────────────

struct Entry {
    name: String,
    ty: Type,
    validations: Vec<TypeValidation>,
    /// Union case labels are kept only while their union is.
    owner: Option<usize>,
}

/// Read access to the types registered so far (and the parent chain),
/// handed to factories and deferred validations.
#[derive(Clone, Copy)]
pub struct TypeLookup<'a> {
    entries: &'a [Entry],
    index: &'a FxHashMap<String, usize>,
    parent: Option<&'a TypeSystem>,
    /// Entries excluded while building. Empty during registration.
    rejected: &'a [bool],
}

impl<'a> TypeLookup<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Type> {
        match self.index.get(name) {
            Some(&ix) if self.rejected.get(ix).copied().unwrap_or(false) => None,
            Some(&ix) => Some(&self.entries[ix].ty),
            None => self.parent.and_then(|parent| parent.lookup(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Staged, single-owner builder for a [`TypeSystem`].
#[derive(Default)]
pub struct TypeSystemBuilder {
    parent: Option<Arc<TypeSystem>>,
    parent_errors: Vec<TypeError>,
    entries: Vec<Entry>,
    index: FxHashMap<String, usize>,
    errors: Vec<TypeError>,
}

impl TypeSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder whose lookups fall back to `parent`. Errors collected while
    /// building the parent are carried into this builder's result.
    pub fn with_parent(parent: &PartialTypeSystem) -> Self {
        Self {
            parent: Some(Arc::clone(&parent.value)),
            parent_errors: parent.errors.clone(),
            ..Self::default()
        }
    }

    fn lookup(&self) -> TypeLookup<'_> {
        TypeLookup {
            entries: &self.entries,
            index: &self.index,
            parent: self.parent.as_deref(),
            rejected: &[],
        }
    }

    /// Register `name` with the type produced by `factory`.
    ///
    /// A factory yielding `Alias(name)` declares a concrete type; one
    /// yielding an alias to another name declares a `TypeAlias`.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut TypeItemBuilder<'_>) -> Result<Type, TypeError>,
    {
        self.register_with(name, Attributes::none(), Vec::new(), factory)
    }

    /// Like [`register`](Self::register), with attributes and annotations.
    /// Annotated registrations are stored wrapped in `Type::Annotated`.
    pub fn register_with<F>(
        &mut self,
        name: &str,
        attributes: Attributes,
        annotations: Vec<Annotation>,
        factory: F,
    ) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut TypeItemBuilder<'_>) -> Result<Type, TypeError>,
    {
        let outcome = self.create(name, attributes, annotations, factory);
        if let Err(err) = &outcome {
            debug!(name, error = %err, "type registration failed");
            self.errors.push(err.clone());
        }
        outcome
    }

    fn create<F>(
        &mut self,
        name: &str,
        attributes: Attributes,
        annotations: Vec<Annotation>,
        factory: F,
    ) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut TypeItemBuilder<'_>) -> Result<Type, TypeError>,
    {
        validate_type_name(name)?;
        let lookup = self.lookup();
        if lookup.contains(name) {
            return Err(TypeSystemErrorCode::TypeAlreadyRegistered
                .new()
                .with("type", name));
        }

        let mut item = TypeItemBuilder::new(name, attributes.clone(), lookup);
        let ty = factory(&mut item)?;
        let (validations, constructors) = item.into_parts();

        let ty = match ty {
            Type::Alias { name: target } if target == name => Type::Concrete {
                name: target,
                attributes,
            },
            Type::Alias { name: target } => Type::TypeAlias {
                name: target,
                attributes,
            },
            other => other,
        };
        let ty = if annotations.is_empty() {
            ty
        } else {
            Type::annotated(annotations, ty)
        };

        trace!(name, ty = %ty.representation(), "registered type");
        let owner = self.insert(name, ty.clone(), validations, None);
        for (label, constructor) in constructors {
            self.insert(&label, constructor, Vec::new(), Some(owner));
        }
        Ok(ty)
    }

    fn insert(
        &mut self,
        name: &str,
        ty: Type,
        validations: Vec<TypeValidation>,
        owner: Option<usize>,
    ) -> usize {
        let ix = self.entries.len();
        self.index.insert(name.to_string(), ix);
        self.entries.push(Entry {
            name: name.to_string(),
            ty,
            validations,
            owner,
        });
        ix
    }

    /// Register a concrete type named `name`.
    pub fn concrete(&mut self, name: &str) -> Result<Type, TypeError> {
        self.register(name, |item| item.concrete())
    }

    /// Register a parametric type whose head is `name` itself.
    pub fn parametric_type<F>(&mut self, name: &str, params: F) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut ParametricBuilder<'_, '_>),
    {
        self.register(name, |item| item.parametric(name, params))
    }

    /// Register a union type.
    pub fn union_type<F>(&mut self, name: &str, cases: F) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut UnionBuilder<'_, '_>),
    {
        self.register(name, |item| item.union(cases))
    }

    /// Register a trait over the type parameter `param`.
    pub fn trait_type<F>(
        &mut self,
        name: &str,
        attributes: Attributes,
        param: &str,
        methods: F,
    ) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut TraitBuilder<'_, '_>),
    {
        self.register_with(name, attributes, Vec::new(), |item| {
            validate_type_param_name(param)?;
            let mut builder = TraitBuilder {
                trait_name: item.name().to_string(),
                item: &mut *item,
                result: Ok(Vec::new()),
            };
            methods(&mut builder);
            let methods = builder.result?;
            Ok(Type::Trait(TraitType {
                name: name.to_string(),
                param: param.to_string(),
                methods,
                attributes: item.attributes().clone(),
            }))
        })
    }

    /// Run deferred validations and freeze the registry.
    pub fn build(self) -> PartialTypeSystem {
        let TypeSystemBuilder {
            parent,
            parent_errors,
            entries,
            index,
            mut errors,
        } = self;

        // Excluding an entry can break the entries that refer to it, so
        // validation repeats over the remaining entries until nothing more
        // is excluded. Each entry reports its errors at most once.
        let mut rejected = vec![false; entries.len()];
        loop {
            let lookup = TypeLookup {
                entries: &entries,
                index: &index,
                parent: parent.as_deref(),
                rejected: &rejected,
            };
            let mut excluded = Vec::new();
            for (ix, entry) in entries.iter().enumerate() {
                if rejected[ix] {
                    continue;
                }
                if entry.owner.is_some_and(|owner| rejected[owner]) {
                    trace!(name = %entry.name, "union case dropped with its union");
                    excluded.push(ix);
                    continue;
                }
                let failures: Vec<TypeError> = entry
                    .validations
                    .iter()
                    .filter_map(|validation| validation(&lookup))
                    .collect();
                if !failures.is_empty() {
                    for err in &failures {
                        debug!(name = %entry.name, error = %err, "deferred validation failed");
                    }
                    errors.extend(failures);
                    excluded.push(ix);
                }
            }
            if excluded.is_empty() {
                break;
            }
            for ix in excluded {
                rejected[ix] = true;
            }
        }

        let mut system = TypeSystem {
            parent,
            ..TypeSystem::default()
        };
        for (entry, rejected) in entries.into_iter().zip(rejected) {
            if !rejected {
                system.insert(entry.name, entry.ty);
            }
        }

        let mut all_errors = parent_errors;
        all_errors.extend(errors);
        debug!(
            types = system.len(),
            errors = all_errors.len(),
            "type system built"
        );
        PartialResult::new(Arc::new(system), all_errors)
    }
}

// ── Item builders ──────────────────────────────────────────────────────

/// Handed to a registration factory. Builds the registered type and records
/// the deferred validations it depends on.
pub struct TypeItemBuilder<'a> {
    name: String,
    attributes: Attributes,
    lookup: TypeLookup<'a>,
    validations: Vec<TypeValidation>,
    constructors: Vec<(String, Type)>,
}

impl<'a> TypeItemBuilder<'a> {
    fn new(name: &str, attributes: Attributes, lookup: TypeLookup<'a>) -> Self {
        Self {
            name: name.to_string(),
            attributes,
            lookup,
            validations: Vec::new(),
            constructors: Vec::new(),
        }
    }

    fn into_parts(self) -> (Vec<TypeValidation>, Vec<(String, Type)>) {
        (self.validations, self.constructors)
    }

    /// Name being registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// A type registered so far, including the parent chain.
    pub fn get(&self, name: &str) -> Option<&Type> {
        self.lookup.get(name).or_else(|| {
            self.constructors
                .iter()
                .find(|(label, _)| label == name)
                .map(|(_, ty)| ty)
        })
    }

    pub fn is_type_name_taken(&self, name: &str) -> bool {
        name == self.name || self.get(name).is_some()
    }

    /// Add a check that runs at `build()` against the final set of types.
    pub fn validation<V>(&mut self, rule: V)
    where
        V: Fn(&TypeLookup<'_>) -> Option<TypeError> + 'static,
    {
        self.validations.push(Box::new(rule));
    }

    pub fn concrete(&self) -> Result<Type, TypeError> {
        Ok(Type::Concrete {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
        })
    }

    /// A reference to `name`, which must exist once the registry is built.
    pub fn alias(&mut self, name: &str) -> Result<Type, TypeError> {
        let target = name.to_string();
        self.validation(move |types| {
            if types.contains(&target) {
                None
            } else {
                Some(type_not_found(&target))
            }
        });
        Ok(Type::alias(name))
    }

    pub fn parameter(&self, name: &str) -> Result<Type, TypeError> {
        validate_type_param_name(name)?;
        Ok(Type::parameter(name))
    }

    pub fn numeric(&self, kind: Numeric) -> Result<Type, TypeError> {
        Ok(Type::Numeric {
            kind,
            attributes: self.attributes.clone(),
        })
    }

    fn collect<F>(&mut self, f: F) -> Result<Vec<Type>, TypeError>
    where
        F: FnOnce(&mut ParametricBuilder<'_, 'a>),
    {
        let mut builder = ParametricBuilder {
            item: self,
            result: Ok(Vec::new()),
        };
        f(&mut builder);
        builder.result
    }

    /// `name` applied to the parameters added by `params`.
    ///
    /// When `name` is the type being registered this declares a new
    /// parametric type, which needs at least one parameter. Otherwise it
    /// references an existing parametric type, whose arity is checked at
    /// `build()`.
    pub fn parametric<F>(&mut self, name: &str, params: F) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut ParametricBuilder<'_, 'a>),
    {
        let params = self.collect(params)?;
        if name == self.name {
            if params.is_empty() {
                return Err(TypeSystemErrorCode::ParametricTypeWithoutParameters
                    .new()
                    .with("type", name));
            }
            return Ok(Type::Parametric {
                head: Box::new(self.concrete()?),
                params,
                attributes: self.attributes.clone(),
            });
        }

        let head = self.alias(name)?;
        let target = name.to_string();
        let configured = params.clone();
        self.validation(move |types| match types.get(&target).map(Type::inner) {
            None => None,
            Some(
                registered @ Type::Parametric {
                    head,
                    params: expected,
                    ..
                },
            ) => (expected.len() != configured.len()).then(|| {
                TypeSystemErrorCode::InvalidNumberOfParameters
                    .new()
                    .with("type", registered.representation())
                    .with("number", expected.len())
                    .with(
                        "configuredType",
                        Type::parametric((**head).clone(), configured.clone()).representation(),
                    )
            }),
            Some(_) => Some(
                TypeSystemErrorCode::NoParametrizedType
                    .new()
                    .with("type", &target),
            ),
        });
        Ok(Type::Parametric {
            head: Box::new(head),
            params,
            attributes: self.attributes.clone(),
        })
    }

    /// A function type; the last argument is the return type.
    pub fn function<F>(&mut self, arguments: F) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut ParametricBuilder<'_, 'a>),
    {
        let arguments = self.collect(arguments)?;
        if arguments.len() < 2 {
            return Err(TypeSystemErrorCode::InvalidFunctionType.new());
        }
        Ok(Type::Function {
            arguments,
            scope: FunctionScope::Module,
            attributes: self.attributes.clone(),
        })
    }

    pub fn tuple<F>(&mut self, elements: F) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut ParametricBuilder<'_, 'a>),
    {
        let elements = self.collect(elements)?;
        Ok(Type::Tuple {
            elements,
            attributes: self.attributes.clone(),
        })
    }

    /// A union type. Every case label is also registered as a type
    /// constructor resolving to the union being declared.
    pub fn union<F>(&mut self, cases: F) -> Result<Type, TypeError>
    where
        F: FnOnce(&mut UnionBuilder<'_, 'a>),
    {
        let mut builder = UnionBuilder {
            item: self,
            result: Ok(Vec::new()),
        };
        cases(&mut builder);
        let cases = builder.result?;
        Ok(Type::Union {
            cases,
            attributes: self.attributes.clone(),
        })
    }

    /// An intersection of the named traits.
    pub fn intersection(&mut self, traits: &[&str]) -> Result<Type, TypeError> {
        let mut params = Vec::with_capacity(traits.len());
        for name in traits {
            validate_type_name(name)?;
            let target = name.to_string();
            self.validation(move |types| match types.get(&target).map(Type::inner) {
                Some(Type::Trait(_)) => None,
                _ => Some(
                    TypeSystemErrorCode::IntersectionTypeShouldBeTraits
                        .new()
                        .with("name", &target),
                ),
            });
            params.push(Type::alias(*name));
        }
        Ok(Type::Intersection {
            params,
            attributes: self.attributes.clone(),
        })
    }

    fn add_constructor(&mut self, label: &str) -> Result<(), TypeError> {
        if self.is_type_name_taken(label) {
            return Err(TypeSystemErrorCode::TypeAlreadyRegistered
                .new()
                .with("type", label));
        }
        let constructor = Type::TypeConstructor {
            name: label.to_string(),
            alias: self.name.clone(),
            attributes: self.attributes.clone(),
        };
        self.constructors.push((label.to_string(), constructor));
        Ok(())
    }
}

/// Collects the ordered arguments of a parametric, function or tuple type.
/// The first failing argument stops collection.
pub struct ParametricBuilder<'b, 'a> {
    item: &'b mut TypeItemBuilder<'a>,
    result: Result<Vec<Type>, TypeError>,
}

impl<'b, 'a> ParametricBuilder<'b, 'a> {
    /// Add the type built by `factory`.
    pub fn add<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce(&mut TypeItemBuilder<'a>) -> Result<Type, TypeError>,
    {
        if self.result.is_ok() {
            match factory(&mut *self.item) {
                Ok(ty) => {
                    if let Ok(types) = &mut self.result {
                        types.push(ty);
                    }
                }
                Err(err) => self.result = Err(err),
            }
        }
        self
    }

    pub fn parameter(&mut self, name: &str) -> &mut Self {
        self.add(|item| item.parameter(name))
    }

    /// A reference to a registered type.
    pub fn type_ref(&mut self, name: &str) -> &mut Self {
        self.add(|item| item.alias(name))
    }

    /// The type built by `factory`, wrapped in a label.
    pub fn labeled<F>(&mut self, label: &str, factory: F) -> &mut Self
    where
        F: FnOnce(&mut TypeItemBuilder<'a>) -> Result<Type, TypeError>,
    {
        self.add(|item| factory(item).map(|ty| Type::labeled(label, ty)))
    }

    pub fn parametric<F>(&mut self, name: &str, params: F) -> &mut Self
    where
        F: FnOnce(&mut ParametricBuilder<'_, 'a>),
    {
        self.add(|item| item.parametric(name, params))
    }

    pub fn function<F>(&mut self, arguments: F) -> &mut Self
    where
        F: FnOnce(&mut ParametricBuilder<'_, 'a>),
    {
        self.add(|item| item.function(arguments))
    }

    pub fn tuple<F>(&mut self, elements: F) -> &mut Self
    where
        F: FnOnce(&mut ParametricBuilder<'_, 'a>),
    {
        self.add(|item| item.tuple(elements))
    }
}

/// Collects the cases of a union declaration.
pub struct UnionBuilder<'b, 'a> {
    item: &'b mut TypeItemBuilder<'a>,
    result: Result<Vec<ClassType>, TypeError>,
}

impl<'b, 'a> UnionBuilder<'b, 'a> {
    /// A case `label` with the parameters added by `params`.
    pub fn class<F>(&mut self, label: &str, params: F) -> &mut Self
    where
        F: FnOnce(&mut ParametricBuilder<'_, 'a>),
    {
        if self.result.is_err() {
            return self;
        }
        let outcome = validate_type_name(label)
            .and_then(|()| self.item.add_constructor(label))
            .and_then(|()| self.item.collect(params));
        match outcome {
            Ok(params) => {
                if let Ok(cases) = &mut self.result {
                    cases.push(ClassType::new(label, params));
                }
            }
            Err(err) => self.result = Err(err),
        }
        self
    }

    /// A case without parameters.
    pub fn case(&mut self, label: &str) -> &mut Self {
        self.class(label, |_| {})
    }
}

/// Collects the methods of a trait declaration.
pub struct TraitBuilder<'b, 'a> {
    item: &'b mut TypeItemBuilder<'a>,
    trait_name: String,
    result: Result<Vec<MethodType>, TypeError>,
}

impl<'b, 'a> TraitBuilder<'b, 'a> {
    /// Declare a method. Methods are identified by `name/arity`; declaring
    /// the same key twice fails with `DuplicateTraitMethod`.
    pub fn method<F>(&mut self, name: &str, default_impl: bool, arguments: F) -> &mut Self
    where
        F: FnOnce(&mut ParametricBuilder<'_, 'a>),
    {
        if self.result.is_err() {
            return self;
        }
        let outcome = validate_function_name(name)
            .and_then(|()| self.item.collect(arguments))
            .map(|arguments| MethodType {
                trait_name: self.trait_name.clone(),
                name: name.to_string(),
                arguments,
                default_impl,
                attributes: Attributes::of([Attribute::TraitMethod]),
            });
        let method = match outcome {
            Ok(method) => method,
            Err(err) => {
                self.result = Err(err);
                return self;
            }
        };
        let key = method.key();
        let duplicate = match &self.result {
            Ok(methods) => methods.iter().any(|m| m.key() == key),
            Err(_) => false,
        };
        if duplicate {
            self.result = Err(TypeSystemErrorCode::DuplicateTraitMethod
                .new()
                .with("name", key)
                .with("trait", &self.trait_name));
        } else if let Ok(methods) = &mut self.result {
            methods.push(method);
        }
        self
    }
}

// ── Module registries ──────────────────────────────────────────────────

/// Builds a registry with no types of its own whose qualified lookups
/// (`Key.Name`) dispatch to imported registries.
#[derive(Default)]
pub struct ModuleTypeSystemBuilder {
    parent: Option<Arc<TypeSystem>>,
    parent_errors: Vec<TypeError>,
    imports: FxHashMap<String, Arc<TypeSystem>>,
    errors: Vec<TypeError>,
}

impl ModuleTypeSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: &PartialTypeSystem) -> Self {
        Self {
            parent: Some(Arc::clone(&parent.value)),
            parent_errors: parent.errors.clone(),
            ..Self::default()
        }
    }

    /// Import `module` under `key`, keeping the errors it was built with.
    pub fn register(&mut self, key: &str, module: &PartialTypeSystem) -> &mut Self {
        self.imports
            .insert(key.to_string(), Arc::clone(&module.value));
        self.errors.extend(module.errors.iter().cloned());
        self
    }

    pub fn build(self) -> PartialTypeSystem {
        let mut errors = self.parent_errors;
        errors.extend(self.errors);
        let system = TypeSystem {
            parent: self.parent,
            imports: self.imports,
            ..TypeSystem::default()
        };
        PartialResult::new(Arc::new(system), errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_parent() {
        let mut parent = TypeSystemBuilder::new();
        parent.concrete("Int").unwrap();
        let parent = parent.build();

        let mut child = TypeSystemBuilder::with_parent(&parent);
        child.concrete("Str").unwrap();
        let child = child.build();

        assert!(child.value.get("Int").is_ok());
        assert!(child.value.get("Str").is_ok());
        assert_eq!(child.value.len(), 1);
        assert!(parent.value.get("Str").is_err());
    }

    #[test]
    fn registering_a_parent_name_fails() {
        let mut parent = TypeSystemBuilder::new();
        parent.concrete("Int").unwrap();
        let parent = parent.build();

        let mut child = TypeSystemBuilder::with_parent(&parent);
        let err = child.concrete("Int").unwrap_err();
        assert_eq!(err.code, TypeSystemErrorCode::TypeAlreadyRegistered);
    }

    #[test]
    fn alias_to_self_is_concrete() {
        let mut builder = TypeSystemBuilder::new();
        let ty = builder.register("Unit", |item| item.alias("Unit")).unwrap();
        assert!(matches!(ty, Type::Concrete { ref name, .. } if name == "Unit"));
        assert!(!builder.build().is_partial());
    }

    #[test]
    fn alias_to_other_is_type_alias() {
        let mut builder = TypeSystemBuilder::new();
        builder.concrete("Int").unwrap();
        let ty = builder
            .register_with(
                "Age",
                Attributes::of([Attribute::Public]),
                Vec::new(),
                |item| item.alias("Int"),
            )
            .unwrap();
        assert!(matches!(ty, Type::TypeAlias { ref name, .. } if name == "Int"));
        assert!(ty.attributes().contains(&Attribute::Public));
    }

    #[test]
    fn annotations_wrap_the_registered_type() {
        let mut builder = TypeSystemBuilder::new();
        let ty = builder
            .register_with(
                "Ptr",
                Attributes::none(),
                vec![Annotation::new("native")],
                |item| item.concrete(),
            )
            .unwrap();
        assert_eq!(ty.annotations().len(), 1);
        assert_eq!(ty.representation(), "@native Ptr");
    }

    #[test]
    fn cyclic_aliases_are_rejected_on_resolve() {
        let mut builder = TypeSystemBuilder::new();
        builder.register("A", |item| item.alias("B")).unwrap();
        builder.register("B", |item| item.alias("A")).unwrap();
        let types = builder.build();
        assert!(!types.is_partial());

        let err = types.value.resolve(&Type::alias("A")).unwrap_err();
        assert_eq!(err.code, TypeSystemErrorCode::CyclicAlias);
        assert_eq!(err.argument("chain"), Some("A -> B -> A"));
    }

    #[test]
    fn union_cases_resolve_to_union() {
        let mut builder = TypeSystemBuilder::new();
        let bool_type = builder
            .union_type("Bool", |u| {
                u.case("True").case("False");
            })
            .unwrap();
        let types = builder.build();
        let truth = types.value.get("True").unwrap();
        assert!(matches!(truth, Type::TypeConstructor { alias, .. } if alias == "Bool"));
        assert_eq!(types.value.resolve(truth).unwrap(), bool_type);
    }
}
