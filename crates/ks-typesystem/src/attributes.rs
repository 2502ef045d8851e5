//! Symbol attributes attached to types.
//!
//! Attributes are metadata: they are carried, merged and serialized with a
//! type but never take part in type identity.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    /// Symbol implementation is native.
    Native,
    /// Symbol accessible in any module.
    Public,
    /// Symbol accessible only in the module where it is defined.
    Internal,
    /// Symbol has side effects.
    Impure,
    /// Symbol represents a compile-time constant.
    Constant,
    /// Method declared inside a trait.
    TraitMethod,
    /// Backend names for the symbol, keyed by target (e.g. `ir`).
    Name(BTreeMap<String, String>),
}

impl Attribute {
    pub fn name<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Attribute::Name(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// An ordered set of [`Attribute`]s.
///
/// Equality and hashing ignore the contents: types differing only in
/// attributes compare equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeSet<Attribute>);

impl PartialEq for Attributes {
    fn eq(&self, _other: &Self) -> bool {
        true // metadata only
    }
}

impl Eq for Attributes {}

impl Hash for Attributes {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

impl Attributes {
    pub const fn none() -> Self {
        Attributes(BTreeSet::new())
    }

    pub fn of(attributes: impl IntoIterator<Item = Attribute>) -> Self {
        Self(attributes.into_iter().collect())
    }

    /// Set union of both attribute sets.
    pub fn merge(&self, other: &Attributes) -> Attributes {
        Attributes(self.0.union(&other.0).cloned().collect())
    }

    pub fn contains(&self, attribute: &Attribute) -> bool {
        self.0.contains(attribute)
    }

    pub fn insert(&mut self, attribute: Attribute) -> bool {
        self.0.insert(attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    /// Look up a backend name, e.g. `name_for("ir")`.
    pub fn name_for(&self, target: &str) -> Option<&str> {
        self.0.iter().find_map(|attribute| match attribute {
            Attribute::Name(names) => names.get(target).map(String::as_str),
            _ => None,
        })
    }

    /// Structural comparison of the contents, for callers that care.
    pub fn same_as(&self, other: &Attributes) -> bool {
        self.0 == other.0
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self::of(iter)
    }
}
