//! Shared type definitions for the typack crate
//!
//! This module contains common types that are used across multiple components
//! of the bundler, ensuring consistency and avoiding circular dependencies.

use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;
use serde::Serialize;

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Type alias for FxHasher-based IndexSet
pub type FxIndexSet<T> = IndexSet<T, std::hash::BuildHasherDefault<FxHasher>>;

/// Kind of a named type declaration
///
/// The kind decides which keyword introduces the declaration header and
/// which output group the declaration is emitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclKind {
    /// `interface Name { ... }`
    Interface,
    /// `type Name = ...`
    TypeAlias,
    /// `enum Name { ... }`
    Enum,
    /// `class Name { ... }`
    Class,
    /// Anything the upstream analysis could not classify
    Unknown,
}

impl DeclKind {
    /// The keyword that introduces a declaration of this kind
    ///
    /// For [`DeclKind::Unknown`] there is no reliable keyword; callers must
    /// fall back to plain token matching.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Interface => Some("interface"),
            Self::TypeAlias => Some("type"),
            Self::Enum => Some("enum"),
            Self::Class => Some("class"),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interface => write!(f, "interface"),
            Self::TypeAlias => write!(f, "type alias"),
            Self::Enum => write!(f, "enum"),
            Self::Class => write!(f, "class"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Identity of a declaration across the whole bundling invocation
///
/// Every collected declaration is keyed by the file it was declared in and
/// its original (pre-rename) name. The key is the unit of idempotence for
/// the walk: a `(file, name)` pair is collected at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclKey {
    /// File the declaration lives in
    pub file: PathBuf,
    /// Name as written in the source, before any collision renaming
    pub name: String,
}

impl DeclKey {
    pub fn new(file: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for DeclKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.file.display(), self.name)
    }
}
