//! Declaration index: the upstream structural-analysis interface
//!
//! The bundler core never parses source text. An upstream analysis produces,
//! per file, the named declarations (with their raw text and referenced
//! names) and the import edges. This module defines those record types, the
//! [`DeclarationIndex`] trait the core consumes, and [`ProjectIndex`], an
//! in-memory reference implementation used by tests, benches, and embedders
//! whose analysis already ran.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::types::{DeclKind, FxIndexMap, FxIndexSet};

/// One named type declaration extracted from one file
///
/// Immutable once produced by the index. `referenced_names` includes
/// inherited/extended type names for interfaces and every identifier
/// appearing in a type position for aliases; built-in and utility-type
/// names may appear here and are filtered out by the walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationRecord {
    /// File the declaration was extracted from
    pub file_path: PathBuf,
    /// Declared name
    pub name: String,
    /// Declaration kind
    pub kind: DeclKind,
    /// Raw source text of the whole declaration
    pub raw_text: String,
    /// Names referenced from the declaration body, in source order
    pub referenced_names: FxIndexSet<String>,
}

impl DeclarationRecord {
    pub fn new(
        file_path: impl Into<PathBuf>,
        name: impl Into<String>,
        kind: DeclKind,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            name: name.into(),
            kind,
            raw_text: raw_text.into(),
            referenced_names: FxIndexSet::default(),
        }
    }

    /// Attach referenced names, replacing any previously set
    pub fn with_references<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.referenced_names = names.into_iter().map(Into::into).collect();
        self
    }
}

/// How an import binds its local identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportStyle {
    /// `import Foo from './m'`
    Default,
    /// `import { Foo } from './m'` or `import { Foo as Bar } from './m'`
    Named,
    /// `import * as NS from './m'`
    Namespace,
}

/// One imported binding in one file
///
/// `exported_name` differs from `local_identifier` only for named imports
/// with an alias; for namespace imports `local_identifier` is the namespace
/// binding itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportEdge {
    /// File containing the import statement
    pub from_file: PathBuf,
    /// Name the binding is visible under inside `from_file`
    pub local_identifier: String,
    /// Name as exported by the target module
    pub exported_name: String,
    /// Binding style
    pub import_style: ImportStyle,
    /// Specifier as written in the import statement
    pub module_specifier: String,
}

/// Everything the upstream analysis produced for one file
#[derive(Debug, Clone, Default)]
pub struct FileDeclarations {
    /// Declarations keyed by their declared name
    ///
    /// Interfaces, type aliases, enums, and classes share one namespace in
    /// a type position, so a single name-keyed map preserves the lookup
    /// contract; the kind lives on each record.
    pub declarations: FxIndexMap<String, DeclarationRecord>,
    /// Import edges in source order
    pub import_edges: Vec<ImportEdge>,
}

impl FileDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a local declaration by name
    pub fn lookup(&self, name: &str) -> Option<&DeclarationRecord> {
        self.declarations.get(name)
    }

    /// Find the import edge binding `local` in this file, if any
    pub fn import_for(&self, local: &str) -> Option<&ImportEdge> {
        self.import_edges
            .iter()
            .find(|edge| edge.local_identifier == local)
    }

    /// Find the namespace import whose binding is `namespace`, if any
    pub fn namespace_import(&self, namespace: &str) -> Option<&ImportEdge> {
        self.import_edges.iter().find(|edge| {
            edge.import_style == ImportStyle::Namespace && edge.local_identifier == namespace
        })
    }
}

/// Interface to the upstream structural-analysis service
///
/// Implementations may read from caches, databases, or run analysis on
/// demand; failures (typically upstream I/O) surface as errors and abort
/// the invocation.
pub trait DeclarationIndex {
    /// Get the declaration records and import edges for a file
    fn declarations(&self, file: &Path) -> Result<Arc<FileDeclarations>>;
}

/// In-memory declaration index
///
/// The reference implementation of [`DeclarationIndex`]: a registry of
/// pre-computed per-file records. Files are registered once and shared as
/// `Arc` thereafter.
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    files: FxIndexMap<PathBuf, Arc<FileDeclarations>>,
}

impl ProjectIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the records for a file, replacing any previous entry
    pub fn add_file(&mut self, path: impl Into<PathBuf>, decls: FileDeclarations) {
        self.files.insert(path.into(), Arc::new(decls));
    }

    /// Paths of every registered file
    pub fn file_paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Check whether a file is registered
    pub fn has_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Number of registered files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl DeclarationIndex for ProjectIndex {
    fn declarations(&self, file: &Path) -> Result<Arc<FileDeclarations>> {
        self.files
            .get(file)
            .cloned()
            .ok_or_else(|| anyhow!("no declarations recorded for {}", file.display()))
    }
}
