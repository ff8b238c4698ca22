//! Warnings and errors surfaced by the bundling pipeline
//!
//! Unresolvable references are non-fatal: the walk keeps going and the
//! warning travels alongside the (partial) bundle. Only a missing entry
//! point and internal invariant breaches abort an invocation.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Why a referenced name could not be expanded during the walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum WarningReason {
    /// No local declaration and no import edge matched the name
    MissingDeclaration,
    /// The import resolved to an external package whose declaration
    /// bodies are not available to bundle
    ExternalPackage {
        /// Package identifier reported by the module resolver
        package: String,
    },
    /// The module resolver could not resolve the specifier at all
    UnresolvedModule {
        /// The specifier as written in the import
        specifier: String,
    },
    /// A namespace binding was referenced without a member access, so
    /// there is no single declaration to bundle for it
    BareNamespaceBinding,
}

/// Non-fatal diagnostic for a reference the walk could not follow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionWarning {
    /// File containing the reference
    pub file: PathBuf,
    /// The name that could not be resolved
    pub name: String,
    /// What went wrong
    pub reason: WarningReason,
}

impl ResolutionWarning {
    pub fn new(file: impl Into<PathBuf>, name: impl Into<String>, reason: WarningReason) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
            reason,
        }
    }
}

impl std::fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            WarningReason::MissingDeclaration => write!(
                f,
                "`{}` referenced in {} has no local declaration and no matching import",
                self.name,
                self.file.display()
            ),
            WarningReason::ExternalPackage { package } => write!(
                f,
                "`{}` in {} comes from external package `{package}`; its body is not bundled",
                self.name,
                self.file.display()
            ),
            WarningReason::UnresolvedModule { specifier } => write!(
                f,
                "`{}` in {} imports from `{specifier}`, which could not be resolved",
                self.name,
                self.file.display()
            ),
            WarningReason::BareNamespaceBinding => write!(
                f,
                "`{}` in {} is a namespace binding used without a member access",
                self.name,
                self.file.display()
            ),
        }
    }
}

/// Fatal errors that abort a bundling invocation
#[derive(Debug, Error)]
pub enum BundleError {
    /// The entry `(file, name)` pair did not lead to any declaration,
    /// neither locally nor through any chain of imports
    #[error("entry declaration `{name}` was not found in {file} or any module reachable from it")]
    EntryNotFound {
        /// Entry file as requested by the caller
        file: PathBuf,
        /// Entry type name as requested by the caller
        name: String,
    },

    /// The declaration index failed to produce records for a file
    #[error("declaration index failed for {file}")]
    Index {
        /// File whose records were requested
        file: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The incrementing-suffix scheme ran out of candidates
    ///
    /// Unreachable with a finite used-name set; hitting this indicates a
    /// logic defect, not a data problem.
    #[error("name assignment exhausted while renaming `{name}`")]
    NameAssignmentExhausted {
        /// The name being suffixed when the guard tripped
        name: String,
    },
}
