//! Module specifier resolution
//!
//! Resolving a specifier like `./models` or `rxjs` to a concrete target is
//! a black box as far as the walker is concerned: it only needs to know
//! whether the specifier lands on a local file (whose declarations can be
//! bundled), an external package (whose bodies are unavailable), or nothing
//! at all. This module defines that interface and [`ProjectResolver`], an
//! in-memory implementation resolving against a registered file set.

use std::path::{Component, Path, PathBuf};

use log::trace;

use crate::types::FxIndexSet;

/// Classification of a resolved module specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTargetKind {
    /// A local file; its declarations are available to bundle
    File,
    /// An external package; declaration bodies are not available
    ExternalPackage,
    /// The specifier could not be resolved
    Unresolved,
}

/// Outcome of resolving `(from_file, specifier)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub kind: ResolvedTargetKind,
    /// Resolved file path for [`ResolvedTargetKind::File`], the package
    /// identifier for [`ResolvedTargetKind::ExternalPackage`], and the raw
    /// specifier for [`ResolvedTargetKind::Unresolved`]
    pub path: PathBuf,
}

impl ResolvedTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ResolvedTargetKind::File,
            path: path.into(),
        }
    }

    pub fn external(package: impl Into<PathBuf>) -> Self {
        Self {
            kind: ResolvedTargetKind::ExternalPackage,
            path: package.into(),
        }
    }

    pub fn unresolved(specifier: impl Into<PathBuf>) -> Self {
        Self {
            kind: ResolvedTargetKind::Unresolved,
            path: specifier.into(),
        }
    }
}

/// Interface to the module resolution collaborator
pub trait ModuleResolver {
    /// Resolve a module specifier relative to the importing file
    fn resolve(&self, from_file: &Path, specifier: &str) -> ResolvedTarget;
}

/// Extensions probed for a relative specifier, in order
const PROBE_SUFFIXES: &[&str] = &[".ts", ".tsx"];

/// In-memory module resolver
///
/// Relative specifiers (`./`, `../`) are joined to the importing file's
/// directory, normalized, and probed against the registered file set:
/// first the exact path, then with each known extension appended, then as
/// a directory with an `index.ts`. Bare specifiers classify as external
/// packages. Anything else is unresolved.
#[derive(Debug, Clone, Default)]
pub struct ProjectResolver {
    files: FxIndexSet<PathBuf>,
}

impl ProjectResolver {
    /// Create a resolver with no known files
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file path that relative specifiers may land on
    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        self.files.insert(path.into());
    }

    /// Register every path in the iterator
    pub fn add_files<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.add_file(path);
        }
    }

    fn probe(&self, candidate: &Path) -> Option<PathBuf> {
        if self.files.contains(candidate) {
            return Some(candidate.to_path_buf());
        }
        let raw = candidate.as_os_str().to_string_lossy();
        for suffix in PROBE_SUFFIXES {
            let with_ext = PathBuf::from(format!("{raw}{suffix}"));
            if self.files.contains(&with_ext) {
                return Some(with_ext);
            }
        }
        let as_index = candidate.join("index.ts");
        if self.files.contains(&as_index) {
            return Some(as_index);
        }
        None
    }
}

impl ModuleResolver for ProjectResolver {
    fn resolve(&self, from_file: &Path, specifier: &str) -> ResolvedTarget {
        if !specifier.starts_with("./") && !specifier.starts_with("../") {
            trace!("specifier `{specifier}` is bare; classifying as external package");
            return ResolvedTarget::external(specifier);
        }

        let base = from_file.parent().unwrap_or_else(|| Path::new(""));
        let candidate = normalize_path(&base.join(specifier));

        match self.probe(&candidate) {
            Some(path) => {
                trace!(
                    "resolved `{specifier}` from {} to {}",
                    from_file.display(),
                    path.display()
                );
                ResolvedTarget::file(path)
            }
            None => {
                trace!(
                    "no file matched `{specifier}` from {} (tried {})",
                    from_file.display(),
                    candidate.display()
                );
                ResolvedTarget::unresolved(specifier)
            }
        }
    }
}

/// Collapse `.` and `..` components without touching the filesystem
fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                match parts.last() {
                    Some(Component::Normal(_)) => {
                        parts.pop();
                    }
                    // Leading `..` (or one that climbs past the root) has to stay
                    _ => parts.push(component),
                }
            }
            other => parts.push(other),
        }
    }
    parts.iter().map(|c| c.as_os_str()).collect()
}
