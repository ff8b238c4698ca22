//! Dependency graph walker
//!
//! Expands an `(entry file, entry name)` pair into the full set of reachable
//! declarations by following local references, import edges, and
//! namespace-qualified accesses. The walk uses an explicit work stack with
//! tri-state visit marks per `(file, name)` key, so arbitrary reference
//! graphs terminate and mutually recursive types are collected exactly once.
//!
//! Unresolvable references never abort the walk; they accumulate as
//! [`ResolutionWarning`]s alongside the collected set.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, trace};
use petgraph::{
    algo::is_cyclic_directed,
    graph::{DiGraph, NodeIndex},
};

use crate::{
    builtin_types::is_basic_or_utility_type,
    decl_index::{DeclarationIndex, DeclarationRecord, FileDeclarations, ImportEdge, ImportStyle},
    diagnostics::{BundleError, ResolutionWarning, WarningReason},
    resolver::{ModuleResolver, ResolvedTargetKind},
    types::{DeclKey, FxIndexMap},
};

/// Visit state of a `(file, name)` key during the walk
///
/// A key never transitions from `Done` back to `InProgress`; re-visits of a
/// finished key are no-ops, and a visit of an in-progress key is a cycle
/// that is satisfied without re-expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

/// A declaration gathered by the walk, plus its rename hint
#[derive(Debug, Clone)]
pub struct CollectedDeclaration {
    /// The record as produced by the declaration index
    pub record: DeclarationRecord,
    /// Display name requested by the importing context (an import alias or
    /// a flattened namespace-member name); `None` when the declaration was
    /// reached under its own name
    pub rename_hint: Option<String>,
}

impl CollectedDeclaration {
    /// The spelling under which referencing declarations read this one
    pub fn requested_name(&self) -> &str {
        self.rename_hint.as_deref().unwrap_or(&self.record.name)
    }
}

/// A literal text substitution recorded during the walk
///
/// Replaces a dotted namespace access (`NS.Member`) with its flattened
/// spelling inside the declaration that contained the access. Applied by
/// the rewriter as a pre-pass, before any identifier renaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSubstitution {
    /// Declaration whose text contains the dotted access
    pub owner: DeclKey,
    /// The literal dotted expression, e.g. `NS.Member`
    pub from: String,
    /// The flattened identifier, e.g. `NS_Member`
    pub to: String,
}

/// Everything the walk produced
#[derive(Debug)]
pub struct WalkOutcome {
    /// Reachable declarations keyed by `(file, original name)`
    pub collected: FxIndexMap<DeclKey, CollectedDeclaration>,
    /// Namespace-flattening substitutions, in discovery order
    pub substitutions: Vec<TextSubstitution>,
    /// Non-fatal diagnostics accumulated along the way
    pub warnings: Vec<ResolutionWarning>,
    /// Whether the collected reference graph contained a cycle
    ///
    /// Informational only; cycles are handled transparently.
    pub had_cycles: bool,
}

/// Unit of work on the explicit stack
#[derive(Debug)]
struct WorkItem {
    file: PathBuf,
    name: String,
    hint: Option<String>,
}

/// Stack frames: `Visit` expands a key, `Finish` retires its `InProgress`
/// mark once every child pushed by the expansion has been popped
#[derive(Debug)]
enum Frame {
    Visit(WorkItem),
    Finish(DeclKey),
}

/// Walks the reference graph from an entry point
///
/// One walker per invocation; all bookkeeping lives on the walker itself
/// and is handed out through [`WalkOutcome`].
pub struct DependencyWalker<'a, I: ?Sized, R: ?Sized> {
    index: &'a I,
    resolver: &'a R,
    stack: Vec<Frame>,
    visit_states: FxIndexMap<DeclKey, VisitState>,
    collected: FxIndexMap<DeclKey, CollectedDeclaration>,
    substitutions: Vec<TextSubstitution>,
    warnings: Vec<ResolutionWarning>,
    file_cache: FxIndexMap<PathBuf, Arc<FileDeclarations>>,
    ref_graph: DiGraph<DeclKey, ()>,
    graph_nodes: FxIndexMap<DeclKey, NodeIndex>,
}

impl<I: ?Sized, R: ?Sized> std::fmt::Debug for DependencyWalker<'_, I, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyWalker")
            .field("collected", &self.collected.len())
            .field("warnings", &self.warnings.len())
            .finish_non_exhaustive()
    }
}

impl<'a, I, R> DependencyWalker<'a, I, R>
where
    I: DeclarationIndex + ?Sized,
    R: ModuleResolver + ?Sized,
{
    /// Create a walker over the given collaborators
    pub fn new(index: &'a I, resolver: &'a R) -> Self {
        Self {
            index,
            resolver,
            stack: Vec::new(),
            visit_states: FxIndexMap::default(),
            collected: FxIndexMap::default(),
            substitutions: Vec::new(),
            warnings: Vec::new(),
            file_cache: FxIndexMap::default(),
            ref_graph: DiGraph::new(),
            graph_nodes: FxIndexMap::default(),
        }
    }

    /// Expand the entry pair into the full reachable set
    pub fn walk(mut self, entry_file: &Path, entry_name: &str) -> Result<WalkOutcome, BundleError> {
        debug!(
            "walking dependencies of `{entry_name}` from {}",
            entry_file.display()
        );

        self.stack.push(Frame::Visit(WorkItem {
            file: entry_file.to_path_buf(),
            name: entry_name.to_string(),
            hint: None,
        }));

        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Finish(key) => {
                    self.visit_states.insert(key, VisitState::Done);
                }
                Frame::Visit(item) => self.visit(item)?,
            }
        }

        let had_cycles = is_cyclic_directed(&self.ref_graph);
        debug!(
            "walk finished: {} declarations, {} warnings, cycles: {had_cycles}",
            self.collected.len(),
            self.warnings.len()
        );

        Ok(WalkOutcome {
            collected: self.collected,
            substitutions: self.substitutions,
            warnings: self.warnings,
            had_cycles,
        })
    }

    /// Expand a single `(file, name)` work item
    fn visit(&mut self, item: WorkItem) -> Result<(), BundleError> {
        let key = DeclKey::new(&item.file, &item.name);
        match self.visit_states.get(&key) {
            Some(VisitState::Done) => {
                trace!("`{key}` already collected; skipping re-visit");
                return Ok(());
            }
            Some(VisitState::InProgress) => {
                debug!("cycle detected at `{key}`; branch satisfied without re-expansion");
                return Ok(());
            }
            None => {}
        }

        let decls = self.file_declarations(&item.file)?;

        if let Some(record) = decls.lookup(&item.name) {
            self.expand_local(&key, &item, record, &decls);
            return Ok(());
        }

        // Not declared locally. A dotted name is a namespace-qualified
        // access (only reachable here when it is the entry itself);
        // anything else may still be satisfied by an import edge.
        if item.name.contains('.') {
            self.expand_namespace_access(None, &item.file, &decls, &item.name);
        } else if let Some(edge) = decls.import_for(&item.name) {
            self.follow_import(&item, edge);
        } else {
            trace!("`{key}` has no declaration and no import edge");
            self.warn(&item.file, &item.name, WarningReason::MissingDeclaration);
        }
        self.visit_states.insert(key, VisitState::Done);
        Ok(())
    }

    /// Collect a locally declared record and queue its references
    fn expand_local(
        &mut self,
        key: &DeclKey,
        item: &WorkItem,
        record: &DeclarationRecord,
        decls: &FileDeclarations,
    ) {
        trace!("collecting {} `{key}`", record.kind);
        self.visit_states.insert(key.clone(), VisitState::InProgress);
        self.stack.push(Frame::Finish(key.clone()));
        self.collected.insert(
            key.clone(),
            CollectedDeclaration {
                record: record.clone(),
                rename_hint: item.hint.clone(),
            },
        );

        // Same-file references stay in file scope; imports are only
        // consulted when the lookup there fails.
        for referenced in &record.referenced_names {
            if is_basic_or_utility_type(referenced) {
                trace!("`{referenced}` is a basic/utility type; not recursing");
                continue;
            }
            self.record_edge(key, &DeclKey::new(&item.file, referenced));
            if referenced.contains('.') {
                // Dotted accesses are expanded eagerly: the flattening
                // substitution belongs to this referencing declaration and
                // must be recorded even when the member itself was already
                // collected through another reference.
                self.expand_namespace_access(Some(key), &item.file, decls, referenced);
            } else {
                self.stack.push(Frame::Visit(WorkItem {
                    file: item.file.clone(),
                    name: referenced.clone(),
                    hint: None,
                }));
            }
        }
    }

    /// Follow a default or named import edge to its defining module
    fn follow_import(&mut self, item: &WorkItem, edge: &ImportEdge) {
        if edge.import_style == ImportStyle::Namespace {
            // A bare namespace binding in a type position has no single
            // declaration behind it; only `NS.Member` accesses do.
            self.warn(&item.file, &item.name, WarningReason::BareNamespaceBinding);
            return;
        }

        let target = self.resolver.resolve(&item.file, &edge.module_specifier);
        match target.kind {
            ResolvedTargetKind::File => {
                // An aliased import makes the local spelling the rename
                // hint, so emitted text keeps reading the importer's name.
                let hint = if item.name == edge.exported_name {
                    item.hint.clone()
                } else {
                    Some(item.name.clone())
                };
                trace!(
                    "`{}` in {} imports `{}` from {}",
                    item.name,
                    item.file.display(),
                    edge.exported_name,
                    target.path.display()
                );
                self.stack.push(Frame::Visit(WorkItem {
                    file: target.path,
                    name: edge.exported_name.clone(),
                    hint,
                }));
            }
            ResolvedTargetKind::ExternalPackage => {
                self.warn(
                    &item.file,
                    &item.name,
                    WarningReason::ExternalPackage {
                        package: target.path.display().to_string(),
                    },
                );
            }
            ResolvedTargetKind::Unresolved => {
                self.warn(
                    &item.file,
                    &item.name,
                    WarningReason::UnresolvedModule {
                        specifier: edge.module_specifier.clone(),
                    },
                );
            }
        }
    }

    /// Expand `NS.Member` through the matching namespace import
    ///
    /// Records a substitution of the literal dotted access with the
    /// flattened `NS_Member` spelling inside the referencing declaration
    /// (when there is one), then queues the member in the namespace's
    /// defining module with the flattened name as its rename hint.
    fn expand_namespace_access(
        &mut self,
        owner: Option<&DeclKey>,
        file: &Path,
        decls: &FileDeclarations,
        dotted: &str,
    ) {
        let Some((namespace, member)) = split_namespace_access(dotted) else {
            self.warn(file, dotted, WarningReason::MissingDeclaration);
            return;
        };
        let Some(edge) = decls.namespace_import(namespace) else {
            trace!("dotted `{dotted}` in {} has no matching namespace import", file.display());
            self.warn(file, dotted, WarningReason::MissingDeclaration);
            return;
        };

        let target = self.resolver.resolve(file, &edge.module_specifier);
        match target.kind {
            ResolvedTargetKind::File => {
                let flattened = format!("{namespace}_{member}");
                if let Some(owner) = owner {
                    self.substitutions.push(TextSubstitution {
                        owner: owner.clone(),
                        from: dotted.to_string(),
                        to: flattened.clone(),
                    });
                }
                trace!(
                    "flattening `{dotted}` to `{flattened}` via {}",
                    target.path.display()
                );
                self.stack.push(Frame::Visit(WorkItem {
                    file: target.path,
                    name: member.to_string(),
                    hint: Some(flattened),
                }));
            }
            ResolvedTargetKind::ExternalPackage => {
                self.warn(
                    file,
                    dotted,
                    WarningReason::ExternalPackage {
                        package: target.path.display().to_string(),
                    },
                );
            }
            ResolvedTargetKind::Unresolved => {
                self.warn(
                    file,
                    dotted,
                    WarningReason::UnresolvedModule {
                        specifier: edge.module_specifier.clone(),
                    },
                );
            }
        }
    }

    /// Fetch (and cache) the declaration records for a file
    fn file_declarations(&mut self, file: &Path) -> Result<Arc<FileDeclarations>, BundleError> {
        if let Some(decls) = self.file_cache.get(file) {
            return Ok(Arc::clone(decls));
        }
        let decls = self
            .index
            .declarations(file)
            .map_err(|source| BundleError::Index {
                file: file.to_path_buf(),
                source: source.into(),
            })?;
        self.file_cache
            .insert(file.to_path_buf(), Arc::clone(&decls));
        Ok(decls)
    }

    /// Mirror a reference edge into the petgraph view used for the cycle note
    fn record_edge(&mut self, from: &DeclKey, to: &DeclKey) {
        let from_ix = self.graph_node(from);
        let to_ix = self.graph_node(to);
        self.ref_graph.add_edge(from_ix, to_ix, ());
    }

    fn graph_node(&mut self, key: &DeclKey) -> NodeIndex {
        if let Some(ix) = self.graph_nodes.get(key) {
            return *ix;
        }
        let ix = self.ref_graph.add_node(key.clone());
        self.graph_nodes.insert(key.clone(), ix);
        ix
    }

    /// Record a warning, deduplicating exact repeats
    ///
    /// The same unresolvable name can be referenced from several
    /// declarations; one warning per `(file, name, reason)` is enough.
    fn warn(&mut self, file: &Path, name: &str, reason: WarningReason) {
        let warning = ResolutionWarning::new(file, name, reason);
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }
}

/// Split a dotted namespace access into `(namespace, member)`
///
/// The namespace is the leading segment (the local binding of a namespace
/// import); the member is the final segment.
fn split_namespace_access(name: &str) -> Option<(&str, &str)> {
    let (namespace, _) = name.split_once('.')?;
    let (_, member) = name.rsplit_once('.')?;
    Some((namespace, member))
}
