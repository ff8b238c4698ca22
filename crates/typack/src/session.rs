//! Single-use bundling session
//!
//! A [`BundlingSession`] owns the configuration for one invocation and
//! borrows the two collaborators. `bundle` consumes the session, so the
//! rename map and used-name set built during an invocation can never leak
//! into another one; concurrent bundling of different entry points is safe
//! by construction.

use std::path::Path;

use log::{debug, info};

use crate::{
    collision::CollisionResolver,
    config::BundleConfig,
    decl_index::DeclarationIndex,
    diagnostics::{BundleError, ResolutionWarning},
    emitter::{self, BundleEntry},
    resolver::ModuleResolver,
    rewriter::ReferenceRewriter,
    walker::DependencyWalker,
};

/// Result of one bundling invocation
#[derive(Debug)]
pub struct BundleOutput {
    /// The serialized bundle artifact
    pub text: String,
    /// The structured entries behind the artifact, in emission order of
    /// their keys
    pub entries: Vec<BundleEntry>,
    /// Non-fatal diagnostics accumulated during the walk
    pub warnings: Vec<ResolutionWarning>,
    /// Whether the reference graph contained cycles (informational)
    pub had_cycles: bool,
}

/// One bundling invocation: walk, resolve collisions, rewrite, emit
#[derive(Debug)]
pub struct BundlingSession<'a, I: ?Sized, R: ?Sized> {
    index: &'a I,
    resolver: &'a R,
    config: BundleConfig,
}

impl<'a, I, R> BundlingSession<'a, I, R>
where
    I: DeclarationIndex + ?Sized,
    R: ModuleResolver + ?Sized,
{
    /// Create a session with default options
    pub fn new(index: &'a I, resolver: &'a R) -> Self {
        Self::with_config(index, resolver, BundleConfig::default())
    }

    /// Create a session with explicit options
    pub fn with_config(index: &'a I, resolver: &'a R, config: BundleConfig) -> Self {
        Self {
            index,
            resolver,
            config,
        }
    }

    /// Run the whole pipeline for one entry point
    ///
    /// Consumes the session: every invocation gets a fresh one.
    pub fn bundle(self, entry_file: &Path, entry_name: &str) -> Result<BundleOutput, BundleError> {
        info!(
            "bundling `{entry_name}` from {}",
            entry_file.display()
        );

        let outcome = DependencyWalker::new(self.index, self.resolver).walk(entry_file, entry_name)?;

        if outcome.collected.is_empty() {
            return Err(BundleError::EntryNotFound {
                file: entry_file.to_path_buf(),
                name: entry_name.to_string(),
            });
        }

        // The first collected declaration is the entry itself (possibly in
        // the file its import chain forwarded to).
        let mut resolver = CollisionResolver::new(&outcome.collected);
        if self.config.prefer_entry_name
            && let Some((entry_key, _)) = outcome.collected.first()
        {
            resolver = resolver.with_privileged_entry(entry_key.clone());
        }
        let assignment = resolver.resolve(&self.config)?;

        let rewriter = ReferenceRewriter::new(&assignment, &outcome.substitutions);
        let entries: Vec<BundleEntry> = outcome
            .collected
            .iter()
            .map(|(key, declaration)| BundleEntry {
                file_path: key.file.clone(),
                original_name: key.name.clone(),
                final_name: assignment.final_name(key).to_string(),
                kind: declaration.record.kind,
                rewritten_text: rewriter.rewrite(key, declaration),
            })
            .collect();

        let text = emitter::emit(&entries, &self.config);
        debug!(
            "bundle ready: {} entries, {} bytes, {} warnings",
            entries.len(),
            text.len(),
            outcome.warnings.len()
        );

        Ok(BundleOutput {
            text,
            entries,
            warnings: outcome.warnings,
            had_cycles: outcome.had_cycles,
        })
    }
}
