//! Collision resolution
//!
//! Declarations collected from different files frequently share a name.
//! This module assigns every collected declaration a globally unique final
//! name: the first member of each group (in a deterministic order) keeps
//! the bare name, every other member gets a file-stem suffix, and numeric
//! suffixes absorb any residual clashes. All externally observable ordering
//! derives from explicit sorts, never from hash iteration.

use std::path::Path;

use cow_utils::CowUtils;
use log::{debug, trace};

use crate::{
    config::BundleConfig,
    diagnostics::BundleError,
    types::{DeclKey, FxIndexMap, FxIndexSet},
    walker::CollectedDeclaration,
};

/// The finished rename map
///
/// Built once by [`CollisionResolver::resolve`], read-only afterward.
#[derive(Debug, Clone)]
pub struct NameAssignment {
    final_names: FxIndexMap<DeclKey, String>,
    used_names: FxIndexSet<String>,
    /// Collision-group members per spelling, path-sorted; a declaration
    /// appears under its original name and, when hinted, under its
    /// requested name too — the rewriter scans for both spellings
    spelling_groups: FxIndexMap<String, Vec<DeclKey>>,
}

impl NameAssignment {
    /// The final name assigned to a declaration
    ///
    /// Every collected key has an assignment; unknown keys fall back to
    /// their original name.
    pub fn final_name<'a>(&'a self, key: &'a DeclKey) -> &'a str {
        self.final_names
            .get(key)
            .map_or(key.name.as_str(), String::as_str)
    }

    /// Whether the declaration's final name differs from its original name
    pub fn is_renamed(&self, key: &DeclKey) -> bool {
        self.final_name(key) != key.name
    }

    /// Group members that share a spelling, path-sorted
    pub fn members_of(&self, spelling: &str) -> &[DeclKey] {
        self.spelling_groups
            .get(spelling)
            .map_or(&[], Vec::as_slice)
    }

    /// Every spelling that occurs in the collected set
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        self.spelling_groups.keys().map(String::as_str)
    }

    /// Whether a final name has been claimed
    pub fn is_name_used(&self, name: &str) -> bool {
        self.used_names.contains(name)
    }
}

/// Assigns deterministic final names to a collected declaration set
#[derive(Debug)]
pub struct CollisionResolver<'a> {
    collected: &'a FxIndexMap<DeclKey, CollectedDeclaration>,
    privileged: Option<DeclKey>,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(collected: &'a FxIndexMap<DeclKey, CollectedDeclaration>) -> Self {
        Self {
            collected,
            privileged: None,
        }
    }

    /// Let one declaration (the entry) win its collision group regardless
    /// of path order
    ///
    /// Gated behind [`BundleConfig::prefer_entry_name`] by the session.
    pub fn with_privileged_entry(mut self, key: DeclKey) -> Self {
        self.privileged = Some(key);
        self
    }

    /// Group the collected set and assign final names
    pub fn resolve(self, config: &BundleConfig) -> Result<NameAssignment, BundleError> {
        // Group by requested name: the import-alias / namespace hint takes
        // the place of the original name when present.
        let mut groups: FxIndexMap<String, Vec<DeclKey>> = FxIndexMap::default();
        for (key, declaration) in self.collected {
            groups
                .entry(declaration.requested_name().to_string())
                .or_default()
                .push(key.clone());
        }

        // Group keys sorted lexicographically, members path-sorted: the
        // outcome must not depend on traversal order.
        groups.sort_unstable_keys();
        for members in groups.values_mut() {
            members.sort_unstable();
            if config.prefer_entry_name
                && let Some(privileged) = &self.privileged
                && let Some(pos) = members.iter().position(|key| key == privileged)
                && pos != 0
            {
                debug!("entry declaration `{privileged}` takes precedence in its group");
                let entry = members.remove(pos);
                members.insert(0, entry);
            }
        }

        let mut final_names: FxIndexMap<DeclKey, String> = FxIndexMap::default();
        let mut used_names: FxIndexSet<String> = FxIndexSet::default();

        for (requested, members) in &groups {
            if members.len() > 1 {
                debug!(
                    "collision group `{requested}` has {} members",
                    members.len()
                );
            }
            for (position, key) in members.iter().enumerate() {
                let assigned = if position == 0 && !used_names.contains(requested) {
                    requested.clone()
                } else {
                    Self::suffixed_name(requested, &key.file, &used_names)?
                };
                trace!("`{key}` assigned final name `{assigned}`");
                used_names.insert(assigned.clone());
                final_names.insert(key.clone(), assigned);
            }
        }

        let spelling_groups = Self::spelling_groups(self.collected);

        Ok(NameAssignment {
            final_names,
            used_names,
            spelling_groups,
        })
    }

    /// Build a suffixed candidate from the declaring file's stem, with
    /// numeric suffixes absorbing residual clashes
    fn suffixed_name(
        requested: &str,
        file: &Path,
        used_names: &FxIndexSet<String>,
    ) -> Result<String, BundleError> {
        let base = format!("{requested}_{}", sanitize_file_stem(file));
        if !used_names.contains(&base) {
            return Ok(base);
        }
        // The claim set is finite, so some strictly increasing suffix must
        // be free; running past it means the bookkeeping is broken.
        for counter in 1..=used_names.len() + 1 {
            let candidate = format!("{base}_{counter}");
            if !used_names.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(BundleError::NameAssignmentExhausted {
            name: requested.to_string(),
        })
    }

    /// Index collision-group members under every spelling the rewriter may
    /// encounter in declaration bodies
    fn spelling_groups(
        collected: &FxIndexMap<DeclKey, CollectedDeclaration>,
    ) -> FxIndexMap<String, Vec<DeclKey>> {
        let mut spellings: FxIndexMap<String, Vec<DeclKey>> = FxIndexMap::default();
        for (key, declaration) in collected {
            spellings
                .entry(declaration.record.name.clone())
                .or_default()
                .push(key.clone());
            if let Some(hint) = &declaration.rename_hint
                && hint != &declaration.record.name
            {
                spellings.entry(hint.clone()).or_default().push(key.clone());
            }
        }
        spellings.sort_unstable_keys();
        for members in spellings.values_mut() {
            members.sort_unstable();
        }
        spellings
    }
}

/// Sanitize a file stem into an identifier-safe suffix
fn sanitize_file_stem(file: &Path) -> String {
    let stem = file
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    let sanitized = stem.cow_replace('-', "_");
    let sanitized = sanitized.cow_replace('.', "_");
    if sanitized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        sanitized.into_owned()
    } else {
        sanitized
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}
