//! Bundle emission
//!
//! Serializes the rewritten declarations into the final text artifact:
//! entries are partitioned into a fixed kind-group order, sorted by final
//! name inside each group, and prefixed with provenance comments. Every
//! ordering decision here derives from an explicit sort on stable keys, so
//! identical inputs produce byte-identical output.

use std::path::PathBuf;

use log::debug;
use serde::Serialize;

use crate::{config::BundleConfig, types::DeclKind};

/// One declaration as it appears in the final bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    /// File the declaration came from
    pub file_path: PathBuf,
    /// Name as written in the source
    pub original_name: String,
    /// Globally unique name in the bundle
    pub final_name: String,
    /// Declaration kind, deciding the output group
    pub kind: DeclKind,
    /// Fully rewritten declaration text
    pub rewritten_text: String,
}

/// Emission order of the kind groups, with their header labels
const KIND_GROUPS: &[(DeclKind, &str)] = &[
    (DeclKind::Enum, "Enums"),
    (DeclKind::Interface, "Interfaces"),
    (DeclKind::TypeAlias, "Type Aliases"),
    (DeclKind::Class, "Classes"),
    (DeclKind::Unknown, "Other Declarations"),
];

/// Serialize the bundle entries into the final artifact
pub fn emit(entries: &[BundleEntry], config: &BundleConfig) -> String {
    let mut output = String::new();

    for &(kind, label) in KIND_GROUPS {
        let mut group: Vec<&BundleEntry> =
            entries.iter().filter(|entry| entry.kind == kind).collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| a.final_name.cmp(&b.final_name));
        debug!("emitting {} {label} entries", group.len());

        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("// ===== {label} =====\n"));

        for entry in group {
            output.push('\n');
            if config.provenance_comments {
                output.push_str(&format!(
                    "// {} (from {})\n",
                    entry.original_name,
                    entry.file_path.display()
                ));
            }
            output.push_str(entry.rewritten_text.trim_end());
            output.push('\n');
        }
    }

    output
}
