//! Reference rewriting
//!
//! Applies the rename map to every collected declaration: the declaration's
//! own header token, and every whole-token reference to another collected
//! declaration. Replacement is span-based and applied back-to-front, never
//! a whole-document regex pass, so occurrences inside longer identifiers
//! or unrelated positions are never touched.

use log::trace;

use crate::{
    collision::NameAssignment,
    types::{DeclKey, FxIndexMap},
    walker::{CollectedDeclaration, TextSubstitution},
};

/// Kind keywords that introduce a declaration header
const KIND_KEYWORDS: &[&str] = &["interface", "type", "enum", "class"];

/// Rewrites declaration bodies against a finished [`NameAssignment`]
#[derive(Debug)]
pub struct ReferenceRewriter<'a> {
    assignment: &'a NameAssignment,
    /// Namespace-flattening substitutions grouped by owning declaration
    substitutions: FxIndexMap<&'a DeclKey, Vec<&'a TextSubstitution>>,
}

impl<'a> ReferenceRewriter<'a> {
    pub fn new(assignment: &'a NameAssignment, substitutions: &'a [TextSubstitution]) -> Self {
        let mut by_owner: FxIndexMap<&'a DeclKey, Vec<&'a TextSubstitution>> =
            FxIndexMap::default();
        for substitution in substitutions {
            by_owner
                .entry(&substitution.owner)
                .or_default()
                .push(substitution);
        }
        Self {
            assignment,
            substitutions: by_owner,
        }
    }

    /// Produce the final text for one declaration
    pub fn rewrite(&self, key: &DeclKey, declaration: &CollectedDeclaration) -> String {
        // Pre-pass: flatten dotted namespace accesses recorded during the
        // walk. These replace a two-token expression, not an identifier,
        // so they run before any identifier scanning.
        let mut text = declaration.record.raw_text.clone();
        if let Some(substitutions) = self.substitutions.get(key) {
            for substitution in substitutions {
                trace!(
                    "`{key}`: flattening `{}` to `{}`",
                    substitution.from, substitution.to
                );
                text = replace_whole_tokens(&text, &substitution.from, &substitution.to);
            }
        }

        // All claims are computed against one snapshot of the text and
        // applied at the end, so a replacement can never produce a token
        // that a later scan would mistake for a reference.
        let mut claims: Vec<(usize, usize, &str)> = Vec::new();

        // The declaration's own header: the token immediately following
        // its kind keyword, never other occurrences of the same name.
        let own_final = self.assignment.final_name(key);
        let mut header_span = None;
        if own_final != key.name
            && let Some(span) = header_name_span(&text, declaration.record.kind.keyword(), &key.name)
        {
            trace!("`{key}`: header renamed to `{own_final}`");
            header_span = Some(span);
            claims.push((span.0, span.1, own_final));
        }

        // References to every collected declaration, under each spelling
        // it may appear as (original name, or hinted name).
        for spelling in self.assignment.spellings() {
            let members = self.assignment.members_of(spelling);
            let Some(preferred) = self.prefer_member(key, spelling, members) else {
                continue;
            };
            let target = self.assignment.final_name(preferred);
            if target == spelling {
                continue;
            }
            for offset in token_occurrences(&text, spelling) {
                let span = (offset, offset + spelling.len());
                if header_span == Some(span) {
                    continue;
                }
                // Defensive: a header for some other declaration nested in
                // this text is rewritten by its own owning declaration only.
                if is_declaration_header_position(&text, offset) {
                    continue;
                }
                claims.push((span.0, span.1, target));
            }
        }

        apply_claims(text, claims)
    }

    /// Pick which member of a spelling group a reference in `referencing`
    /// points at
    ///
    /// Locality preference: the member declared in the same file, then the
    /// member that kept the bare spelling, then the path-sorted first.
    fn prefer_member<'m>(
        &self,
        referencing: &DeclKey,
        spelling: &str,
        members: &'m [DeclKey],
    ) -> Option<&'m DeclKey> {
        if members.is_empty() {
            return None;
        }
        if let Some(local) = members.iter().find(|member| member.file == referencing.file) {
            return Some(local);
        }
        if let Some(bare) = members
            .iter()
            .find(|member| self.assignment.final_name(member) == spelling)
        {
            return Some(bare);
        }
        members.first()
    }
}

/// Apply claimed replacements back-to-front to avoid offset drift
fn apply_claims(mut text: String, mut claims: Vec<(usize, usize, &str)>) -> String {
    claims.sort_by(|a, b| b.0.cmp(&a.0));
    for (start, end, replacement) in claims {
        text.replace_range(start..end, replacement);
    }
    text
}

/// Characters that can be part of an identifier token
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Byte offsets of every whole-token occurrence of `token` in `text`
///
/// A dotted token (`NS.Foo`) matches as long as both ends sit on a token
/// boundary; the dot is part of the pattern.
fn token_occurrences(text: &str, token: &str) -> Vec<usize> {
    let mut found = Vec::new();
    if token.is_empty() {
        return found;
    }
    let mut search_from = 0;
    while let Some(position) = text[search_from..].find(token) {
        let offset = search_from + position;
        let end = offset + token.len();
        let boundary_before = text[..offset].chars().next_back().is_none_or(|c| !is_ident_char(c));
        let boundary_after = text[end..].chars().next().is_none_or(|c| !is_ident_char(c));
        if boundary_before && boundary_after {
            found.push(offset);
        }
        search_from = end;
    }
    found
}

/// Replace every whole-token occurrence of `from` with `to`
fn replace_whole_tokens(text: &str, from: &str, to: &str) -> String {
    let occurrences = token_occurrences(text, from);
    if occurrences.is_empty() {
        return text.to_string();
    }
    let mut result = text.to_string();
    for &offset in occurrences.iter().rev() {
        result.replace_range(offset..offset + from.len(), to);
    }
    result
}

/// Span of the declaration's own name token in its header
///
/// The header name is the token immediately following the kind keyword.
/// Without a reliable keyword (unknown kinds) the first whole-token
/// occurrence of the name is taken.
fn header_name_span(
    text: &str,
    keyword: Option<&'static str>,
    name: &str,
) -> Option<(usize, usize)> {
    if let Some(keyword) = keyword {
        for keyword_offset in token_occurrences(text, keyword) {
            let after_keyword = keyword_offset + keyword.len();
            let rest = &text[after_keyword..];
            let trimmed = rest.trim_start();
            let whitespace = rest.len() - trimmed.len();
            if whitespace == 0 {
                continue;
            }
            let name_start = after_keyword + whitespace;
            if trimmed.starts_with(name) {
                let end = name_start + name.len();
                let bounded = text[end..].chars().next().is_none_or(|c| !is_ident_char(c));
                if bounded {
                    return Some((name_start, end));
                }
            }
        }
    }
    token_occurrences(text, name)
        .first()
        .map(|&offset| (offset, offset + name.len()))
}

/// Whether the token at `offset` sits in declaration-header position,
/// i.e. immediately preceded by a kind keyword
fn is_declaration_header_position(text: &str, offset: usize) -> bool {
    let before = text[..offset].trim_end();
    if before.len() == offset {
        // No whitespace between the previous token and this one
        return false;
    }
    KIND_KEYWORDS.iter().any(|keyword| {
        before.ends_with(keyword) && {
            let keyword_start = before.len() - keyword.len();
            text[..keyword_start]
                .chars()
                .next_back()
                .is_none_or(|c| !is_ident_char(c))
        }
    })
}
