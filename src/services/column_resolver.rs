// Column Resolver
//
// Maps a free-text phrase onto one column of a known schema. Layers are tried
// in a fixed order and the first hit wins:
//
//   1. exact     - a column name occurs in the phrase
//   2. synonym   - a domain concept or fragment occurs in the phrase and a
//                  column name contains that fragment
//   3. token     - a phrase word occurs inside a column name
//   4. fallback  - the first column, or `*` for an empty schema
//
// Resolution never fails.

use crate::models::{MatchStrategy, Resolution};
use crate::services::synonyms::SynonymTable;

/// Wildcard returned when there is no column to resolve to
pub const WILDCARD: &str = "*";

pub struct ColumnResolver<'a> {
    synonyms: &'a SynonymTable,
}

impl Default for ColumnResolver<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnResolver<'static> {
    /// Resolver over the built-in synonym table
    pub fn new() -> Self {
        Self {
            synonyms: SynonymTable::builtin(),
        }
    }
}

impl<'a> ColumnResolver<'a> {
    pub fn with_synonyms(synonyms: &'a SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn resolve<S: AsRef<str>>(&self, phrase: &str, columns: &[S]) -> Resolution {
        let phrase_lc = phrase.to_lowercase();

        if let Some(col) = exact_match(&phrase_lc, columns) {
            return Resolution::new(col, MatchStrategy::Exact);
        }
        if let Some(col) = self.synonym_match(&phrase_lc, columns) {
            return Resolution::new(col, MatchStrategy::Synonym);
        }
        if let Some(col) = token_match(&phrase_lc, columns) {
            return Resolution::new(col, MatchStrategy::Token);
        }

        match columns.first() {
            Some(first) => Resolution::new(first.as_ref(), MatchStrategy::Fallback),
            None => Resolution::new(WILDCARD, MatchStrategy::Wildcard),
        }
    }

    fn synonym_match<'c, S: AsRef<str>>(&self, phrase_lc: &str, columns: &'c [S]) -> Option<&'c str> {
        for entry in self.synonyms.entries() {
            let concept_hit = phrase_lc.contains(entry.concept.as_str());
            for fragment in &entry.fragments {
                if !concept_hit && !phrase_lc.contains(fragment.as_str()) {
                    continue;
                }
                let needle = squash(fragment);
                if needle.is_empty() {
                    continue;
                }
                if let Some(col) = columns
                    .iter()
                    .map(AsRef::as_ref)
                    .find(|col| squash(col).contains(&needle))
                {
                    return Some(col);
                }
            }
        }
        None
    }
}

/// Resolve `phrase` against `columns` with the built-in synonym table.
pub fn resolve<S: AsRef<str>>(phrase: &str, columns: &[S]) -> Resolution {
    ColumnResolver::new().resolve(phrase, columns)
}

/// Like [`resolve`] but only the column name.
pub fn resolve_column<S: AsRef<str>>(phrase: &str, columns: &[S]) -> String {
    resolve(phrase, columns).column
}

fn exact_match<'c, S: AsRef<str>>(phrase_lc: &str, columns: &'c [S]) -> Option<&'c str> {
    columns
        .iter()
        .map(AsRef::as_ref)
        .find(|col| !col.is_empty() && phrase_lc.contains(&col.to_lowercase()))
}

fn token_match<'c, S: AsRef<str>>(phrase_lc: &str, columns: &'c [S]) -> Option<&'c str> {
    columns.iter().map(AsRef::as_ref).find(|col| {
        let col_lc = col.to_lowercase();
        phrase_lc.split_whitespace().any(|word| col_lc.contains(word))
    })
}

/// Lower-case with spaces and underscores removed
fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
