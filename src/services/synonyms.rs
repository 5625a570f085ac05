// Domain vocabulary used by the column resolver's synonym layer
//
// The table maps a concept to the phrase fragments that imply it. Entries are
// tried in definition order. The built-in table is constructed once on first
// use and is read-only afterwards.

use std::sync::LazyLock;

/// A concept and the fragments that imply it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymEntry {
    pub concept: String,
    pub fragments: Vec<String>,
}

/// Ordered concept → fragments mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

const CRICKET_TERMS: &[(&str, &[&str])] = &[
    ("batting", &["batting_hand", "batting style", "batting"]),
    ("bowling", &["bowling_skill", "bowling", "bowling style"]),
    ("nation", &["city", "nation"]),
    ("player", &["playername", "name", "player name"]),
    ("runs", &["runs", "score"]),
    ("wickets", &["wickets"]),
    ("city", &["city", "venue", "location"]),
    ("date", &["date", "match date"]),
    ("season", &["season", "year"]),
    ("team1", &["team1", "first team", "home team"]),
    ("team2", &["team2", "second team", "away team"]),
    ("winner", &["winner", "winning team"]),
    ("toss", &["toss_winner", "toss", "toss winner"]),
    ("umpire", &["umpire1", "umpire2", "umpire"]),
];

static BUILTIN: LazyLock<SynonymTable> = LazyLock::new(|| SynonymTable::from_pairs(CRICKET_TERMS));

impl SynonymTable {
    /// The built-in cricket/match vocabulary
    pub fn builtin() -> &'static SynonymTable {
        &BUILTIN
    }

    /// Build a table from `(concept, fragments)` pairs. Everything is
    /// lower-cased so lookups can run against a lower-cased phrase.
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let entries = pairs
            .iter()
            .map(|(concept, fragments)| SynonymEntry {
                concept: concept.to_lowercase(),
                fragments: fragments.iter().map(|f| f.to_lowercase()).collect(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_preserves_definition_order() {
        let concepts: Vec<&str> = SynonymTable::builtin()
            .entries()
            .iter()
            .map(|e| e.concept.as_str())
            .collect();
        assert_eq!(concepts.first(), Some(&"batting"));
        assert_eq!(concepts.last(), Some(&"umpire"));
        assert!(concepts.iter().position(|c| *c == "player") < concepts.iter().position(|c| *c == "runs"));
        assert_eq!(&concepts[..3], &["batting", "bowling", "nation"]);
    }

    #[test]
    fn test_from_pairs_lowercases() {
        let pairs: &[(&str, &[&str])] = &[("City", &["City", "Nation"])];
        let table = SynonymTable::from_pairs(pairs);
        assert_eq!(table.entries()[0].concept, "city");
        assert_eq!(table.entries()[0].fragments, vec!["city", "nation"]);
    }
}
