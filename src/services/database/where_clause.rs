// WHERE clause reinterpretation for sources without a query engine
//
// Only the predicate of a canonical query is carried over to the row filter.
// It is cut out of the query text and its SQL equality operator is rewritten
// to the filter language's `==`.

use crate::models::QueryParts;
use crate::models::intent::quoted_spans;

/// Text between `WHERE` and the earliest of `ORDER BY`, `LIMIT` or a
/// trailing `;`. `None` when the query has no WHERE clause.
pub fn extract_where_clause(sql: &str) -> Option<String> {
    QueryParts::split(sql).predicate
}

/// Rewrite each bare `=` to `==`.
///
/// An `=` is left alone when it is preceded by `<`, `>`, `=` or `!`, when it is
/// followed by `=`, or when it sits inside a quoted literal, so `>=`, `<=`,
/// `!=` and `==` pass through unchanged.
pub fn rewrite_equality(clause: &str) -> String {
    let quoted = quoted_spans(clause);
    let chars: Vec<(usize, char)> = clause.char_indices().collect();
    let mut out = String::with_capacity(clause.len() + 8);

    for (pos, &(idx, ch)) in chars.iter().enumerate() {
        if ch == '=' && !quoted.iter().any(|(a, b)| idx >= *a && idx < *b) {
            let prev = pos.checked_sub(1).map(|p| chars[p].1);
            let next = chars.get(pos + 1).map(|(_, c)| *c);
            let compound = matches!(prev, Some('<' | '>' | '=' | '!')) || next == Some('=');
            if !compound {
                out.push_str("==");
                continue;
            }
        }
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_only_bare_equality() {
        assert_eq!(
            rewrite_equality("age >= 10 and city = 'NY'"),
            "age >= 10 and city == 'NY'"
        );
    }

    #[test]
    fn test_rewrite_keeps_compound_operators() {
        assert_eq!(rewrite_equality("age != 5"), "age != 5");
        assert_eq!(rewrite_equality("age <= 5"), "age <= 5");
        assert_eq!(rewrite_equality("age == 5"), "age == 5");
        assert_eq!(rewrite_equality("a=1"), "a==1");
    }

    #[test]
    fn test_rewrite_skips_quoted_text() {
        assert_eq!(rewrite_equality("note = 'a=b'"), "note == 'a=b'");
    }

    #[test]
    fn test_extract_where_clause() {
        assert_eq!(
            extract_where_clause("SELECT * FROM t WHERE age >= 10;").as_deref(),
            Some("age >= 10")
        );
        assert_eq!(
            extract_where_clause("SELECT * FROM t WHERE a = 1 ORDER BY a DESC LIMIT 3;").as_deref(),
            Some("a = 1")
        );
        assert_eq!(
            extract_where_clause("SELECT * FROM t WHERE a > 1 LIMIT 3").as_deref(),
            Some("a > 1")
        );
        assert!(extract_where_clause("SELECT * FROM t ORDER BY a DESC LIMIT 3;").is_none());
        assert!(extract_where_clause("SELECT * FROM t;").is_none());
    }
}
