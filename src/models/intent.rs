// Query intent and canonical query models
//
// A canonical query is the restricted SQL dialect emitted by the intent
// translator: SELECT / COUNT / SUM / MIN / MAX with WHERE, ORDER BY, LIMIT
// and BETWEEN. It is kept together with its structural decomposition so the
// execution layer can reinterpret the WHERE clause without a SQL engine.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Which matching layer produced a resolved column
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Column name appears verbatim in the phrase
    Exact,
    Synonym,
    Token,
    /// No layer matched; first schema column
    Fallback,
    /// Empty schema
    Wildcard,
}

/// Column chosen for a phrase, with the layer that chose it
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Resolution {
    pub column: String,
    pub strategy: MatchStrategy,
}

impl Resolution {
    pub fn new(column: impl Into<String>, strategy: MatchStrategy) -> Self {
        Self {
            column: column.into(),
            strategy,
        }
    }
}

/// Bound direction for a numeric comparison intent
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    GreaterThan,
    LessThan,
}

impl ComparisonOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::LessThan => "<",
        }
    }
}

/// The classified intent of a natural-language phrase.
///
/// Exactly one intent is selected per translation. Numeric bounds are
/// decimal digit strings and are never narrowed to a machine integer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryIntent {
    Comparison { op: ComparisonOp, bound: String },
    /// Inclusive on both ends
    Range { low: String, high: String },
    /// `over_column` counts the non-null values of a column the phrase named
    /// explicitly, otherwise rows are counted.
    Count { filter: Option<String>, over_column: bool },
    Sum { filter: Option<String> },
    Max,
    Min,
    TopN { n: String },
    Contains { value: String },
    Equals { value: String },
    ShowAll,
}

impl QueryIntent {
    pub fn is_show_all(&self) -> bool {
        matches!(self, QueryIntent::ShowAll)
    }
}

/// Immutable canonical query string plus its decomposition
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CanonicalQuery {
    pub sql: String,
    pub intent: QueryIntent,
    pub table: String,
    pub projection: String,
    pub predicate: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<String>,
    /// Name of the classification rule that fired; `None` when the phrase
    /// matched no rule and the query is the full-scan fallback.
    pub matched_rule: Option<&'static str>,
}

impl CanonicalQuery {
    /// Build the canonical form of `intent` over `table` and `column`.
    pub fn build(
        intent: QueryIntent,
        table: &str,
        column: &str,
        matched_rule: Option<&'static str>,
    ) -> Self {
        let mut projection = "*".to_string();
        let mut predicate = None;
        let mut order_by = None;
        let mut limit = None;

        match &intent {
            QueryIntent::Comparison { op, bound } => {
                predicate = Some(format!("{} {} {}", column, op.as_sql(), bound));
            }
            QueryIntent::Range { low, high } => {
                predicate = Some(format!("{} BETWEEN {} AND {}", column, low, high));
            }
            QueryIntent::Count { filter, over_column } => {
                match filter {
                    Some(value) => {
                        projection = "COUNT(*)".to_string();
                        predicate = Some(format!("{} = {}", column, quote(value)));
                    }
                    None if *over_column => projection = format!("COUNT({})", column),
                    None => projection = "COUNT(*)".to_string(),
                }
            }
            QueryIntent::Sum { filter } => {
                projection = format!("SUM({})", column);
                predicate = filter
                    .as_ref()
                    .map(|value| format!("{} = {}", column, quote(value)));
            }
            QueryIntent::Max => projection = format!("MAX({})", column),
            QueryIntent::Min => projection = format!("MIN({})", column),
            QueryIntent::TopN { n } => {
                order_by = Some(format!("{} DESC", column));
                limit = Some(n.clone());
            }
            QueryIntent::Contains { value } => {
                predicate = Some(format!("{} LIKE {}", column, quote(&format!("%{}%", value))));
            }
            QueryIntent::Equals { value } => {
                predicate = Some(format!("{} = {}", column, quote(value)));
            }
            QueryIntent::ShowAll => {}
        }

        let mut sql = format!("SELECT {} FROM {}", projection, table);
        if let Some(predicate) = &predicate {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if let Some(order_by) = &order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some(limit) = &limit {
            sql.push_str(" LIMIT ");
            sql.push_str(limit);
        }
        sql.push(';');

        Self {
            sql,
            intent,
            table: table.to_string(),
            projection,
            predicate,
            order_by,
            limit,
            matched_rule,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// True when no classification rule matched the phrase.
    pub fn is_fallback(&self) -> bool {
        self.matched_rule.is_none()
    }
}

/// Single-quoted SQL string literal
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl AsRef<str> for CanonicalQuery {
    fn as_ref(&self) -> &str {
        &self.sql
    }
}

impl fmt::Display for CanonicalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

// ============================================================================
// Structural decomposition of a query string
// ============================================================================

static SELECT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*select\b").expect("Invalid regex"));
static FROM_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfrom\b").expect("Invalid regex"));
static WHERE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwhere\b").expect("Invalid regex"));
static ORDER_BY_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\border\s+by\b").expect("Invalid regex"));
static LIMIT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blimit\b").expect("Invalid regex"));

/// Clauses of a query string in the canonical dialect.
///
/// Splitting is textual: keywords are matched case-insensitively and only
/// outside quoted literals. Missing or empty clauses are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParts {
    pub projection: Option<String>,
    pub table: Option<String>,
    pub predicate: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<String>,
}

impl QueryParts {
    pub fn split(sql: &str) -> Self {
        let body = sql.trim().trim_end_matches(';').trim_end();
        let quoted = quoted_spans(body);

        let select = SELECT_KEYWORD.find(body).map(|m| (m.start(), m.end()));
        let from = find_keyword(&FROM_KEYWORD, body, &quoted, end_of(select));
        let where_ = find_keyword(&WHERE_KEYWORD, body, &quoted, end_of(from));
        let order_by = find_keyword(
            &ORDER_BY_KEYWORD,
            body,
            &quoted,
            end_of(where_.or(from)),
        );
        let limit = find_keyword(
            &LIMIT_KEYWORD,
            body,
            &quoted,
            end_of(order_by.or(where_).or(from)),
        );

        let clause = |start: Option<(usize, usize)>, next: &[Option<(usize, usize)>]| {
            let (_, begin) = start?;
            let end = next
                .iter()
                .flatten()
                .map(|(s, _)| *s)
                .find(|s| *s >= begin)
                .unwrap_or(body.len());
            let text = body[begin..end].trim();
            (!text.is_empty()).then(|| text.to_string())
        };

        Self {
            projection: clause(select, &[from]),
            table: clause(from, &[where_, order_by, limit]),
            predicate: clause(where_, &[order_by, limit]),
            order_by: clause(order_by, &[limit]),
            limit: clause(limit, &[])
                .and_then(|text| text.split_whitespace().next().map(str::to_string)),
        }
    }
}

fn end_of(keyword: Option<(usize, usize)>) -> usize {
    keyword.map(|(_, end)| end).unwrap_or(0)
}

/// Byte ranges covered by single- or double-quoted literals. An unterminated
/// literal runs to the end of the input.
pub(crate) fn quoted_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Option<(usize, char)> = None;

    for (idx, ch) in text.char_indices() {
        match open {
            Some((start, quote)) if ch == quote => {
                spans.push((start, idx + ch.len_utf8()));
                open = None;
            }
            Some(_) => {}
            None if ch == '\'' || ch == '"' => open = Some((idx, ch)),
            None => {}
        }
    }
    if let Some((start, _)) = open {
        spans.push((start, text.len()));
    }

    spans
}

fn find_keyword(
    keyword: &Regex,
    text: &str,
    quoted: &[(usize, usize)],
    from: usize,
) -> Option<(usize, usize)> {
    keyword
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .find(|(start, _)| {
            *start >= from && !quoted.iter().any(|(a, b)| start >= a && start < b)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_renders_each_intent() {
        let q = CanonicalQuery::build(
            QueryIntent::Comparison { op: ComparisonOp::GreaterThan, bound: "50".to_string() },
            "players",
            "runs",
            Some("greater_than"),
        );
        assert_eq!(q.sql, "SELECT * FROM players WHERE runs > 50;");
        assert_eq!(q.predicate.as_deref(), Some("runs > 50"));

        let q = CanonicalQuery::build(
            QueryIntent::TopN { n: "5".to_string() },
            "players",
            "runs",
            Some("top_n"),
        );
        assert_eq!(q.sql, "SELECT * FROM players ORDER BY runs DESC LIMIT 5;");
        assert_eq!(q.limit.as_deref(), Some("5"));

        let q = CanonicalQuery::build(
            QueryIntent::Sum { filter: Some("2008".to_string()) },
            "matches",
            "season",
            Some("sum"),
        );
        assert_eq!(q.sql, "SELECT SUM(season) FROM matches WHERE season = '2008';");

        let q = CanonicalQuery::build(
            QueryIntent::Count { filter: None, over_column: true },
            "players",
            "runs",
            Some("count"),
        );
        assert_eq!(q.sql, "SELECT COUNT(runs) FROM players;");
    }

    #[test]
    fn test_build_escapes_quotes_in_values() {
        let q = CanonicalQuery::build(
            QueryIntent::Equals { value: "O'Brien".to_string() },
            "players",
            "playername",
            Some("equals"),
        );
        assert_eq!(q.sql, "SELECT * FROM players WHERE playername = 'O''Brien';");
        assert_eq!(QueryParts::split(&q.sql).predicate.as_deref(), Some("playername = 'O''Brien'"));
    }

    #[test]
    fn test_fallback_is_distinguishable_from_show_all() {
        let fallback = CanonicalQuery::build(QueryIntent::ShowAll, "t", "a", None);
        let explicit = CanonicalQuery::build(QueryIntent::ShowAll, "t", "a", Some("show_all"));
        assert_eq!(fallback.sql, explicit.sql);
        assert!(fallback.is_fallback());
        assert!(!explicit.is_fallback());
    }

    #[test]
    fn test_split_full_query() {
        let parts = QueryParts::split("SELECT * FROM players WHERE runs > 50 ORDER BY runs DESC LIMIT 3;");
        assert_eq!(parts.projection.as_deref(), Some("*"));
        assert_eq!(parts.table.as_deref(), Some("players"));
        assert_eq!(parts.predicate.as_deref(), Some("runs > 50"));
        assert_eq!(parts.order_by.as_deref(), Some("runs DESC"));
        assert_eq!(parts.limit.as_deref(), Some("3"));
    }

    #[test]
    fn test_split_is_case_insensitive_and_quote_aware() {
        let parts = QueryParts::split("select count(*) from t where note = 'order by limit where' ;");
        assert_eq!(parts.projection.as_deref(), Some("count(*)"));
        assert_eq!(parts.table.as_deref(), Some("t"));
        assert_eq!(parts.predicate.as_deref(), Some("note = 'order by limit where'"));
        assert!(parts.order_by.is_none());
        assert!(parts.limit.is_none());
    }

    #[test]
    fn test_split_keeps_oversized_limit() {
        let parts = QueryParts::split("SELECT * FROM t ORDER BY a DESC LIMIT 99999999999999999999;");
        assert_eq!(parts.limit.as_deref(), Some("99999999999999999999"));
    }

    #[test]
    fn test_split_without_where() {
        let parts = QueryParts::split("SELECT * FROM t ORDER BY a DESC LIMIT 2");
        assert!(parts.predicate.is_none());
        assert_eq!(parts.table.as_deref(), Some("t"));
        assert_eq!(parts.order_by.as_deref(), Some("a DESC"));
        assert_eq!(parts.limit.as_deref(), Some("2"));
    }
}
