// Intent Translator
//
// Classifies a natural-language phrase into one query intent and renders the
// canonical query for it. Classification walks an ordered rule table and the
// first rule that produces an intent wins; the order is the intent priority
// because several rules can fire on the same phrase.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::{CanonicalQuery, ComparisonOp, QueryIntent, Resolution};
use crate::services::column_resolver::{ColumnResolver, WILDCARD};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Phrase is empty")]
    EmptyPhrase,

    #[error("Table name is empty")]
    EmptyTable,

    #[error("Table '{table}' has no columns to apply a '{rule}' request to")]
    EmptySchema { table: String, rule: &'static str },
}

// ============================================================================
// Value extraction
// ============================================================================

static QUOTED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^']+)'").expect("Invalid regex"));
static KEYWORD_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(named as|named|from|with|is|equals|containing|having|of|by)\s+([A-Za-z0-9\s+\-]+)",
    )
    .expect("Invalid regex")
});

/// Where an extracted value came from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Quoted,
    Keyword,
    LastToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedValue {
    pub value: String,
    pub source: ValueSource,
}

impl ExtractedValue {
    /// The value was quoted or anchored by a keyword rather than guessed
    pub fn is_explicit(&self) -> bool {
        self.source != ValueSource::LastToken
    }
}

/// Pull a literal out of a phrase.
///
/// Precedence: the first single-quoted substring, then the text after a value
/// keyword (`named`, `from`, `with`, `is`, ...), then the phrase's last word.
/// Case is preserved.
pub fn extract_value(phrase: &str) -> ExtractedValue {
    if let Some(caps) = QUOTED_VALUE.captures(phrase) {
        return ExtractedValue {
            value: caps[1].to_string(),
            source: ValueSource::Quoted,
        };
    }

    if let Some(caps) = KEYWORD_VALUE.captures(phrase) {
        let value = caps[2].trim();
        if !value.is_empty() {
            return ExtractedValue {
                value: value.to_string(),
                source: ValueSource::Keyword,
            };
        }
    }

    ExtractedValue {
        value: phrase.split_whitespace().last().unwrap_or_default().to_string(),
        source: ValueSource::LastToken,
    }
}

/// Value to filter an aggregate on, if the phrase carries a real one.
///
/// The guessed last word of a phrase is never used: "how many players" would
/// otherwise filter on `= 'players'`.
fn aggregate_filter(phrase: &str) -> Option<String> {
    let extracted = extract_value(phrase);
    let plain = is_numeric(&extracted.value) || is_alphabetic(&extracted.value);
    (extracted.is_explicit() && plain).then_some(extracted.value)
}

fn is_numeric(value: &str) -> bool {
    let digits = value.replacen('.', "", 1);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_alphabetic(value: &str) -> bool {
    !value.is_empty() && value.chars().all(char::is_alphabetic)
}

// ============================================================================
// Classification rules
// ============================================================================

static GREATER_THAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(more than|greater than|above|over)\s+(\d+)").expect("Invalid regex")
});
static LESS_THAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(less than|below|under)\s+(\d+)").expect("Invalid regex"));
static BETWEEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bbetween\s+(\d+)\s+and\s+(\d+)").expect("Invalid regex"));
// Keyword rules anchor on the word start only, so inflected forms such as
// "counts" or "showing" still fire.
static COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(how many|count)").expect("Invalid regex"));
static SUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bsum").expect("Invalid regex"));
static MAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(maximum|highest|max)\b").expect("Invalid regex"));
static MIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(minimum|lowest|min)\b").expect("Invalid regex"));
static TOP_N: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(top|first)\s+(\d+)").expect("Invalid regex"));
static CONTAINS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(contains|like)").expect("Invalid regex"));
static EQUALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(equals|is|with|held|having|from)").expect("Invalid regex")
});
static SHOW_ALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(all|show)").expect("Invalid regex"));

/// Phrase as seen by the classification rules
struct PhraseContext<'a> {
    phrase: &'a str,
    lower: String,
    table_lc: String,
    column: &'a str,
}

impl<'a> PhraseContext<'a> {
    fn new(phrase: &'a str, table: &str, column: &'a str) -> Self {
        Self {
            phrase,
            lower: phrase.to_lowercase(),
            table_lc: table.to_lowercase(),
            column,
        }
    }

    /// The resolved column is written out in the phrase itself
    fn names_column(&self) -> bool {
        !self.column.is_empty()
            && self.column != WILDCARD
            && self.lower.contains(&self.column.to_lowercase())
    }
}

/// One entry of the ordered classification table
pub struct IntentRule {
    pub name: &'static str,
    classify: fn(&PhraseContext<'_>) -> Option<QueryIntent>,
}

static RULES: &[IntentRule] = &[
    IntentRule { name: "greater_than", classify: greater_than },
    IntentRule { name: "less_than", classify: less_than },
    IntentRule { name: "between", classify: between },
    IntentRule { name: "count", classify: count },
    IntentRule { name: "sum", classify: sum },
    IntentRule { name: "max", classify: max },
    IntentRule { name: "min", classify: min },
    IntentRule { name: "top_n", classify: top_n },
    IntentRule { name: "contains", classify: contains },
    IntentRule { name: "equals", classify: equals },
    IntentRule { name: "show_all", classify: show_all },
];

/// The classification table in priority order
pub fn rules() -> &'static [IntentRule] {
    RULES
}

fn bound(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|caps| integer(&caps[2]))
}

/// Digit run without leading zeros. Kept as text so any length survives.
fn integer(digits: &str) -> String {
    match digits.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn greater_than(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    bound(&GREATER_THAN, &ctx.lower).map(|bound| QueryIntent::Comparison {
        op: ComparisonOp::GreaterThan,
        bound,
    })
}

fn less_than(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    bound(&LESS_THAN, &ctx.lower).map(|bound| QueryIntent::Comparison {
        op: ComparisonOp::LessThan,
        bound,
    })
}

fn between(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    let caps = BETWEEN.captures(&ctx.lower)?;
    Some(QueryIntent::Range {
        low: integer(&caps[1]),
        high: integer(&caps[2]),
    })
}

fn count(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    if !COUNT.is_match(&ctx.lower) {
        return None;
    }
    let filter = aggregate_filter(ctx.phrase);
    let over_column = filter.is_none() && ctx.names_column();
    Some(QueryIntent::Count { filter, over_column })
}

fn sum(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    SUM.is_match(&ctx.lower).then(|| QueryIntent::Sum {
        filter: aggregate_filter(ctx.phrase),
    })
}

fn max(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    MAX.is_match(&ctx.lower).then_some(QueryIntent::Max)
}

fn min(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    MIN.is_match(&ctx.lower).then_some(QueryIntent::Min)
}

fn top_n(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    bound(&TOP_N, &ctx.lower).map(|n| QueryIntent::TopN { n })
}

fn contains(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    CONTAINS.is_match(&ctx.lower).then(|| QueryIntent::Contains {
        value: extract_value(ctx.phrase).value,
    })
}

fn equals(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    EQUALS.is_match(&ctx.lower).then(|| QueryIntent::Equals {
        value: extract_value(ctx.phrase).value,
    })
}

fn show_all(ctx: &PhraseContext<'_>) -> Option<QueryIntent> {
    let names_table = !ctx.table_lc.is_empty() && ctx.lower.contains(&ctx.table_lc);
    (SHOW_ALL.is_match(&ctx.lower) || names_table).then_some(QueryIntent::ShowAll)
}

/// Outcome of classifying one phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// `None` when no rule matched and the intent is the ShowAll fallback
    pub rule: Option<&'static str>,
    pub intent: QueryIntent,
}

pub fn classify(phrase: &str, table: &str, column: &str) -> Classification {
    let ctx = PhraseContext::new(phrase, table, column);
    RULES
        .iter()
        .find_map(|rule| {
            (rule.classify)(&ctx).map(|intent| Classification {
                rule: Some(rule.name),
                intent,
            })
        })
        .unwrap_or(Classification {
            rule: None,
            intent: QueryIntent::ShowAll,
        })
}

/// Translate a phrase into the canonical query over `table` and an already
/// resolved `column`. Unrecognized phrases yield `SELECT * FROM <table>;`.
pub fn translate(phrase: &str, table: &str, column: &str) -> CanonicalQuery {
    let Classification { rule, intent } = classify(phrase, table, column);
    match rule {
        Some(name) => tracing::debug!(rule = name, column, "phrase classified"),
        None => tracing::debug!(table, "no rule matched phrase, falling back to full scan"),
    }
    CanonicalQuery::build(intent, table, column, rule)
}

// ============================================================================
// Schema-aware translator
// ============================================================================

/// Canonical query together with the column resolution that fed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub query: CanonicalQuery,
    pub resolution: Resolution,
}

/// Resolves the column and translates a phrase for one table
pub struct IntentTranslator<'a> {
    table: String,
    columns: Vec<String>,
    resolver: ColumnResolver<'a>,
}

impl IntentTranslator<'static> {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self::with_resolver(table, columns, ColumnResolver::new())
    }
}

impl<'a> IntentTranslator<'a> {
    pub fn with_resolver(
        table: impl Into<String>,
        columns: Vec<String>,
        resolver: ColumnResolver<'a>,
    ) -> Self {
        Self {
            table: table.into(),
            columns,
            resolver,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Translate `phrase`. Fails on an empty phrase or table, and when the
    /// schema has no columns but the phrase asks for more than a full scan.
    pub fn translate(&self, phrase: &str) -> Result<Translation, TranslateError> {
        if phrase.trim().is_empty() {
            return Err(TranslateError::EmptyPhrase);
        }
        if self.table.trim().is_empty() {
            return Err(TranslateError::EmptyTable);
        }

        let resolution = self.resolver.resolve(phrase, &self.columns);
        let query = translate(phrase, &self.table, &resolution.column);

        if self.columns.is_empty() && !query.intent.is_show_all() {
            return Err(TranslateError::EmptySchema {
                table: self.table.clone(),
                rule: query.matched_rule.unwrap_or("fallback"),
            });
        }

        Ok(Translation { query, resolution })
    }
}
