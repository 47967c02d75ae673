//! Read-only gate for submitted queries.
//!
//! A query must start with `SELECT` and must not mention any data-modifying
//! keyword. With [`KeywordPolicy::Substring`] the keyword check is a plain
//! case-insensitive substring scan over the whole text, so identifiers such as
//! `updated_at` are rejected too. [`KeywordPolicy::Token`] uses the
//! [sqlparser](https://docs.rs/sqlparser/) tokenizer and only rejects unquoted
//! word tokens.

use crate::db::DatabaseType;
use crate::error::{ExplorerError, ExplorerResult};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::tokenizer::{Token, Tokenizer};
use tracing::debug;

/// Keywords rejected anywhere in a query, checked in this order.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE",
];

/// How forbidden keywords are detected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum KeywordPolicy {
    /// Case-insensitive substring scan of the full text
    #[default]
    Substring,
    /// Match unquoted keyword tokens only
    Token,
}

fn get_dialect(db_type: DatabaseType) -> Box<dyn Dialect> {
    match db_type {
        DatabaseType::PostgreSQL => Box::new(PostgreSqlDialect {}),
        DatabaseType::MySQL => Box::new(MySqlDialect {}),
        DatabaseType::SQLite => Box::new(SQLiteDialect {}),
    }
}

/// Validate a query for read-only execution.
///
/// # Examples
///
/// ```
/// use schema_explorer::db::DatabaseType;
/// use schema_explorer::tools::sql_validator::{KeywordPolicy, validate_select};
///
/// assert!(validate_select("select * from node", KeywordPolicy::Substring, DatabaseType::SQLite).is_ok());
/// assert!(validate_select("UPDATE node SET x = 1", KeywordPolicy::Substring, DatabaseType::SQLite).is_err());
/// ```
pub fn validate_select(
    sql: &str,
    policy: KeywordPolicy,
    db_type: DatabaseType,
) -> ExplorerResult<()> {
    let trimmed = sql.trim();
    if !starts_with_select(trimmed) {
        return Err(ExplorerError::NotASelect);
    }

    let found = match policy {
        KeywordPolicy::Substring => find_keyword_substring(trimmed),
        KeywordPolicy::Token => find_keyword_token(trimmed, db_type),
    };

    match found {
        Some(keyword) => Err(ExplorerError::forbidden_keyword(keyword)),
        None => Ok(()),
    }
}

/// The first word must be SELECT, matched case-insensitively.
fn starts_with_select(sql: &str) -> bool {
    let Some(head) = sql.get(..6) else {
        return false;
    };
    if !head.eq_ignore_ascii_case("select") {
        return false;
    }
    match sql[6..].chars().next() {
        Some(c) => !(c.is_alphanumeric() || c == '_'),
        None => true,
    }
}

fn find_keyword_substring(sql: &str) -> Option<&'static str> {
    let upper = sql.to_uppercase();
    FORBIDDEN_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| upper.contains(keyword))
}

fn find_keyword_token(sql: &str, db_type: DatabaseType) -> Option<&'static str> {
    let dialect = get_dialect(db_type);
    let tokens = match Tokenizer::new(dialect.as_ref(), sql).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            debug!(error = %e, "Tokenizer failed, falling back to substring scan");
            return find_keyword_substring(sql);
        }
    };

    FORBIDDEN_KEYWORDS.iter().copied().find(|keyword| {
        tokens.iter().any(|token| match token {
            Token::Word(word) => {
                word.quote_style.is_none() && word.value.eq_ignore_ascii_case(keyword)
            }
            _ => false,
        })
    })
}
