//! Case-insensitive keyword search over to-do items.
//!
//! # Responsibility
//! - Match the query as one substring against title or description.
//! - Return fully hydrated items (tags included).
//!
//! # Invariants
//! - Blank queries return no hits.
//! - Case folding uses full Unicode lowercase mapping on both sides.
//! - Result ordering is deterministic by ascending id.

use crate::db::DbError;
use crate::model::todo::TodoItem;
use crate::repo::todo_repo::{parse_todo_row, RepoError, TODO_SELECT_SQL};
use log::debug;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            RepoError::InvalidData(message) => Self::InvalidData(message),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Search options for keyword lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordQuery {
    /// User query text; surrounding whitespace is ignored.
    pub text: String,
    /// Maximum number of hits to return.
    pub limit: u32,
}

impl KeywordQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Returns items whose title or description contains the query text.
///
/// Both sides are folded with Unicode lowercase mapping before matching.
pub fn search_todos(conn: &Connection, query: &KeywordQuery) -> SearchResult<Vec<TodoItem>> {
    let needle = query.text.trim().to_lowercase();
    if needle.is_empty() || query.limit == 0 {
        return Ok(Vec::new());
    }
    let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

    let mut stmt = conn.prepare(&format!("{TODO_SELECT_SQL} ORDER BY id ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut hits = Vec::new();
    while let Some(row) = rows.next()? {
        let title: String = row.get("title")?;
        let description: String = row.get("description")?;
        if !contains_folded(&title, &needle) && !contains_folded(&description, &needle) {
            continue;
        }
        hits.push(parse_todo_row(conn, row)?);
        if hits.len() >= limit {
            break;
        }
    }

    debug!(
        "event=todo_search module=search status=ok hits={} limit={}",
        hits.len(),
        query.limit
    );
    Ok(hits)
}

fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    haystack.to_lowercase().contains(folded_needle)
}

#[cfg(test)]
mod tests {
    use super::contains_folded;

    #[test]
    fn folding_covers_non_ascii_letters() {
        assert!(contains_folded("ÉCOLE Inscription", "école"));
        assert!(contains_folded("Straße", "straße"));
        assert!(!contains_folded("ecole", "école"));
    }
}
