//! To-do repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `todos` and its ordered `todo_tags` rows.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Item row and tag rows are always written in one transaction.
//! - Tags are stored with their position; order and duplicates survive.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::todo::{Priority, TodoDraft, TodoId, TodoItem, TodoValidationError};
use crate::search::keyword::{self, KeywordQuery, SearchError};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) const TODO_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    completed,
    priority,
    due_date,
    created_at,
    updated_at
FROM todos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for to-do persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TodoValidationError),
    Db(DbError),
    NotFound(TodoId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SearchError> for RepoError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::Db(err) => Self::Db(err),
            SearchError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}

/// Repository interface for to-do CRUD operations.
pub trait TodoRepository {
    /// Persists a new item built from `draft`, stamped with `now`.
    fn create_todo(&mut self, draft: &TodoDraft, now: DateTime<Utc>) -> RepoResult<TodoItem>;
    /// Persists fully formed items in one transaction and returns them with
    /// their assigned ids. Incoming `id` values are ignored; nothing is kept
    /// when any item fails.
    fn insert_todos(&mut self, items: &[TodoItem]) -> RepoResult<Vec<TodoItem>>;
    /// Rewrites every mutable field, including the full tag list.
    fn update_todo(&mut self, item: &TodoItem) -> RepoResult<()>;
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<TodoItem>>;
    /// Lists every item ordered by ascending id.
    fn list_todos(&self) -> RepoResult<Vec<TodoItem>>;
    fn delete_todo(&mut self, id: TodoId) -> RepoResult<()>;
    fn count_todos(&self) -> RepoResult<u64>;
    /// Keyword lookup over title and description, ordered by ascending id.
    fn search_todos(&self, query: &KeywordQuery) -> RepoResult<Vec<TodoItem>>;
}

/// SQLite-backed to-do repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema is
    ///   not the one produced by `db::open_db*`.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_todo_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&mut self, draft: &TodoDraft, now: DateTime<Utc>) -> RepoResult<TodoItem> {
        draft.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let timestamp = timestamp_to_db(now);
        let priority = draft.effective_priority();
        tx.execute(
            "INSERT INTO todos (
                title,
                description,
                completed,
                priority,
                due_date,
                created_at,
                updated_at
            ) VALUES (?1, ?2, 0, ?3, ?4, ?5, ?5);",
            params![
                draft.title.as_str(),
                draft.description.as_str(),
                priority.as_str(),
                draft.due_date.as_str(),
                timestamp.as_str(),
            ],
        )?;

        let item = TodoItem {
            id: tx.last_insert_rowid(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            completed: false,
            priority,
            due_date: draft.due_date.clone(),
            tags: draft.tags.clone(),
            created_at: now,
            updated_at: now,
        };
        item.validate()?;
        replace_tags_in_tx(&tx, item.id, &item.tags)?;
        tx.commit()?;

        Ok(item)
    }

    fn insert_todos(&mut self, items: &[TodoItem]) -> RepoResult<Vec<TodoItem>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            tx.execute(
                "INSERT INTO todos (
                    title,
                    description,
                    completed,
                    priority,
                    due_date,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    item.title.as_str(),
                    item.description.as_str(),
                    bool_to_int(item.completed),
                    item.priority.as_str(),
                    item.due_date.as_str(),
                    timestamp_to_db(item.created_at),
                    timestamp_to_db(item.updated_at),
                ],
            )?;

            let item = TodoItem {
                id: tx.last_insert_rowid(),
                ..item.clone()
            };
            item.validate()?;
            replace_tags_in_tx(&tx, item.id, &item.tags)?;
            stored.push(item);
        }
        tx.commit()?;

        Ok(stored)
    }

    fn update_todo(&mut self, item: &TodoItem) -> RepoResult<()> {
        item.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE todos
             SET
                title = ?1,
                description = ?2,
                completed = ?3,
                priority = ?4,
                due_date = ?5,
                updated_at = ?6
             WHERE id = ?7;",
            params![
                item.title.as_str(),
                item.description.as_str(),
                bool_to_int(item.completed),
                item.priority.as_str(),
                item.due_date.as_str(),
                timestamp_to_db(item.updated_at),
                item.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(item.id));
        }

        replace_tags_in_tx(&tx, item.id, &item.tags)?;
        tx.commit()?;
        Ok(())
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<TodoItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_todo_row(self.conn, row)?));
        }

        Ok(None)
    }

    fn list_todos(&self) -> RepoResult<Vec<TodoItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_todo_row(self.conn, row)?);
        }

        Ok(items)
    }

    fn delete_todo(&mut self, id: TodoId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM todos WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn count_todos(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM todos;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative todo count `{count}`")))
    }

    fn search_todos(&self, query: &KeywordQuery) -> RepoResult<Vec<TodoItem>> {
        Ok(keyword::search_todos(self.conn, query)?)
    }
}

/// Decodes one row selected with [`TODO_SELECT_SQL`], loading its tags.
pub(crate) fn parse_todo_row(conn: &Connection, row: &Row<'_>) -> RepoResult<TodoItem> {
    let id: TodoId = row.get("id")?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in todos.completed"
            )));
        }
    };

    let priority_text: String = row.get("priority")?;
    let priority = priority_text.parse::<Priority>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in todos.priority"
        ))
    })?;

    let created_text: String = row.get("created_at")?;
    let updated_text: String = row.get("updated_at")?;

    let item = TodoItem {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        completed,
        priority,
        due_date: row.get("due_date")?,
        tags: load_tags(conn, id)?,
        created_at: timestamp_from_db(&created_text, "todos.created_at")?,
        updated_at: timestamp_from_db(&updated_text, "todos.updated_at")?,
    };
    item.validate()?;
    Ok(item)
}

fn load_tags(conn: &Connection, todo_id: TodoId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM todo_tags
         WHERE todo_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([todo_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn replace_tags_in_tx(tx: &Transaction<'_>, todo_id: TodoId, tags: &[String]) -> RepoResult<()> {
    tx.execute("DELETE FROM todo_tags WHERE todo_id = ?1;", [todo_id])?;
    let mut stmt =
        tx.prepare("INSERT INTO todo_tags (todo_id, position, tag) VALUES (?1, ?2, ?3);")?;
    for (position, tag) in tags.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| RepoError::InvalidData(format!("tag position overflow for {todo_id}")))?;
        stmt.execute(params![todo_id, position, tag.as_str()])?;
    }
    Ok(())
}

fn timestamp_to_db(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn timestamp_from_db(value: &str, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_todo_connection_ready(conn: &Connection) -> RepoResult<()> {
    const REQUIRED: &[(&str, &[&str])] = &[
        (
            "todos",
            &[
                "id",
                "title",
                "description",
                "completed",
                "priority",
                "due_date",
                "created_at",
                "updated_at",
            ],
        ),
        ("todo_tags", &["todo_id", "position", "tag"]),
    ];

    for &(table, columns) in REQUIRED {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
