//! Core domain logic for the to-do application.
//! This crate owns the item vocabulary, its SQLite store and use-case services.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::stats::{PriorityBreakdown, Stats};
pub use model::todo::{
    parse_due_date, FilterType, ParseEnumError, Priority, SortType, TodoDraft, TodoId, TodoItem,
    TodoPatch, TodoValidationError,
};
pub use repo::todo_repo::{RepoError, RepoResult, SqliteTodoRepository, TodoRepository};
pub use search::keyword::{search_todos, KeywordQuery, SearchError, SearchResult};
pub use service::todo_service::{
    Clock, ServiceResult, TodoListQuery, TodoService, TodoServiceError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
