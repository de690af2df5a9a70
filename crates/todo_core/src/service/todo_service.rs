//! To-do use-case service.
//!
//! # Responsibility
//! - Provide create/toggle/update/delete/list/search/stats entry points.
//! - Stamp timestamps and apply filter/sort views over repository data.
//!
//! # Invariants
//! - Every mutation bumps `updated_at` to `max(now, created_at)`.
//! - Stats are recomputed from the full collection on every call.
//! - Sample seeding is all-or-nothing.
//! - Service layer remains storage-agnostic.

use crate::model::stats::Stats;
use crate::model::todo::{
    FilterType, Priority, SortType, TodoDraft, TodoId, TodoItem, TodoPatch, TodoValidationError,
};
use crate::repo::todo_repo::{RepoError, TodoRepository};
use crate::search::keyword::KeywordQuery;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Source of the current instant.
pub type Clock = fn() -> DateTime<Utc>;

/// Service error for to-do use-cases.
#[derive(Debug)]
pub enum TodoServiceError {
    /// Input or resulting item breaks a validation rule.
    Validation(TodoValidationError),
    /// Target item does not exist.
    TodoNotFound(TodoId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TodoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TodoNotFound(id) => write!(f, "todo not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent todo state: {details}"),
        }
    }
}

impl Error for TodoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TodoServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TodoNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<TodoValidationError> for TodoServiceError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ServiceResult<T> = Result<T, TodoServiceError>;

/// View options for [`TodoService::list_todos`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoListQuery {
    pub filter: FilterType,
    pub sort: SortType,
}

/// To-do service facade over repository implementations.
pub struct TodoService<R: TodoRepository> {
    repo: R,
    clock: Clock,
}

impl<R: TodoRepository> TodoService<R> {
    /// Creates a service reading the wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, Utc::now)
    }

    /// Creates a service with an explicit time source.
    pub fn with_clock(repo: R, clock: Clock) -> Self {
        Self { repo, clock }
    }

    /// Creates one item. Missing priority defaults to `medium`.
    pub fn create_todo(&mut self, draft: TodoDraft) -> ServiceResult<TodoItem> {
        let now = (self.clock)();
        let result = self
            .repo
            .create_todo(&draft, now)
            .map_err(TodoServiceError::from);
        log_outcome("create", result.as_ref().ok().map(|item| item.id), &result);
        result
    }

    /// Gets one item by id.
    pub fn get_todo(&self, id: TodoId) -> ServiceResult<Option<TodoItem>> {
        let result = self.repo.get_todo(id).map_err(TodoServiceError::from);
        match &result {
            Ok(found) => debug!(
                "event=todo_get module=service status=ok todo_id={id} found={}",
                found.is_some()
            ),
            Err(err) => error!("event=todo_get module=service status=error todo_id={id} error={err}"),
        }
        result
    }

    /// Flips the completion flag and returns the stored item.
    pub fn toggle_todo(&mut self, id: TodoId) -> ServiceResult<TodoItem> {
        let result = self.mutate(id, |item| item.completed = !item.completed);
        log_outcome("toggle", Some(id), &result);
        result
    }

    /// Applies the present fields of `patch` and returns the stored item.
    pub fn update_todo(&mut self, id: TodoId, patch: &TodoPatch) -> ServiceResult<TodoItem> {
        let result = self.mutate(id, |item| patch.apply_to(item));
        log_outcome("update", Some(id), &result);
        result
    }

    /// Removes one item.
    pub fn delete_todo(&mut self, id: TodoId) -> ServiceResult<()> {
        let result = self.repo.delete_todo(id).map_err(TodoServiceError::from);
        log_outcome("delete", Some(id), &result);
        result
    }

    /// Lists items matching `query.filter`, ordered by `query.sort`.
    pub fn list_todos(&self, query: &TodoListQuery) -> ServiceResult<Vec<TodoItem>> {
        let result = self
            .repo
            .list_todos()
            .map_err(TodoServiceError::from)
            .map(|mut items| {
                items.retain(|item| query.filter.matches(item));
                query.sort.sort(&mut items);
                items
            });
        log_read("list", &result, Vec::len);
        result
    }

    /// Case-insensitive keyword lookup over title and description.
    pub fn search_todos(&self, query: &KeywordQuery) -> ServiceResult<Vec<TodoItem>> {
        let result = self
            .repo
            .search_todos(query)
            .map_err(TodoServiceError::from);
        log_read("search", &result, Vec::len);
        result
    }

    /// Aggregates the whole collection at the current instant.
    pub fn stats(&self) -> ServiceResult<Stats> {
        self.stats_at((self.clock)())
    }

    /// Aggregates the whole collection as seen at `now`.
    pub fn stats_at(&self, now: DateTime<Utc>) -> ServiceResult<Stats> {
        let result = self
            .repo
            .list_todos()
            .map_err(TodoServiceError::from)
            .map(|items| Stats::compute(&items, now));
        log_read("stats", &result, |stats| stats.total);
        result
    }

    /// Number of stored items.
    pub fn count_todos(&self) -> ServiceResult<u64> {
        let result = self.repo.count_todos().map_err(TodoServiceError::from);
        log_read("count", &result, |count| *count);
        result
    }

    /// Inserts the three onboarding items in one transaction and returns them
    /// in insert order. Nothing is stored when any insert fails.
    ///
    /// - high priority, due tomorrow;
    /// - medium priority, due in three days;
    /// - low priority, due yesterday, created two days ago and completed.
    pub fn seed_samples(&mut self) -> ServiceResult<Vec<TodoItem>> {
        let now = (self.clock)();
        let due_in =
            |days: i64| (now + Duration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, true);

        let sample = |title: &str,
                      description: &str,
                      priority: Priority,
                      due_days: i64,
                      tags: [&str; 2]| TodoItem {
            id: 0,
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
            priority,
            due_date: due_in(due_days),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            created_at: now,
            updated_at: now,
        };

        let welcome = sample(
            "Welcome to Enhanced TODO",
            "This app now has priority levels, due dates, tags, and search!",
            Priority::High,
            1,
            ["important", "demo"],
        );
        let backend = sample(
            "Learn Rust Backend",
            "Complete the storage layer with advanced features",
            Priority::Medium,
            3,
            ["learning", "backend"],
        );
        let mut done = sample(
            "Master Frontend",
            "Build an interactive UI with filters and search",
            Priority::Low,
            -1,
            ["learning", "frontend"],
        );
        done.created_at = now - Duration::hours(48);
        done.completed = true;
        done.touch(now);

        let result = self
            .repo
            .insert_todos(&[welcome, backend, done])
            .map_err(TodoServiceError::from);
        match &result {
            Ok(seeded) => info!(
                "event=todo_seed module=service status=ok count={}",
                seeded.len()
            ),
            Err(err) => error!("event=todo_seed module=service status=error error={err}"),
        }
        result
    }

    fn mutate<F>(&mut self, id: TodoId, change: F) -> ServiceResult<TodoItem>
    where
        F: FnOnce(&mut TodoItem),
    {
        let mut item = self
            .repo
            .get_todo(id)?
            .ok_or(TodoServiceError::TodoNotFound(id))?;
        change(&mut item);
        item.touch((self.clock)());
        self.repo.update_todo(&item)?;

        self.repo
            .get_todo(id)?
            .ok_or(TodoServiceError::InconsistentState(
                "updated todo not found in read-back",
            ))
    }
}

fn log_read<T, N: Display>(op: &str, result: &ServiceResult<T>, count: impl FnOnce(&T) -> N) {
    match result {
        Ok(value) => debug!("event=todo_{op} module=service status=ok count={}", count(value)),
        Err(err) => error!("event=todo_{op} module=service status=error error={err}"),
    }
}

fn log_outcome<T>(op: &str, id: Option<TodoId>, result: &ServiceResult<T>) {
    let id = id.map_or_else(|| "none".to_string(), |value| value.to_string());
    match result {
        Ok(_) => info!("event=todo_{op} module=service status=ok todo_id={id}"),
        Err(err) => error!("event=todo_{op} module=service status=error todo_id={id} error={err}"),
    }
}
