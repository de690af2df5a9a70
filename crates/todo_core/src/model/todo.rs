//! To-do item domain model.
//!
//! # Responsibility
//! - Define the item record plus the filter/sort vocabulary used by views.
//! - Interpret text-encoded due dates for overdue and ordering decisions.
//!
//! # Invariants
//! - `id` is assigned once by the persistence layer and never reused.
//! - `updated_at` should not be earlier than `created_at`.
//! - Deserialization never validates; callers run `validate()` explicitly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Numeric identifier of a to-do item.
pub type TodoId = i64;

/// Closed urgency label carried by every item.
///
/// Variant order is the urgency order (`Low < Medium < High`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ParseEnumError::new("priority", other)),
        }
    }
}

/// View selector over a collection of items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Returns whether `item` belongs to this view.
    pub fn matches(self, item: &TodoItem) -> bool {
        match self {
            Self::All => true,
            Self::Active => !item.completed,
            Self::Completed => item.completed,
        }
    }
}

impl Display for FilterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(ParseEnumError::new("filter", other)),
        }
    }
}

/// Ordering key over a collection of items.
///
/// Every key falls back to ascending `id`, so orderings are total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortType {
    /// Newest `created_at` first.
    #[default]
    #[serde(rename = "created")]
    Created,
    /// Earliest interpretable due date first; undated items last.
    #[serde(rename = "dueDate")]
    DueDate,
    /// High, then medium, then low.
    #[serde(rename = "priority")]
    Priority,
    /// Case-insensitive title, ascending.
    #[serde(rename = "title")]
    Title,
}

impl SortType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::DueDate => "dueDate",
            Self::Priority => "priority",
            Self::Title => "title",
        }
    }

    /// Compares two items under this key.
    pub fn compare(self, a: &TodoItem, b: &TodoItem) -> Ordering {
        let primary = match self {
            Self::Created => b.created_at.cmp(&a.created_at),
            Self::DueDate => match (a.due_at(), b.due_at()) {
                (Some(left), Some(right)) => left.cmp(&right),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Priority => b.priority.cmp(&a.priority),
            Self::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    /// Sorts `items` in place under this key.
    pub fn sort(self, items: &mut [TodoItem]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl Display for SortType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created" => Ok(Self::Created),
            "dueDate" => Ok(Self::DueDate),
            "priority" => Ok(Self::Priority),
            "title" => Ok(Self::Title),
            other => Err(ParseEnumError::new("sort", other)),
        }
    }
}

/// Error returned when enum text is outside its closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl Display for ParseEnumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} value `{}`", self.kind, self.value)
    }
}

impl Error for ParseEnumError {}

/// Validation failures for items and drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    BlankTitle,
    BlankDescription,
    InvalidId(TodoId),
    /// Due date text is non-empty but not RFC 3339 or `YYYY-MM-DD`.
    InvalidDueDate(String),
    UpdatedBeforeCreated {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::BlankDescription => write!(f, "description must not be blank"),
            Self::InvalidId(id) => write!(f, "todo id must be positive, got {id}"),
            Self::InvalidDueDate(value) => write!(
                f,
                "due date `{value}` is neither RFC 3339 nor YYYY-MM-DD"
            ),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updatedAt ({}) must be >= createdAt ({})",
                updated_at.to_rfc3339(),
                created_at.to_rfc3339()
            ),
        }
    }
}

impl Error for TodoValidationError {}

/// A single task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    /// Caller-provided text; empty means no due date.
    pub due_date: String,
    /// Order and duplicates are preserved as given.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoItem {
    /// Interprets `due_date` as an instant.
    ///
    /// Accepts RFC 3339 date-times and plain `YYYY-MM-DD` dates (midnight
    /// UTC). Returns `None` for empty or unrecognized text.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        parse_due_date(&self.due_date)
    }

    /// Returns whether the item is still open and due strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_at().is_some_and(|due| due < now)
    }

    /// Sets `updated_at` to `now`, never earlier than `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    /// Checks the invariants a correct caller upholds.
    ///
    /// # Errors
    /// - Returns the first violated rule; see [`TodoValidationError`].
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.id <= 0 {
            return Err(TodoValidationError::InvalidId(self.id));
        }
        if self.title.trim().is_empty() {
            return Err(TodoValidationError::BlankTitle);
        }
        validate_due_date(&self.due_date)?;
        if self.updated_at < self.created_at {
            return Err(TodoValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

/// Create input for a new item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
    pub title: String,
    pub description: String,
    /// Missing or empty priority falls back to `medium`.
    #[serde(default, deserialize_with = "blank_priority_as_none")]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: String,
    /// `null` reads as no tags.
    #[serde(default, deserialize_with = "null_tags_as_empty")]
    pub tags: Vec<String>,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = due_date.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    /// Title and description are both required at creation time.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.title.trim().is_empty() {
            return Err(TodoValidationError::BlankTitle);
        }
        if self.description.trim().is_empty() {
            return Err(TodoValidationError::BlankDescription);
        }
        validate_due_date(&self.due_date)
    }
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
    }

    /// Copies every present field onto `item`. Timestamps are not touched.
    pub fn apply_to(&self, item: &mut TodoItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(due_date) = &self.due_date {
            item.due_date = due_date.clone();
        }
        if let Some(tags) = &self.tags {
            item.tags = tags.clone();
        }
    }
}

fn blank_priority_as_none<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<Priority>()
            .map(Some)
            .map_err(|_| de::Error::unknown_variant(value, &["low", "medium", "high"])),
    }
}

fn null_tags_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses due-date text: RFC 3339 first, then a bare calendar date.
pub fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn validate_due_date(value: &str) -> Result<(), TodoValidationError> {
    if value.trim().is_empty() || parse_due_date(value).is_some() {
        Ok(())
    } else {
        Err(TodoValidationError::InvalidDueDate(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::parse_due_date;
    use chrono::{TimeZone, Utc};

    #[test]
    fn parse_due_date_accepts_rfc3339_with_offset() {
        let parsed = parse_due_date("2026-03-01T10:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn parse_due_date_treats_bare_date_as_utc_midnight() {
        let parsed = parse_due_date(" 2020-01-01 ").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_due_date_rejects_blank_and_garbage() {
        assert_eq!(parse_due_date(""), None);
        assert_eq!(parse_due_date("   "), None);
        assert_eq!(parse_due_date("next tuesday"), None);
        assert_eq!(parse_due_date("2020-13-01"), None);
    }
}
