use chrono::{Duration, TimeZone, Utc};
use rusqlite::params;
use todo_core::db::open_db_in_memory;
use todo_core::{
    KeywordQuery, Priority, RepoError, SqliteTodoRepository, TodoDraft, TodoItem, TodoRepository,
    TodoValidationError,
};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 15, 30).unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();

    let draft = TodoDraft::new("Write report", "quarterly numbers")
        .with_priority(Priority::High)
        .with_due_date("2026-10-20T17:00:00Z")
        .with_tags(["work", "q4", "work"]);
    let created = repo.create_todo(&draft, now()).unwrap();

    assert_eq!(created.id, 1);
    assert!(!created.completed);
    assert_eq!(created.created_at, now());
    assert_eq!(created.updated_at, now());

    let loaded = repo.get_todo(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.tags, vec!["work", "q4", "work"]);
}

#[test]
fn create_defaults_priority_to_medium() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();

    let created = repo
        .create_todo(&TodoDraft::new("no priority", "given"), now())
        .unwrap();
    assert_eq!(created.priority, Priority::Medium);
    assert!(created.tags.is_empty());
}

#[test]
fn create_rejects_invalid_draft_without_writing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();

    let err = repo
        .create_todo(&TodoDraft::new("   ", "body"), now())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TodoValidationError::BlankTitle)
    ));
    assert_eq!(repo.count_todos().unwrap(), 0);
}

#[test]
fn ids_are_sequential_and_never_reused() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();

    let first = repo.create_todo(&TodoDraft::new("a", "a"), now()).unwrap();
    let second = repo.create_todo(&TodoDraft::new("b", "b"), now()).unwrap();
    repo.delete_todo(second.id).unwrap();
    let third = repo.create_todo(&TodoDraft::new("c", "c"), now()).unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(third.id, 3);
}

#[test]
fn update_rewrites_fields_and_replaces_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();

    let mut item = repo
        .create_todo(
            &TodoDraft::new("draft", "body").with_tags(["one", "two"]),
            now(),
        )
        .unwrap();
    item.title = "final".to_string();
    item.completed = true;
    item.priority = Priority::Low;
    item.due_date = "2026-11-01".to_string();
    item.tags = vec!["three".to_string()];
    item.updated_at = now() + Duration::minutes(5);
    repo.update_todo(&item).unwrap();

    let loaded = repo.get_todo(item.id).unwrap().unwrap();
    assert_eq!(loaded, item);
}

#[test]
fn update_not_found_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();

    let mut item = repo.create_todo(&TodoDraft::new("x", "y"), now()).unwrap();
    item.id = 99;
    let err = repo.update_todo(&item).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(99)));
}

#[test]
fn delete_removes_item_and_its_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let id = {
        let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();
        let item = repo
            .create_todo(&TodoDraft::new("x", "y").with_tags(["a", "b"]), now())
            .unwrap();
        repo.delete_todo(item.id).unwrap();
        assert_eq!(repo.get_todo(item.id).unwrap(), None);

        let err = repo.delete_todo(item.id).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(id) if id == item.id));
        item.id
    };

    let tag_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM todo_tags WHERE todo_id = ?1;",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tag_rows, 0);
}

#[test]
fn list_returns_items_in_id_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();

    for title in ["c", "a", "b"] {
        repo.create_todo(&TodoDraft::new(title, "body"), now())
            .unwrap();
    }

    let titles = repo
        .list_todos()
        .unwrap()
        .into_iter()
        .map(|item| item.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["c", "a", "b"]);
    assert_eq!(repo.count_todos().unwrap(), 3);
}

#[test]
fn read_rejects_invalid_persisted_timestamp() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO todos (title, created_at, updated_at) VALUES (?1, ?2, ?3);",
        params!["broken", "yesterday", "2026-01-01T00:00:00Z"],
    )
    .unwrap();

    let repo = SqliteTodoRepository::try_new(&mut conn).unwrap();
    let err = repo.list_todos().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("created_at")));
}

#[test]
fn try_new_rejects_connection_without_schema() {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    let err = SqliteTodoRepository::try_new(&mut conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("todos")));
}

fn unsaved(title: &str, completed: bool) -> TodoItem {
    TodoItem {
        id: 0,
        title: title.to_string(),
        description: "batch".to_string(),
        completed,
        priority: Priority::Low,
        due_date: String::new(),
        tags: vec!["batch".to_string()],
        created_at: now() - Duration::hours(1),
        updated_at: now(),
    }
}

#[test]
fn insert_todos_keeps_completion_timestamps_and_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();

    let stored = repo
        .insert_todos(&[unsaved("first", false), unsaved("second", true)])
        .unwrap();
    let ids = stored.iter().map(|item| item.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2]);

    let loaded = repo.get_todo(2).unwrap().unwrap();
    assert_eq!(loaded, stored[1]);
    assert!(loaded.completed);
    assert_eq!(loaded.created_at, now() - Duration::hours(1));
    assert_eq!(loaded.tags, vec!["batch"]);
}

#[test]
fn insert_todos_stores_nothing_when_one_item_is_invalid() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();

    let err = repo
        .insert_todos(&[unsaved("kept?", false), unsaved("  ", false)])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TodoValidationError::BlankTitle)
    ));
    assert_eq!(repo.count_todos().unwrap(), 0);
    assert!(repo.list_todos().unwrap().is_empty());
}

#[test]
fn repository_search_returns_hydrated_matches() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTodoRepository::try_new(&mut conn).unwrap();
    repo.create_todo(
        &TodoDraft::new("Pay rent", "before friday").with_tags(["money"]),
        now(),
    )
    .unwrap();
    repo.create_todo(&TodoDraft::new("Walk dog", "around the park"), now())
        .unwrap();

    let hits = repo.search_todos(&KeywordQuery::new("RENT")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].tags, vec!["money"]);
}
