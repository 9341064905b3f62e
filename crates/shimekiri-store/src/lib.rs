#![forbid(unsafe_code)]
//! Durable storage for users and todos over SQLite.
//!
//! All mutations are ownership-checked here, before any row is touched; the
//! delivery layer maps [`StoreError`] variants onto HTTP statuses.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use shimekiri_model::{
    is_near_due, Content, DueDate, ExternalIdentity, Nickname, ParseError, Todo, TodoId,
    TodoStatus, User, UserId,
};
use std::fmt::{Display, Formatter};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    provider_id TEXT NOT NULL UNIQUE,
    nickname    TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    avatar_url  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS todos (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id  INTEGER NOT NULL REFERENCES users(id),
    content  TEXT NOT NULL,
    due_date TEXT NOT NULL,
    status   INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS todos_user_id ON todos(user_id);
";

#[derive(Debug)]
#[non_exhaustive]
pub enum StoreError {
    NotFound,
    NotOwner,
    Validation(ParseError),
    Storage(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("record not found"),
            Self::NotOwner => f.write_str("caller does not own this todo"),
            Self::Validation(e) => write!(f, "validation failed: {e}"),
            Self::Storage(msg) => write!(f, "storage failure: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for StoreError {
    fn from(e: ParseError) -> Self {
        Self::Validation(e)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Which of a user's todos a listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub incomplete_only: bool,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Looks the user up by provider id; first login creates the row,
    /// later logins refresh the mutable profile fields.
    pub fn find_or_create_user(&self, identity: &ExternalIdentity) -> Result<User, StoreError> {
        identity.validate()?;
        let nickname = Nickname::parse(&identity.nickname)?;

        if let Some(existing) = self.user_by_provider_id(&identity.provider_id)? {
            self.conn.execute(
                "UPDATE users SET name = ?1, avatar_url = ?2 WHERE id = ?3",
                params![identity.name, identity.avatar_url, existing.id.as_i64()],
            )?;
            return Ok(User::new(
                existing.id,
                existing.provider_id,
                existing.nickname,
                identity.name.clone(),
                identity.avatar_url.clone(),
            ));
        }

        self.conn.execute(
            "INSERT INTO users (provider_id, nickname, name, avatar_url) VALUES (?1, ?2, ?3, ?4)",
            params![
                identity.provider_id,
                nickname.as_str(),
                identity.name,
                identity.avatar_url
            ],
        )?;
        let id = UserId::new(self.conn.last_insert_rowid());
        Ok(User::new(
            id,
            identity.provider_id.clone(),
            nickname,
            identity.name.clone(),
            identity.avatar_url.clone(),
        ))
    }

    pub fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.select_user("SELECT id, provider_id, nickname, name, avatar_url FROM users WHERE id = ?1", params![id.as_i64()])
    }

    pub fn user_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError> {
        self.select_user("SELECT id, provider_id, nickname, name, avatar_url FROM users WHERE nickname = ?1", params![nickname])
    }

    fn user_by_provider_id(&self, provider_id: &str) -> Result<Option<User>, StoreError> {
        self.select_user("SELECT id, provider_id, nickname, name, avatar_url FROM users WHERE provider_id = ?1", params![provider_id])
    }

    fn select_user(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> Result<Option<User>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(args)?;
        match rows.next()? {
            Some(row) => Ok(Some(user_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Persists a new todo owned by `owner` with status incomplete.
    ///
    /// `due_date` is kept exactly as submitted; only emptiness and size are
    /// checked, not calendar shape.
    pub fn create_todo(
        &self,
        owner: UserId,
        content: &str,
        due_date: &str,
    ) -> Result<Todo, StoreError> {
        let content = Content::parse(content)?;
        let due_date = DueDate::parse(due_date)?;
        self.conn.execute(
            "INSERT INTO todos (user_id, content, due_date, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                owner.as_i64(),
                content.as_str(),
                due_date.as_str(),
                TodoStatus::Incomplete.as_i64()
            ],
        )?;
        let id = TodoId::new(self.conn.last_insert_rowid());
        Ok(Todo::new(id, owner, content, due_date, TodoStatus::Incomplete))
    }

    pub fn todo_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, user_id, content, due_date, status FROM todos WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id.as_i64()])?;
        match rows.next()? {
            Some(row) => Ok(Some(todo_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// The user's todos in insertion order, optionally restricted to the
    /// incomplete ones.
    pub fn todos_for_user(
        &self,
        owner: UserId,
        filter: TodoFilter,
    ) -> Result<Vec<Todo>, StoreError> {
        let mut sql =
            String::from("SELECT id, user_id, content, due_date, status FROM todos WHERE user_id = ?1");
        if filter.incomplete_only {
            sql.push_str(" AND status = 0");
        }
        sql.push_str(" ORDER BY id ASC");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let todos = stmt
            .query_map(params![owner.as_i64()], todo_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    /// Sets the status in either direction; content and due date unchanged.
    pub fn update_status(
        &self,
        caller: UserId,
        id: TodoId,
        status: TodoStatus,
    ) -> Result<Todo, StoreError> {
        let todo = self.owned_todo(caller, id)?;
        self.conn.execute(
            "UPDATE todos SET status = ?1 WHERE id = ?2",
            params![status.as_i64(), id.as_i64()],
        )?;
        Ok(Todo::new(todo.id, todo.user_id, todo.content, todo.due_date, status))
    }

    /// Permanent removal; there is no soft delete.
    pub fn delete_todo(&self, caller: UserId, id: TodoId) -> Result<(), StoreError> {
        let todo = self.owned_todo(caller, id)?;
        self.conn
            .execute("DELETE FROM todos WHERE id = ?1", params![todo.id.as_i64()])?;
        Ok(())
    }

    /// Removes every completed todo the caller owns; incomplete todos are
    /// preserved regardless of due date. Returns how many rows went away.
    pub fn delete_completed(&self, caller: UserId) -> Result<u64, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM todos WHERE user_id = ?1 AND status = ?2",
            params![caller.as_i64(), TodoStatus::Complete.as_i64()],
        )?;
        Ok(deleted as u64)
    }

    /// Count of the user's incomplete todos due exactly tomorrow.
    ///
    /// Runs the model predicate over the incomplete rows rather than a SQL
    /// string comparison, so a parseable-but-noncanonical due date like
    /// `2030-4-1` is classified the same way the detail view classifies it.
    pub fn count_near_due(&self, owner: UserId, today: NaiveDate) -> Result<u64, StoreError> {
        let incomplete = self.todos_for_user(
            owner,
            TodoFilter {
                incomplete_only: true,
            },
        )?;
        Ok(incomplete.iter().filter(|t| is_near_due(t, today)).count() as u64)
    }

    pub fn count_todos_for_user(&self, owner: UserId) -> Result<u64, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM todos WHERE user_id = ?1")?;
        let count: i64 = stmt.query_row(params![owner.as_i64()], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn owned_todo(&self, caller: UserId, id: TodoId) -> Result<Todo, StoreError> {
        let todo = self.todo_by_id(id)?.ok_or(StoreError::NotFound)?;
        if todo.user_id != caller {
            return Err(StoreError::NotOwner);
        }
        Ok(todo)
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> Result<User, StoreError> {
    let nickname_raw: String = row.get(2)?;
    let nickname = Nickname::parse(&nickname_raw)
        .map_err(|e| StoreError::Storage(format!("stored nickname rejected: {e}")))?;
    Ok(User::new(
        UserId::new(row.get(0)?),
        row.get(1)?,
        nickname,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn todo_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Todo> {
    let content_raw: String = row.get(2)?;
    let due_date_raw: String = row.get(3)?;
    let status_raw: i64 = row.get(4)?;
    let content = Content::parse(&content_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let due_date = DueDate::parse(&due_date_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let status = TodoStatus::from_i64(status_raw).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(4, status_raw)
    })?;
    Ok(Todo::new(
        TodoId::new(row.get(0)?),
        UserId::new(row.get(1)?),
        content,
        due_date,
        status,
    ))
}
