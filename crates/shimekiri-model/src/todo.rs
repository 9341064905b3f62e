// SPDX-License-Identifier: Apache-2.0

use crate::user::UserId;
use crate::validate::ParseError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const CONTENT_MAX_LEN: usize = 1000;
pub const DUE_DATE_MAX_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Incomplete,
    Complete,
}

impl TodoStatus {
    /// Accepts the wire forms the status arrives in: the numeric form the
    /// update form posts and the snake_case name.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "0" | "incomplete" => Ok(Self::Incomplete),
            "1" | "complete" => Ok(Self::Complete),
            _ => Err(ParseError::InvalidFormat(
                "status must be one of '0', '1', 'incomplete', 'complete'",
            )),
        }
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Incomplete => 0,
            Self::Complete => 1,
        }
    }

    #[must_use]
    pub const fn from_i64(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Self::Incomplete),
            1 => Some(Self::Complete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct Content(String);

impl Content {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.trim().is_empty() {
            return Err(ParseError::Empty("content"));
        }
        if input.len() > CONTENT_MAX_LEN {
            return Err(ParseError::TooLong("content", CONTENT_MAX_LEN));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Calendar due date, stored exactly as submitted.
///
/// The raw form is deliberately not forced into `%Y-%m-%d`: the application
/// accepts and renders malformed dates as given. [`DueDate::calendar_date`]
/// is the one place the string is interpreted as a date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct DueDate(String);

impl DueDate {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("due_date"));
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed("due_date"));
        }
        if input.len() > DUE_DATE_MAX_LEN {
            return Err(ParseError::TooLong("due_date", DUE_DATE_MAX_LEN));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The due date as a calendar date, when the raw string is one.
    #[must_use]
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct Todo {
    pub id: TodoId,
    pub user_id: UserId,
    pub content: Content,
    pub due_date: DueDate,
    pub status: TodoStatus,
}

impl Todo {
    #[must_use]
    pub fn new(
        id: TodoId,
        user_id: UserId,
        content: Content,
        due_date: DueDate,
        status: TodoStatus,
    ) -> Self {
        Self {
            id,
            user_id,
            content,
            due_date,
            status,
        }
    }
}
