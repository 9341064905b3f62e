// SPDX-License-Identifier: Apache-2.0

//! Due-date classification.
//!
//! Derived on every evaluation, never stored. Completion status and deadline
//! state are independent axes: a completed todo can still be overdue.

use crate::todo::{DueDate, Todo, TodoStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    WithinDeadline,
    Overdue,
}

impl DueStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WithinDeadline => "within_deadline",
            Self::Overdue => "overdue",
        }
    }
}

/// A due date on or after `today` is within deadline; everything else,
/// including a raw string that is not a calendar date, is overdue.
#[must_use]
pub fn evaluate_deadline(due_date: &DueDate, today: NaiveDate) -> DueStatus {
    match due_date.calendar_date() {
        Some(due) if due >= today => DueStatus::WithinDeadline,
        _ => DueStatus::Overdue,
    }
}

/// Near-due: incomplete and due exactly tomorrow.
#[must_use]
pub fn is_near_due(todo: &Todo, today: NaiveDate) -> bool {
    if todo.status != TodoStatus::Incomplete {
        return false;
    }
    match (todo.due_date.calendar_date(), today.succ_opt()) {
        (Some(due), Some(tomorrow)) => due == tomorrow,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::{Content, TodoId};
    use crate::user::UserId;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("test date")
    }

    fn todo(due_date: &str, status: TodoStatus) -> Todo {
        Todo::new(
            TodoId::new(1),
            UserId::new(1),
            Content::parse("walk the dog").expect("content"),
            DueDate::parse(due_date).expect("due date"),
            status,
        )
    }

    #[test]
    fn due_on_or_after_today_is_within_deadline() {
        let due = DueDate::parse("2030-04-01").expect("due date");
        assert_eq!(
            evaluate_deadline(&due, date("2030-03-31")),
            DueStatus::WithinDeadline
        );
        assert_eq!(
            evaluate_deadline(&due, date("2030-04-01")),
            DueStatus::WithinDeadline
        );
        assert_eq!(
            evaluate_deadline(&due, date("2030-04-02")),
            DueStatus::Overdue
        );
    }

    #[test]
    fn unparseable_due_date_is_overdue() {
        let due = DueDate::parse("0401-20-30").expect("stored as given");
        assert_eq!(evaluate_deadline(&due, date("2020-01-01")), DueStatus::Overdue);
    }

    #[test]
    fn near_due_requires_incomplete_and_exactly_tomorrow() {
        let today = date("2030-06-15");
        assert!(is_near_due(&todo("2030-06-16", TodoStatus::Incomplete), today));
        assert!(!is_near_due(&todo("2030-06-16", TodoStatus::Complete), today));
        assert!(!is_near_due(&todo("2030-06-15", TodoStatus::Incomplete), today));
        assert!(!is_near_due(&todo("2030-06-17", TodoStatus::Incomplete), today));
        assert!(!is_near_due(&todo("0401-20-30", TodoStatus::Incomplete), today));
    }

    #[test]
    fn completion_and_deadline_are_independent() {
        let done_late = todo("2020-01-01", TodoStatus::Complete);
        assert_eq!(
            evaluate_deadline(&done_late.due_date, date("2030-01-01")),
            DueStatus::Overdue
        );
        assert_eq!(done_late.status, TodoStatus::Complete);
    }
}
