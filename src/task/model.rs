#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Document;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
}

impl TaskStatus {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" | "in-progress" | "inprogress" | "doing" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub owner: String,
    pub created_at: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl Task {
    #[must_use]
    pub fn new_id() -> String {
        let id = Uuid::new_v4().simple().to_string();
        id.chars().take(8).collect()
    }

    #[must_use]
    pub fn new(text: impl Into<String>, priority: Priority, owner: impl Into<String>) -> Self {
        Self {
            id: Self::new_id(),
            text: text.into(),
            priority,
            status: TaskStatus::Pending,
            owner: owner.into(),
            created_at: now_rfc3339(),
            start_time: None,
            end_time: None,
        }
    }

    /// Applies the next forward transition:
    /// Pending -> InProgress (stamps `start_time`),
    /// InProgress -> Done (stamps `end_time`, keeps `start_time`).
    /// Done stays Done. Returns whether anything changed.
    pub fn advance(&mut self, now: &str) -> bool {
        match self.status {
            TaskStatus::Pending => {
                self.status = TaskStatus::InProgress;
                self.start_time = Some(now.to_owned());
                self.end_time = None;
                true
            }
            TaskStatus::InProgress => {
                self.status = TaskStatus::Done;
                self.end_time = Some(now.to_owned());
                true
            }
            TaskStatus::Done => false,
        }
    }

    /// Done -> Pending, clearing both timestamps. Returns whether anything
    /// changed; only Done tasks can be reset.
    pub fn reset(&mut self) -> bool {
        if self.status != TaskStatus::Done {
            return false;
        }
        self.status = TaskStatus::Pending;
        self.start_time = None;
        self.end_time = None;
        true
    }
}

impl Document for Task {
    fn doc_id(&self) -> &str {
        &self.id
    }
}

#[must_use]
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_owned())
}

#[must_use]
pub fn now_time_of_day() -> String {
    let t = time::OffsetDateTime::now_utc();
    format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_pending_with_no_timestamps() {
        let t = Task::new("Write report", Priority::High, "Alexandre");
        assert_eq!(t.status, TaskStatus::Pending);
        assert!(t.start_time.is_none());
        assert!(t.end_time.is_none());
        assert!(!t.created_at.is_empty());
    }

    #[test]
    fn advance_from_pending_sets_start_only() {
        let mut t = Task::new("x", Priority::Low, "a");
        assert!(t.advance("09:00:00"));
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.start_time.as_deref(), Some("09:00:00"));
        assert!(t.end_time.is_none());
    }

    #[test]
    fn advance_twice_reaches_done_with_both_timestamps() {
        let mut t = Task::new("x", Priority::Medium, "a");
        assert!(t.advance("09:00:00"));
        assert!(t.advance("10:30:00"));
        assert_eq!(t.status, TaskStatus::Done);
        assert_eq!(t.start_time.as_deref(), Some("09:00:00"));
        assert_eq!(t.end_time.as_deref(), Some("10:30:00"));
    }

    #[test]
    fn advance_on_done_is_a_noop() {
        let mut t = Task::new("x", Priority::Low, "a");
        t.advance("09:00:00");
        t.advance("10:00:00");
        assert!(!t.advance("11:00:00"));
        assert_eq!(t.end_time.as_deref(), Some("10:00:00"));
    }

    #[test]
    fn reset_clears_timestamps_and_only_applies_to_done() {
        let mut t = Task::new("x", Priority::Low, "a");
        assert!(!t.reset());

        t.advance("09:00:00");
        assert!(!t.reset());

        t.advance("10:00:00");
        assert!(t.reset());
        assert_eq!(t.status, TaskStatus::Pending);
        assert!(t.start_time.is_none());
        assert!(t.end_time.is_none());
    }

    #[test]
    fn status_and_priority_parse_round_trip() {
        assert_eq!(TaskStatus::parse("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("Pending"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::parse("bogus"), None);
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse(""), None);
    }
}
