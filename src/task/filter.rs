#![forbid(unsafe_code)]

use crate::task::model::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    InProgress,
    Done,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::InProgress,
        StatusFilter::Done,
    ];

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let f = s.trim().to_lowercase();
        if f.is_empty() || f == "all" {
            return Some(Self::All);
        }
        TaskStatus::parse(&f).map(Self::from)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            Self::All => true,
            Self::Pending => status == TaskStatus::Pending,
            Self::InProgress => status == TaskStatus::InProgress,
            Self::Done => status == TaskStatus::Done,
        }
    }
}

impl From<TaskStatus> for StatusFilter {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => Self::Pending,
            TaskStatus::InProgress => Self::InProgress,
            TaskStatus::Done => Self::Done,
        }
    }
}

/// Pure status filter: identity for `All`, exact match otherwise. Keeps
/// the input order.
#[must_use]
pub fn apply_filter(tasks: &[Task], filter: StatusFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| filter.matches(t.status))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
}

/// Recomputed from the owner-filtered list on every render, not
/// incrementally maintained.
#[must_use]
pub fn stats(tasks: &[Task]) -> TaskStats {
    let mut s = TaskStats::default();
    for t in tasks {
        match t.status {
            TaskStatus::Pending => s.pending += 1,
            TaskStatus::InProgress => s.in_progress += 1,
            TaskStatus::Done => s.done += 1,
        }
    }
    s
}
