#![forbid(unsafe_code)]

use tokio::sync::watch;

use crate::session::SessionId;
use crate::store::{Collection, StoreClient};
use crate::task::model::{Priority, Task, now_time_of_day};

/// Task operations plus the owner-scoped live listing. Reads are driven by
/// store snapshots; nothing here keeps local copies of task state.
#[derive(Debug, Clone)]
pub struct TaskDirectory {
    col: Collection<Task>,
    session: watch::Receiver<Option<SessionId>>,
}

impl TaskDirectory {
    #[must_use]
    pub fn new(store: &StoreClient, session: watch::Receiver<Option<SessionId>>) -> Self {
        Self {
            col: store.tasks().clone(),
            session,
        }
    }

    /// Creates a Pending task owned by `owner`. Blank text or a missing
    /// session make this a logged no-op, mirroring the silent-ignore input
    /// policy of the composer.
    pub fn create(
        &self,
        text: &str,
        priority: Priority,
        owner: &str,
    ) -> anyhow::Result<Option<Task>> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("ignoring task with blank text");
            return Ok(None);
        }
        if self.session.borrow().is_none() {
            tracing::debug!("ignoring task creation without an active session");
            return Ok(None);
        }
        let task = Task::new(text, priority, owner);
        self.col.add(task.clone())?;
        Ok(Some(task))
    }

    /// Unconditional delete; missing ids are fine at this layer.
    pub fn delete(&self, id: &str) -> anyhow::Result<()> {
        self.col.delete(id)
    }

    /// Applies the next forward transition to the stored task. Returns
    /// whether the status actually moved.
    pub fn advance(&self, id: &str) -> anyhow::Result<bool> {
        let now = now_time_of_day();
        let mut moved = false;
        let touched = self.col.update(id, |t| moved = t.advance(&now))?;
        Ok(touched && moved)
    }

    /// Done -> Pending with timestamps cleared.
    pub fn reset(&self, id: &str) -> anyhow::Result<bool> {
        let mut moved = false;
        let touched = self.col.update(id, |t| moved = t.reset())?;
        Ok(touched && moved)
    }

    #[must_use]
    pub fn list(&self, owner: &str) -> Vec<Task> {
        order_for_owner(&self.col.list(), owner)
    }

    #[must_use]
    pub fn list_all(&self) -> Vec<Task> {
        let mut tasks = self.col.list();
        sort_newest_first(&mut tasks);
        tasks
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Task> {
        self.col.list().into_iter().find(|t| t.id == id)
    }

    /// Live owner-scoped listing: a fan-out task maps every raw collection
    /// snapshot through the owner filter and newest-first sort, then
    /// republishes on a derived channel. Ends when either side goes away.
    #[must_use]
    pub fn subscribe(&self, owner: &str) -> watch::Receiver<Vec<Task>> {
        let owner = owner.to_owned();
        let mut raw = self.col.subscribe();
        let initial = order_for_owner(&raw.borrow_and_update(), &owner);
        let (tx, rx) = watch::channel(initial);
        tokio::spawn(async move {
            while raw.changed().await.is_ok() {
                let snapshot = order_for_owner(&raw.borrow_and_update(), &owner);
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
        });
        rx
    }
}

fn order_for_owner(tasks: &[Task], owner: &str) -> Vec<Task> {
    let mut out: Vec<Task> = tasks.iter().filter(|t| t.owner == owner).cloned().collect();
    sort_newest_first(&mut out);
    out
}

fn sort_newest_first(tasks: &mut [Task]) {
    // RFC3339 UTC stamps compare chronologically as strings; sort_by is
    // stable, so equal stamps keep snapshot order.
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionManager;
    use crate::store::StoreClient;
    use crate::task::model::TaskStatus;

    fn setup(td: &tempfile::TempDir) -> (SessionManager, TaskDirectory) {
        let store = StoreClient::open(td.path(), "focuswork").expect("open store");
        let sessions = SessionManager::new();
        let dir = TaskDirectory::new(&store, sessions.subscribe());
        (sessions, dir)
    }

    #[test]
    fn create_requires_session_and_text() {
        let td = tempfile::tempdir().expect("tempdir");
        let (sessions, dir) = setup(&td);

        assert!(dir.create("Write report", Priority::High, "Alexandre").unwrap().is_none());

        sessions.begin(None).unwrap();
        assert!(dir.create("   ", Priority::High, "Alexandre").unwrap().is_none());
        assert!(dir.list("Alexandre").is_empty());

        let task = dir
            .create("Write report", Priority::High, "Alexandre")
            .unwrap()
            .expect("created");
        assert_eq!(task.status, TaskStatus::Pending);

        let listed = dir.list("Alexandre");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "Write report");
    }

    #[test]
    fn list_filters_by_owner_and_sorts_newest_first() {
        let td = tempfile::tempdir().expect("tempdir");
        let (sessions, dir) = setup(&td);
        sessions.begin(None).unwrap();

        let mut a = Task::new("old", Priority::Low, "Alexandre");
        a.created_at = "2026-08-01T08:00:00Z".to_owned();
        let mut b = Task::new("new", Priority::Low, "Alexandre");
        b.created_at = "2026-08-02T08:00:00Z".to_owned();
        let mut other = Task::new("hers", Priority::Low, "Marta");
        other.created_at = "2026-08-03T08:00:00Z".to_owned();
        for t in [&a, &b, &other] {
            dir.col.add((*t).clone()).unwrap();
        }

        let listed = dir.list("Alexandre");
        assert_eq!(
            listed.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["new", "old"]
        );

        // Unchanged collection: repeated snapshots keep the same order.
        assert_eq!(dir.list("Alexandre"), listed);
    }

    #[test]
    fn advance_and_reset_update_the_stored_task() {
        let td = tempfile::tempdir().expect("tempdir");
        let (sessions, dir) = setup(&td);
        sessions.begin(None).unwrap();

        let task = dir.create("x", Priority::Low, "a").unwrap().expect("created");

        assert!(dir.advance(&task.id).unwrap());
        assert_eq!(dir.get(&task.id).unwrap().status, TaskStatus::InProgress);

        assert!(dir.advance(&task.id).unwrap());
        let done = dir.get(&task.id).unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert!(done.start_time.is_some());
        assert!(done.end_time.is_some());

        // Done is as far as advance goes.
        assert!(!dir.advance(&task.id).unwrap());

        assert!(dir.reset(&task.id).unwrap());
        let back = dir.get(&task.id).unwrap();
        assert_eq!(back.status, TaskStatus::Pending);
        assert!(back.start_time.is_none());
        assert!(back.end_time.is_none());
    }

    #[test]
    fn delete_missing_id_is_ok() {
        let td = tempfile::tempdir().expect("tempdir");
        let (_sessions, dir) = setup(&td);
        dir.delete("does-not-exist").unwrap();
    }

    #[tokio::test]
    async fn subscription_tracks_owner_changes() {
        let td = tempfile::tempdir().expect("tempdir");
        let (sessions, dir) = setup(&td);
        sessions.begin(None).unwrap();

        let mut rx = dir.subscribe("Alexandre");
        assert!(rx.borrow().is_empty());

        dir.create("mine", Priority::Low, "Alexandre").unwrap();
        dir.create("hers", Priority::Low, "Marta").unwrap();

        rx.changed().await.unwrap();
        // Drain to the latest snapshot; both writes may have coalesced.
        let seen: Vec<String> = rx
            .borrow_and_update()
            .iter()
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(seen, vec!["mine".to_owned()]);
    }
}
