use focuswork::profile::ProfileDirectory;
use focuswork::session::SessionManager;
use focuswork::store::StoreClient;
use focuswork::task::directory::TaskDirectory;
use focuswork::task::filter::{self, StatusFilter};
use focuswork::task::model::{Priority, TaskStatus};

fn open(td: &tempfile::TempDir) -> (StoreClient, SessionManager) {
    let store = StoreClient::open(td.path(), "focuswork").expect("open store");
    let sessions = SessionManager::new();
    (store, sessions)
}

#[test]
fn empty_directory_bootstraps_the_two_default_profiles() {
    let td = tempfile::tempdir().expect("tempdir");
    let (store, _sessions) = open(&td);
    let profiles = ProfileDirectory::new(&store);

    let defaults = vec!["Alexandre".to_owned(), "Marta".to_owned()];
    assert!(profiles.bootstrap_defaults(&defaults).expect("bootstrap"));

    let names: Vec<String> = profiles.list().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["Alexandre".to_owned(), "Marta".to_owned()]);

    // A second observation of the (no longer empty) directory must not
    // insert again, even through a different client on the same data dir.
    let other = StoreClient::open(td.path(), "focuswork").expect("reopen store");
    let other_profiles = ProfileDirectory::new(&other);
    assert!(!other_profiles.bootstrap_defaults(&defaults).expect("bootstrap"));
    assert_eq!(other_profiles.list().len(), 2);
}

#[test]
fn created_task_appears_pending_in_the_owner_listing() {
    let td = tempfile::tempdir().expect("tempdir");
    let (store, sessions) = open(&td);
    sessions.begin(None).expect("session");
    let tasks = TaskDirectory::new(&store, sessions.subscribe());

    let created = tasks
        .create("Write report", Priority::High, "Alexandre")
        .expect("create")
        .expect("task");

    let listed = tasks.list("Alexandre");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[0].status, TaskStatus::Pending);
    assert_eq!(listed[0].priority, Priority::High);
    assert!(listed[0].start_time.is_none());
    assert!(listed[0].end_time.is_none());

    assert!(tasks.list("Marta").is_empty());
}

#[test]
fn advancing_twice_lands_on_done_with_both_timestamps() {
    let td = tempfile::tempdir().expect("tempdir");
    let (store, sessions) = open(&td);
    sessions.begin(None).expect("session");
    let tasks = TaskDirectory::new(&store, sessions.subscribe());

    let task = tasks
        .create("Ship it", Priority::Medium, "Marta")
        .expect("create")
        .expect("task");

    assert!(tasks.advance(&task.id).expect("start"));
    let started = tasks.get(&task.id).expect("get");
    assert_eq!(started.status, TaskStatus::InProgress);
    assert!(started.start_time.is_some());
    assert!(started.end_time.is_none());

    assert!(tasks.advance(&task.id).expect("finish"));
    let done = tasks.get(&task.id).expect("get");
    assert_eq!(done.status, TaskStatus::Done);
    assert!(done.start_time.is_some());
    assert!(done.end_time.is_some());
}

#[test]
fn blank_text_and_missing_session_leave_the_collection_unchanged() {
    let td = tempfile::tempdir().expect("tempdir");
    let (store, sessions) = open(&td);
    let tasks = TaskDirectory::new(&store, sessions.subscribe());

    // No session yet.
    assert!(tasks
        .create("Valid text", Priority::Low, "Alexandre")
        .expect("create")
        .is_none());

    sessions.begin(None).expect("session");
    assert!(tasks
        .create("   \t ", Priority::Low, "Alexandre")
        .expect("create")
        .is_none());

    assert!(store.tasks().list().is_empty());
}

#[test]
fn delete_of_a_nonexistent_id_does_not_error() {
    let td = tempfile::tempdir().expect("tempdir");
    let (store, sessions) = open(&td);
    let tasks = TaskDirectory::new(&store, sessions.subscribe());

    tasks.delete("no-such-task").expect("delete");
    tasks.delete("no-such-task").expect("delete again");
}

#[test]
fn status_filtering_composes_with_the_owner_listing() {
    let td = tempfile::tempdir().expect("tempdir");
    let (store, sessions) = open(&td);
    sessions.begin(None).expect("session");
    let tasks = TaskDirectory::new(&store, sessions.subscribe());

    let a = tasks.create("one", Priority::Low, "A").unwrap().unwrap();
    tasks.create("two", Priority::Low, "A").unwrap().unwrap();
    tasks.advance(&a.id).unwrap();

    let listed = tasks.list("A");
    assert_eq!(filter::apply_filter(&listed, StatusFilter::All), listed);
    assert_eq!(filter::apply_filter(&listed, StatusFilter::Pending).len(), 1);
    assert_eq!(
        filter::apply_filter(&listed, StatusFilter::InProgress).len(),
        1
    );
    assert!(filter::apply_filter(&listed, StatusFilter::Done).is_empty());
}

#[test]
fn second_client_sees_writes_after_refresh() {
    let td = tempfile::tempdir().expect("tempdir");
    let (store, sessions) = open(&td);
    sessions.begin(None).expect("session");
    let tasks = TaskDirectory::new(&store, sessions.subscribe());
    tasks.create("shared", Priority::Low, "A").unwrap().unwrap();

    let other = StoreClient::open(td.path(), "focuswork").expect("reopen");
    assert_eq!(other.tasks().list().len(), 1);

    tasks.create("later", Priority::Low, "A").unwrap().unwrap();
    assert_eq!(other.tasks().list().len(), 1);
    other.refresh().expect("refresh");
    assert_eq!(other.tasks().list().len(), 2);
}

#[tokio::test]
async fn owner_subscription_delivers_snapshots_in_creation_order() {
    let td = tempfile::tempdir().expect("tempdir");
    let (store, sessions) = open(&td);
    sessions.begin(None).expect("session");
    let tasks = TaskDirectory::new(&store, sessions.subscribe());

    let mut rx = tasks.subscribe("A");
    assert!(rx.borrow().is_empty());

    tasks.create("first", Priority::Low, "A").unwrap().unwrap();
    rx.changed().await.expect("changed");
    assert_eq!(rx.borrow_and_update().len(), 1);

    tasks.create("second", Priority::Low, "A").unwrap().unwrap();
    rx.changed().await.expect("changed");
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.len(), 2);
    // Newest first; equal timestamps fall back to snapshot order, which
    // still lists both.
    let texts: Vec<&str> = snapshot.iter().map(|t| t.text.as_str()).collect();
    assert!(texts.contains(&"first") && texts.contains(&"second"));
}
