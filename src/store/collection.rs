#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use anyhow::Context as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::error::FocusworkError;

/// A document stored in a collection. The id is part of the document and
/// doubles as its file name.
pub trait Document:
    Clone + PartialEq + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn doc_id(&self) -> &str;
}

/// One named collection of documents, persisted as one JSON file per
/// document. Every mutation republishes the full collection snapshot on a
/// watch channel, so subscribers always see complete contents, never diffs.
#[derive(Debug, Clone)]
pub struct Collection<T: Document> {
    name: &'static str,
    dir: PathBuf,
    state: Arc<Mutex<Vec<T>>>,
    tx: Arc<watch::Sender<Vec<T>>>,
}

impl<T: Document> Collection<T> {
    pub fn open(name: &'static str, dir: PathBuf) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create collection dir {}", dir.display()))?;
        let docs = scan(&dir)?;
        let (tx, _rx) = watch::channel(docs.clone());
        Ok(Self {
            name,
            dir,
            state: Arc::new(Mutex::new(docs)),
            tx: Arc::new(tx),
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn add(&self, doc: T) -> anyhow::Result<()> {
        let path = self.doc_path(doc.doc_id())?;
        let mut docs = self.lock();
        write_doc(&path, &doc)?;
        if let Some(existing) = docs.iter_mut().find(|d| d.doc_id() == doc.doc_id()) {
            tracing::warn!(collection = self.name, id = doc.doc_id(), "add replaced an existing document");
            *existing = doc;
        } else {
            docs.push(doc);
        }
        self.publish(&docs);
        Ok(())
    }

    /// Read-modify-write of a single document. Updating a missing id is a
    /// logged no-op; returns whether a document was touched.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut T)) -> anyhow::Result<bool> {
        let path = self.doc_path(id)?;
        let mut docs = self.lock();
        let Some(doc) = docs.iter_mut().find(|d| d.doc_id() == id) else {
            tracing::warn!(collection = self.name, id, "update on missing document");
            return Ok(false);
        };
        f(doc);
        write_doc(&path, doc)?;
        self.publish(&docs);
        Ok(true)
    }

    /// Unconditional delete by id. Deleting an absent document is not an
    /// error; a failed unlink of a present file is the store's problem.
    pub fn delete(&self, id: &str) -> anyhow::Result<()> {
        let path = self.doc_path(id)?;
        let mut docs = self.lock();
        let _ = std::fs::remove_file(path);
        let before = docs.len();
        docs.retain(|d| d.doc_id() != id);
        if docs.len() != before {
            self.publish(&docs);
        }
        Ok(())
    }

    /// Conditional write: inserts `docs` only if the collection is empty,
    /// checked and applied under the collection lock.
    pub fn insert_if_empty(&self, docs: Vec<T>) -> anyhow::Result<bool> {
        let mut state = self.lock();
        if !state.is_empty() {
            return Ok(false);
        }
        for doc in &docs {
            let path = self.doc_path(doc.doc_id())?;
            write_doc(&path, doc)?;
        }
        state.extend(docs);
        self.publish(&state);
        Ok(true)
    }

    #[must_use]
    pub fn list(&self) -> Vec<T> {
        self.lock().clone()
    }

    /// Full-snapshot subscription. The receiver holds the current snapshot
    /// immediately and observes a fresh snapshot after every mutation. The
    /// channel closes when the last collection handle drops.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.tx.subscribe()
    }

    /// Re-scan the directory and republish if the on-disk contents differ
    /// from the in-memory snapshot.
    pub fn refresh(&self) -> anyhow::Result<()> {
        let next = scan(&self.dir)?;
        let mut state = self.lock();
        if *state != next {
            *state = next;
            self.publish(&state);
        }
        Ok(())
    }

    fn publish(&self, docs: &[T]) {
        // No subscribers is fine.
        let _ = self.tx.send(docs.to_vec());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn doc_path(&self, id: &str) -> anyhow::Result<PathBuf> {
        validate_doc_id(id)?;
        Ok(self.dir.join(format!("{id}.json")))
    }
}

fn write_doc<T: Document>(path: &Path, doc: &T) -> anyhow::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(doc)?;
    std::fs::write(&tmp, &data).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

fn scan<T: Document>(dir: &Path) -> anyhow::Result<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let mtime = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        entries.push((mtime, path));
    }
    // Oldest first, so the snapshot keeps insertion order across reloads.
    entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut docs: Vec<T> = Vec::with_capacity(entries.len());
    for (_, path) in entries {
        let Ok(data) = std::fs::read(&path) else {
            continue;
        };
        let Ok(doc) = serde_json::from_slice(&data) else {
            tracing::warn!(path = %path.display(), "skipping unparseable document");
            continue;
        };
        docs.push(doc);
    }
    Ok(docs)
}

fn validate_doc_id(id: &str) -> anyhow::Result<()> {
    if id.trim().is_empty() {
        anyhow::bail!("document id is required");
    }
    if id.contains('/') || id.contains('\\') || id.contains("..") {
        return Err(FocusworkError::InvalidDocumentId(id.to_owned()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
    }

    impl Document for Note {
        fn doc_id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, body: &str) -> Note {
        Note {
            id: id.to_owned(),
            body: body.to_owned(),
        }
    }

    fn open(dir: &Path) -> Collection<Note> {
        Collection::open("notes", dir.join("notes")).expect("open collection")
    }

    #[test]
    fn add_update_delete_round_trip() {
        let td = tempfile::tempdir().expect("tempdir");
        let col = open(td.path());

        col.add(note("a", "first")).unwrap();
        col.add(note("b", "second")).unwrap();
        assert_eq!(col.list().len(), 2);

        let touched = col.update("a", |n| n.body = "edited".to_owned()).unwrap();
        assert!(touched);
        assert_eq!(col.list()[0].body, "edited");

        col.delete("a").unwrap();
        assert_eq!(col.list().len(), 1);
        assert_eq!(col.list()[0].id, "b");
    }

    #[test]
    fn delete_missing_is_ok() {
        let td = tempfile::tempdir().expect("tempdir");
        let col = open(td.path());
        col.delete("nope").unwrap();
        col.delete("nope").unwrap();
    }

    #[test]
    fn update_missing_is_noop() {
        let td = tempfile::tempdir().expect("tempdir");
        let col = open(td.path());
        let touched = col.update("nope", |n| n.body.clear()).unwrap();
        assert!(!touched);
    }

    #[test]
    fn insert_if_empty_only_fires_once() {
        let td = tempfile::tempdir().expect("tempdir");
        let col = open(td.path());

        assert!(col.insert_if_empty(vec![note("a", ""), note("b", "")]).unwrap());
        assert!(!col.insert_if_empty(vec![note("c", "")]).unwrap());
        assert_eq!(col.list().len(), 2);
    }

    #[test]
    fn rejects_path_traversal_ids() {
        let td = tempfile::tempdir().expect("tempdir");
        let col = open(td.path());
        assert!(col.add(note("../evil", "")).is_err());
        assert!(col.add(note("", "")).is_err());
    }

    #[test]
    fn subscribe_sees_current_snapshot_then_changes() {
        let td = tempfile::tempdir().expect("tempdir");
        let col = open(td.path());
        col.add(note("a", "")).unwrap();

        let rx = col.subscribe();
        assert_eq!(rx.borrow().len(), 1);

        col.add(note("b", "")).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow().len(), 2);
    }

    #[test]
    fn reopen_reads_persisted_documents() {
        let td = tempfile::tempdir().expect("tempdir");
        {
            let col = open(td.path());
            col.add(note("a", "kept")).unwrap();
        }
        let col = open(td.path());
        assert_eq!(col.list(), vec![note("a", "kept")]);
    }

    #[test]
    fn refresh_picks_up_external_writes() {
        let td = tempfile::tempdir().expect("tempdir");
        let col = open(td.path());
        let other = open(td.path());

        other.add(note("x", "from elsewhere")).unwrap();
        assert!(col.list().is_empty());

        col.refresh().unwrap();
        assert_eq!(col.list().len(), 1);
    }
}
