#![forbid(unsafe_code)]

pub mod collection;

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::FocusworkError;
use crate::profile::Profile;
use crate::task::model::Task;

pub use collection::{Collection, Document};

/// Client handle for the document store. Holds one typed collection per
/// logical collection; subscriptions stay alive as long as any handle to
/// the collection does.
#[derive(Debug, Clone)]
pub struct StoreClient {
    root: PathBuf,
    profiles: Collection<Profile>,
    tasks: Collection<Task>,
}

impl StoreClient {
    pub fn open(data_dir: &Path, namespace: &str) -> anyhow::Result<Self> {
        validate_namespace(namespace)?;
        let root = data_dir.join(namespace);
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create store root {}", root.display()))?;

        let profiles = Collection::open("profiles", root.join("profiles"))?;
        let tasks = Collection::open("tasks", root.join("tasks"))?;

        Ok(Self {
            root,
            profiles,
            tasks,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn profiles(&self) -> &Collection<Profile> {
        &self.profiles
    }

    #[must_use]
    pub fn tasks(&self) -> &Collection<Task> {
        &self.tasks
    }

    /// Re-scan both collections from disk so documents written by other
    /// processes sharing the data directory become visible.
    pub fn refresh(&self) -> anyhow::Result<()> {
        self.profiles.refresh()?;
        self.tasks.refresh()
    }

    /// Drops this handle. Subscription channels close once the last clone
    /// of each collection handle is gone.
    pub fn close(self) {}
}

fn validate_namespace(namespace: &str) -> anyhow::Result<()> {
    if namespace.trim().is_empty() {
        anyhow::bail!("store namespace is required");
    }
    if namespace.contains('/') || namespace.contains('\\') || namespace.contains("..") {
        return Err(FocusworkError::Config(format!(
            "invalid store namespace '{namespace}': must not contain path separators or '..'"
        ))
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_bad_namespace() {
        let td = tempfile::tempdir().expect("tempdir");
        assert!(StoreClient::open(td.path(), "").is_err());
        assert!(StoreClient::open(td.path(), "a/b").is_err());
        assert!(StoreClient::open(td.path(), "..").is_err());
    }

    #[test]
    fn open_creates_collection_dirs() {
        let td = tempfile::tempdir().expect("tempdir");
        let store = StoreClient::open(td.path(), "focuswork").unwrap();
        assert!(store.root().join("profiles").is_dir());
        assert!(store.root().join("tasks").is_dir());
    }
}
