#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::store::{Collection, Document, StoreClient};

/// A named identity selectable on the start screen. Profiles are created
/// and never mutated; there is no delete path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub name: String,
}

impl Profile {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string().chars().take(8).collect(),
            name: name.into(),
        }
    }
}

impl Document for Profile {
    fn doc_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone)]
pub struct ProfileDirectory {
    col: Collection<Profile>,
}

impl ProfileDirectory {
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            col: store.profiles().clone(),
        }
    }

    /// Current profiles, name ascending.
    #[must_use]
    pub fn list(&self) -> Vec<Profile> {
        let mut profiles = self.col.list();
        sort_by_name(&mut profiles);
        profiles
    }

    /// Appends a profile. A name that trims to empty is a logged no-op;
    /// duplicates are not checked.
    pub fn create(&self, name: &str) -> anyhow::Result<Option<Profile>> {
        let name = name.trim();
        if name.is_empty() {
            tracing::debug!("ignoring profile with blank name");
            return Ok(None);
        }
        let profile = Profile::new(name);
        self.col.add(profile.clone())?;
        Ok(Some(profile))
    }

    /// Seeds the default profiles, but only if the collection is empty at
    /// the moment of the conditional write. Returns whether it inserted.
    pub fn bootstrap_defaults(&self, names: &[String]) -> anyhow::Result<bool> {
        let defaults: Vec<Profile> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(Profile::new)
            .collect();
        if defaults.is_empty() {
            return Ok(false);
        }
        self.col.insert_if_empty(defaults)
    }

    /// Live sorted listing via a fan-out task over the raw collection
    /// snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Profile>> {
        let mut raw = self.col.subscribe();
        let mut initial = raw.borrow_and_update().clone();
        sort_by_name(&mut initial);
        let (tx, rx) = watch::channel(initial);
        tokio::spawn(async move {
            while raw.changed().await.is_ok() {
                let mut snapshot = raw.borrow_and_update().clone();
                sort_by_name(&mut snapshot);
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
        });
        rx
    }
}

fn sort_by_name(profiles: &mut [Profile]) {
    profiles.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(td: &tempfile::TempDir) -> ProfileDirectory {
        let store = StoreClient::open(td.path(), "focuswork").expect("open store");
        ProfileDirectory::new(&store)
    }

    fn names(profiles: &[Profile]) -> Vec<&str> {
        profiles.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn bootstrap_seeds_defaults_exactly_once() {
        let td = tempfile::tempdir().expect("tempdir");
        let d = dir(&td);
        let defaults = vec!["Alexandre".to_owned(), "Marta".to_owned()];

        assert!(d.bootstrap_defaults(&defaults).unwrap());
        assert_eq!(names(&d.list()), vec!["Alexandre", "Marta"]);

        // A second empty-observation must not double-insert.
        assert!(!d.bootstrap_defaults(&defaults).unwrap());
        assert_eq!(d.list().len(), 2);
    }

    #[test]
    fn create_trims_and_ignores_blank_names() {
        let td = tempfile::tempdir().expect("tempdir");
        let d = dir(&td);

        assert!(d.create("  ").unwrap().is_none());
        assert!(d.list().is_empty());

        let p = d.create("  Rui ").unwrap().expect("created");
        assert_eq!(p.name, "Rui");
    }

    #[test]
    fn list_is_sorted_by_name() {
        let td = tempfile::tempdir().expect("tempdir");
        let d = dir(&td);
        d.create("Marta").unwrap();
        d.create("Alexandre").unwrap();
        d.create("Rui").unwrap();
        assert_eq!(names(&d.list()), vec!["Alexandre", "Marta", "Rui"]);
    }

    #[tokio::test]
    async fn subscription_republishes_sorted_snapshots() {
        let td = tempfile::tempdir().expect("tempdir");
        let d = dir(&td);
        d.create("Marta").unwrap();

        let mut rx = d.subscribe();
        assert_eq!(names(&rx.borrow()), vec!["Marta"]);

        d.create("Alexandre").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(names(&rx.borrow_and_update()), vec!["Alexandre", "Marta"]);
    }
}
