//! Persisted favorites set.
//!
//! The in-memory list is authoritative for the session. Every toggle writes
//! the whole ordered list back under [`FAVORITES_KEY`]; write failures are
//! logged and otherwise ignored.
use std::collections::{BTreeSet, HashSet};

use crate::model::{Category, Fact};
use crate::storage::{Database, StorageError, FAVORITES_KEY};

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

#[derive(Debug)]
pub struct FavoritesStore {
    db: Option<Database>,
    items: Vec<Fact>,
    ids: HashSet<String>,
}

impl FavoritesStore {
    /// A store that never persists. Used when the database could not be opened.
    pub fn detached() -> Self {
        Self {
            db: None,
            items: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Load the persisted list. Absent, unreadable or corrupt data yields an
    /// empty store.
    pub async fn hydrate(db: Database) -> Self {
        let items = match db.get_json::<Vec<Fact>>(FAVORITES_KEY).await {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(StorageError::Corrupt(e)) => {
                tracing::warn!(error = %e, "Stored favorites are corrupt, starting empty");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read favorites, starting empty");
                Vec::new()
            }
        };

        let mut store = Self {
            db: Some(db),
            items: Vec::with_capacity(items.len()),
            ids: HashSet::new(),
        };
        for fact in items {
            if store.ids.insert(fact.id.clone()) {
                store.items.push(fact);
            }
        }
        tracing::debug!(count = store.items.len(), "Favorites hydrated");
        store
    }

    /// Remove the fact if saved, otherwise append it. The new list is
    /// persisted before returning.
    pub async fn toggle(&mut self, fact: &Fact) -> Toggled {
        let outcome = if self.ids.remove(&fact.id) {
            self.items.retain(|f| f.id != fact.id);
            Toggled::Removed
        } else {
            self.ids.insert(fact.id.clone());
            self.items.push(fact.clone());
            Toggled::Added
        };
        self.persist().await;
        outcome
    }

    async fn persist(&self) {
        let Some(db) = &self.db else {
            return;
        };
        if let Err(e) = db.set_json(FAVORITES_KEY, &self.items).await {
            tracing::warn!(error = %e, count = self.items.len(), "Failed to persist favorites");
        }
    }

    pub fn has(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Saved facts in the order they were added.
    pub fn list(&self) -> &[Fact] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Fact> {
        self.items.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct categories among the saved facts, in declaration order.
    pub fn categories(&self) -> Vec<Category> {
        self.items
            .iter()
            .map(|f| f.category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fact(id: &str, category: Category) -> Fact {
        Fact {
            id: id.to_string(),
            title: format!("Fact {id}"),
            summary: "summary".to_string(),
            details: "details".to_string(),
            category,
            video_url: String::new(),
            image_url: None,
        }
    }

    fn ids(store: &FavoritesStore) -> Vec<&str> {
        store.list().iter().map(|f| f.id.as_str()).collect()
    }

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_hydrate_empty_database() {
        let store = FavoritesStore::hydrate(test_db().await).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let mut store = FavoritesStore::hydrate(test_db().await).await;
        let a = fact("a", Category::Ghost);

        assert_eq!(store.toggle(&a).await, Toggled::Added);
        assert!(store.has("a"));
        assert_eq!(store.toggle(&a).await, Toggled::Removed);
        assert!(!store.has("a"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_preserves_insertion_order() {
        let mut store = FavoritesStore::hydrate(test_db().await).await;
        store.toggle(&fact("a", Category::Ghost)).await;
        store.toggle(&fact("b", Category::Ufo)).await;
        store.toggle(&fact("c", Category::Ghost)).await;
        store.toggle(&fact("b", Category::Ufo)).await;
        assert_eq!(ids(&store), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_toggle_persists_and_rehydrates() {
        let db = test_db().await;
        let mut store = FavoritesStore::hydrate(db.clone()).await;
        store.toggle(&fact("a", Category::Ghost)).await;
        store.toggle(&fact("b", Category::Fantome)).await;

        let reloaded = FavoritesStore::hydrate(db).await;
        assert_eq!(ids(&reloaded), vec!["a", "b"]);
        assert_eq!(reloaded.list()[1].category, Category::Fantome);
    }

    #[tokio::test]
    async fn test_corrupt_blob_hydrates_empty() {
        let db = test_db().await;
        db.set_raw(FAVORITES_KEY, "[{\"id\": 1").await.unwrap();
        let store = FavoritesStore::hydrate(db).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_in_blob_collapse() {
        let db = test_db().await;
        let dup = vec![fact("a", Category::Ghost), fact("a", Category::Ghost)];
        db.set_json(FAVORITES_KEY, &dup).await.unwrap();
        let store = FavoritesStore::hydrate(db).await;
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_storage_keeps_memory_state() {
        let db = test_db().await;
        let mut store = FavoritesStore::hydrate(db.clone()).await;
        db.close().await;

        assert_eq!(store.toggle(&fact("a", Category::Ghost)).await, Toggled::Added);
        assert!(store.has("a"));
    }

    #[tokio::test]
    async fn test_hydrate_from_closed_database_is_empty() {
        let db = test_db().await;
        db.close().await;
        let store = FavoritesStore::hydrate(db).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_categories_are_distinct_and_sorted() {
        let mut store = FavoritesStore::detached();
        store.toggle(&fact("a", Category::Ufo)).await;
        store.toggle(&fact("b", Category::Ghost)).await;
        store.toggle(&fact("c", Category::Ufo)).await;
        assert_eq!(store.categories(), vec![Category::Ghost, Category::Ufo]);
    }
}
