//! Saved listing searches.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

use super::list::{BoundedList, ListItem, ListShape, Subscription};
use super::storage::KeyValueStorage;

/// A named search the visitor can re-run.
///
/// Stored records need a string `id` and `queryString`; other fields fall
/// back to defaults when missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: String,
    #[serde(default, deserialize_with = "or_default")]
    pub name: String,
    pub query_string: String,
    #[serde(default, deserialize_with = "or_default")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Any JSON value; the default when it does not decode as `T`.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl SavedSearch {
    /// A new search created now.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, query_string: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            query_string: query_string.into(),
            created_at: Utc::now(),
            last_run_at: None,
        }
    }
}

impl ListItem for SavedSearch {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Saved searches, newest first.
pub struct SavedSearches {
    list: BoundedList<SavedSearch>,
}

impl SavedSearches {
    pub const SHAPE: ListShape = ListShape {
        storage_key: "hrtaj:savedSearches:v1",
        cap: 100,
    };

    pub fn new(storage: Rc<dyn KeyValueStorage>) -> Self {
        Self {
            list: BoundedList::new(Self::SHAPE, storage),
        }
    }

    #[must_use]
    pub fn get(&self) -> Vec<SavedSearch> {
        self.list.get()
    }

    pub fn set(&self, items: Vec<SavedSearch>) -> Vec<SavedSearch> {
        self.list.set(items)
    }

    /// Prepend `item`. An existing record with the same ID is replaced.
    pub fn add(&self, item: SavedSearch) -> Vec<SavedSearch> {
        let mut items = self.list.get();
        items.insert(0, item);
        self.list.set(items)
    }

    /// Remove the record whose ID is exactly `id`.
    pub fn remove(&self, id: &str) -> Vec<SavedSearch> {
        let mut items = self.list.get();
        items.retain(|item| item.id != id);
        self.list.set(items)
    }

    /// Stamp `lastRunAt` on the record `id` with the current time.
    pub fn mark_run(&self, id: &str) -> Vec<SavedSearch> {
        self.mark_run_at(id, Utc::now())
    }

    /// Stamp `lastRunAt` on the record `id` with `at`.
    pub fn mark_run_at(&self, id: &str, at: DateTime<Utc>) -> Vec<SavedSearch> {
        let items = self
            .list
            .get()
            .into_iter()
            .map(|mut item| {
                if item.id == id {
                    item.last_run_at = Some(at);
                }
                item
            })
            .collect();
        self.list.set(items)
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&[SavedSearch]) + 'static,
    ) -> Subscription<SavedSearch> {
        self.list.subscribe(listener)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::prefs::storage::MemoryStorage;

    #[test]
    fn test_add_prepends() {
        let searches = SavedSearches::new(Rc::new(MemoryStorage::new()));
        searches.add(SavedSearch::new("s1", "Villas", "?type=villa"));
        let items = searches.add(SavedSearch::new("s2", "Rentals", "?purpose=rent"));
        let ids: Vec<_> = items.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["s2", "s1"]);
    }

    #[test]
    fn test_add_existing_id_replaces_record() {
        let searches = SavedSearches::new(Rc::new(MemoryStorage::new()));
        searches.add(SavedSearch::new("s1", "Old", "?a=1"));
        let items = searches.add(SavedSearch::new("s1", "New", "?a=2"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "New");
    }

    #[test]
    fn test_remove_exact_match_only() {
        let searches = SavedSearches::new(Rc::new(MemoryStorage::new()));
        searches.add(SavedSearch::new("s1", "A", "?a"));
        searches.add(SavedSearch::new("s10", "B", "?b"));
        let items = searches.remove("s1");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "s10");
    }

    #[test]
    fn test_mark_run_sets_last_run() {
        let searches = SavedSearches::new(Rc::new(MemoryStorage::new()));
        searches.add(SavedSearch::new("s1", "A", "?a"));
        searches.add(SavedSearch::new("s2", "B", "?b"));
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();

        let items = searches.mark_run_at("s1", at);
        let s1 = items.iter().find(|s| s.id == "s1").unwrap();
        let s2 = items.iter().find(|s| s.id == "s2").unwrap();
        assert_eq!(s1.last_run_at, Some(at));
        assert_eq!(s2.last_run_at, None);
    }

    #[test]
    fn test_capped_at_one_hundred() {
        let searches = SavedSearches::new(Rc::new(MemoryStorage::new()));
        for i in 0..105 {
            searches.add(SavedSearch::new(format!("s{i}"), "n", "?q"));
        }
        let items = searches.get();
        assert_eq!(items.len(), 100);
        assert_eq!(items[0].id, "s104");
    }

    #[test]
    fn test_hydration_requires_id_and_query_string() {
        let storage = Rc::new(MemoryStorage::new());
        storage.insert_raw(
            SavedSearches::SHAPE.storage_key,
            r#"[
                {"id": "ok", "name": "Kept", "queryString": "?a", "createdAt": "2026-01-02T03:04:05Z"},
                {"id": 7, "queryString": "?b"},
                {"id": "no-query"},
                {"id": "minimal", "queryString": "?c"}
            ]"#,
        );
        let searches = SavedSearches::new(storage);
        let ids: Vec<_> = searches.get().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["ok", "minimal"]);
    }

    #[test]
    fn test_hydration_tolerates_malformed_optional_fields() {
        let storage = Rc::new(MemoryStorage::new());
        storage.insert_raw(
            SavedSearches::SHAPE.storage_key,
            r#"[
                {"id": "a", "name": null, "queryString": "?a", "createdAt": "yesterday"},
                {"id": "b", "name": 12, "queryString": "?b", "lastRunAt": false}
            ]"#,
        );
        let items = SavedSearches::new(storage).get();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "");
        assert_eq!(items[0].created_at, DateTime::<Utc>::default());
        assert_eq!(items[1].name, "");
        assert_eq!(items[1].last_run_at, None);
    }

    #[test]
    fn test_serialized_field_names() {
        let storage = Rc::new(MemoryStorage::new());
        let searches = SavedSearches::new(storage.clone());
        searches.add(SavedSearch::new("s1", "A", "?a"));
        let raw = storage
            .read(SavedSearches::SHAPE.storage_key)
            .unwrap()
            .unwrap();
        assert!(raw.contains("\"queryString\":\"?a\""));
        assert!(raw.contains("\"createdAt\""));
        assert!(!raw.contains("lastRunAt"));
    }
}
