//! Listings selected for side-by-side comparison.

use std::rc::Rc;

use super::list::{BoundedList, ListShape, Subscription};
use super::storage::KeyValueStorage;

/// Up to four listing IDs. Adding to a full set is refused rather than
/// evicting an existing member.
pub struct CompareList {
    list: BoundedList<String>,
}

impl CompareList {
    pub const SHAPE: ListShape = ListShape {
        storage_key: "hrtaj:compare:v1",
        cap: 4,
    };

    pub fn new(storage: Rc<dyn KeyValueStorage>) -> Self {
        Self {
            list: BoundedList::new(Self::SHAPE, storage),
        }
    }

    #[must_use]
    pub fn get(&self) -> Vec<String> {
        self.list.get()
    }

    pub fn set(&self, ids: Vec<String>) -> Vec<String> {
        self.list.set(ids)
    }

    /// Remove `id` if present, otherwise append it.
    ///
    /// When the set is already full and `id` is not a member, nothing is
    /// written or emitted and the unchanged set is returned. Callers compare
    /// the result (or check [`CompareList::is_full`] first) to warn the user.
    pub fn toggle(&self, id: &str) -> Vec<String> {
        let mut ids = self.list.get();
        if let Some(pos) = ids.iter().position(|existing| existing == id) {
            ids.remove(pos);
        } else if ids.len() >= Self::SHAPE.cap {
            return ids;
        } else {
            ids.push(id.to_owned());
        }
        self.list.set(ids)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.list.get().iter().any(|existing| existing == id)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.list.get().len() >= Self::SHAPE.cap
    }

    pub fn subscribe(&self, listener: impl Fn(&[String]) + 'static) -> Subscription<String> {
        self.list.subscribe(listener)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::prefs::storage::MemoryStorage;

    fn full_compare() -> CompareList {
        let compare = CompareList::new(Rc::new(MemoryStorage::new()));
        for id in ["a", "b", "c", "d"] {
            compare.toggle(id);
        }
        compare
    }

    #[test]
    fn test_full_set_refuses_new_member() {
        let compare = full_compare();
        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        let _subscription = compare.subscribe(move |_| counter.set(counter.get() + 1));

        let result = compare.toggle("e");
        assert_eq!(result, vec!["a", "b", "c", "d"]);
        assert!(compare.is_full());
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn test_member_removal_when_full() {
        let compare = full_compare();
        assert_eq!(compare.toggle("b"), vec!["a", "c", "d"]);
        assert!(!compare.is_full());
        assert_eq!(compare.toggle("e"), vec!["a", "c", "d", "e"]);
    }

    #[test]
    fn test_never_exceeds_four_unique_ids() {
        let compare = CompareList::new(Rc::new(MemoryStorage::new()));
        for i in 0..20 {
            compare.toggle(&format!("id{}", i % 7));
            let ids = compare.get();
            assert!(ids.len() <= 4);
            let mut unique = ids.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), ids.len());
        }
    }

    #[test]
    fn test_set_truncates_to_cap() {
        let compare = CompareList::new(Rc::new(MemoryStorage::new()));
        let stored = compare.set(["1", "2", "3", "4", "5"].map(str::to_owned).to_vec());
        assert_eq!(stored.len(), 4);
    }
}
