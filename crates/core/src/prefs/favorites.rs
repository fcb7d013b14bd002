//! Favorited listing IDs.

use std::rc::Rc;

use super::list::{BoundedList, ListShape, Subscription};
use super::storage::KeyValueStorage;

/// Listing IDs the visitor has starred, in insertion order.
pub struct Favorites {
    list: BoundedList<String>,
}

impl Favorites {
    pub const SHAPE: ListShape = ListShape {
        storage_key: "hrtaj:favorites:v1",
        cap: 200,
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
    /// At the cap an appended ID is cut off by truncation.
    pub fn toggle(&self, id: &str) -> Vec<String> {
        let mut ids = self.list.get();
        if let Some(pos) = ids.iter().position(|existing| existing == id) {
            ids.remove(pos);
        } else {
            ids.push(id.to_owned());
        }
        self.list.set(ids)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.list.get().iter().any(|existing| existing == id)
    }

    pub fn subscribe(&self, listener: impl Fn(&[String]) + 'static) -> Subscription<String> {
        self.list.subscribe(listener)
    }
}
