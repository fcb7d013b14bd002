//! Recently opened listings, most recent first.

use std::rc::Rc;

use super::list::{BoundedList, ListShape, Subscription};
use super::storage::KeyValueStorage;

pub struct RecentlyViewed {
    list: BoundedList<String>,
}

impl RecentlyViewed {
    pub const SHAPE: ListShape = ListShape {
        storage_key: "hrtaj:recentlyViewed:v1",
        cap: 10,
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

    /// Move `id` to the front, evicting the oldest entry past the cap.
    pub fn add(&self, id: &str) -> Vec<String> {
        let mut ids = self.list.get();
        ids.retain(|existing| existing != id);
        ids.insert(0, id.to_owned());
        self.list.set(ids)
    }

    pub fn subscribe(&self, listener: impl Fn(&[String]) + 'static) -> Subscription<String> {
        self.list.subscribe(listener)
    }
}
