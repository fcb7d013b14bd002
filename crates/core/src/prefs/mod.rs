//! Visitor preference stores.
//!
//! Favorites, the compare set, recently viewed listings and saved searches
//! each live in one JSON array under a fixed storage key. Every store caches
//! its list after the first read, dedupes and caps on every write, and calls
//! its subscribers synchronously with the new list.
//!
//! Stores are single-threaded (`Rc`/`RefCell`). Two [`PreferenceStores`]
//! over the same storage do not notify each other.

mod compare;
mod favorites;
mod list;
mod recently_viewed;
mod saved_search;
mod storage;

use std::rc::Rc;

pub use compare::CompareList;
pub use favorites::Favorites;
pub use list::{BoundedList, ListItem, ListShape, Subscription};
pub use recently_viewed::RecentlyViewed;
pub use saved_search::{SavedSearch, SavedSearches};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError};

/// The four preference stores over one shared storage handle.
///
/// Build once at startup and hand out by reference.
pub struct PreferenceStores {
    pub favorites: Favorites,
    pub compare: CompareList,
    pub recently_viewed: RecentlyViewed,
    pub saved_searches: SavedSearches,
}

impl PreferenceStores {
    pub fn new(storage: Rc<dyn KeyValueStorage>) -> Self {
        Self {
            favorites: Favorites::new(Rc::clone(&storage)),
            compare: CompareList::new(Rc::clone(&storage)),
            recently_viewed: RecentlyViewed::new(Rc::clone(&storage)),
            saved_searches: SavedSearches::new(storage),
        }
    }
}
