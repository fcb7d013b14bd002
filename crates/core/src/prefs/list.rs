//! Bounded, deduplicated list persisted as one JSON array.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::storage::KeyValueStorage;

/// An element of a [`BoundedList`], identified by a string key.
pub trait ListItem: Clone + Serialize + DeserializeOwned {
    /// Identity used for deduplication.
    fn key(&self) -> &str;
}

impl ListItem for String {
    fn key(&self) -> &str {
        self
    }
}

/// Storage key and capacity of one list type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListShape {
    pub storage_key: &'static str,
    pub cap: usize,
}

type Listener<T> = Rc<dyn Fn(&[T])>;

struct Registry<T> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn add(&self, listener: Listener<T>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn emit(&self, items: &[T]) {
        // Snapshot so listeners may subscribe or unsubscribe while being called.
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(items);
        }
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle keeps the listener registered for the lifetime of the
/// store; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription<T> {
    registry: Weak<Registry<T>>,
    id: u64,
}

impl<T> Subscription<T> {
    /// Remove the listener. Later mutations no longer reach it.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .listeners
                .borrow_mut()
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// A capped list with a lazily hydrated in-memory cache and synchronous
/// change notification.
pub struct BoundedList<T: ListItem> {
    shape: ListShape,
    storage: Rc<dyn KeyValueStorage>,
    cache: RefCell<Option<Vec<T>>>,
    registry: Rc<Registry<T>>,
}

impl<T: ListItem> BoundedList<T> {
    pub fn new(shape: ListShape, storage: Rc<dyn KeyValueStorage>) -> Self {
        Self {
            shape,
            storage,
            cache: RefCell::new(None),
            registry: Rc::new(Registry::new()),
        }
    }

    #[must_use]
    pub const fn shape(&self) -> ListShape {
        self.shape
    }

    /// Current items. Reads storage on first use only; unreadable or
    /// malformed data yields an empty list.
    #[must_use]
    pub fn get(&self) -> Vec<T> {
        if let Some(items) = self.cache.borrow().as_ref() {
            return items.clone();
        }
        let items = self.read_storage();
        *self.cache.borrow_mut() = Some(items.clone());
        items
    }

    /// Replace the list: dedupe by key (first occurrence wins), truncate to
    /// the cap, persist best-effort, cache, then notify subscribers.
    pub fn set(&self, mut next: Vec<T>) -> Vec<T> {
        let mut seen = HashSet::new();
        next.retain(|item| seen.insert(item.key().to_owned()));
        next.truncate(self.shape.cap);

        self.write_storage(&next);
        *self.cache.borrow_mut() = Some(next.clone());
        self.registry.emit(&next);
        next
    }

    /// Register `listener` to receive the new items after every `set`.
    pub fn subscribe(&self, listener: impl Fn(&[T]) + 'static) -> Subscription<T> {
        let id = self.registry.add(Rc::new(listener));
        Subscription {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    fn read_storage(&self) -> Vec<T> {
        let raw = match self.storage.read(self.shape.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::debug!(key = self.shape.storage_key, error = %e, "Preference storage unreadable");
                return Vec::new();
            }
        };

        // Keep well-formed elements of an array; anything else is empty.
        serde_json::from_str::<Vec<serde_json::Value>>(&raw)
            .map(|values| {
                values
                    .into_iter()
                    .filter_map(|value| serde_json::from_value(value).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn write_storage(&self, items: &[T]) {
        let result = serde_json::to_string(items)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.storage
                    .write(self.shape.storage_key, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = result {
            tracing::debug!(key = self.shape.storage_key, %error, "Preference write dropped");
        }
    }
}
