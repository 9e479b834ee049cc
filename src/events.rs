//! Observer lists for status and window events
//!
//! Subscribing returns a [`Subscription`] guard; dropping it (or calling
//! [`Subscription::unsubscribe`]) removes the listener.
//!
//! Delivery rules during `emit`:
//! - listeners are snapshotted when `emit` starts, so a listener added during
//!   delivery first hears the next event;
//! - a listener removed during delivery is not called again, including when it
//!   removes itself from inside its own callback (the running call finishes).

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: u64,
    active: Arc<AtomicBool>,
    listener: Listener<T>,
}

struct HubInner<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

/// A list of listeners for one event type
pub struct EventHub<T> {
    inner: Arc<Mutex<HubInner<T>>>,
}

impl<T> Default for EventHub<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<T: 'static> EventHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            active: Arc::clone(&active),
            listener: Arc::new(listener),
        });

        let weak: Weak<Mutex<HubInner<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            active,
            remove: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().entries.retain(|e| e.id != id);
                }
            })),
        }
    }

    /// Deliver `payload` to every current listener
    pub fn emit(&self, payload: &T) {
        let snapshot: Vec<(Arc<AtomicBool>, Listener<T>)> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|e| (Arc::clone(&e.active), Arc::clone(&e.listener)))
            .collect();

        // Lock released: listeners may subscribe or unsubscribe freely
        for (active, listener) in snapshot {
            if active.load(Ordering::Acquire) {
                listener(payload);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Remove every listener
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        for entry in &inner.entries {
            entry.active.store(false, Ordering::Release);
        }
        inner.entries.clear();
    }
}

/// Guard returned by [`EventHub::subscribe`]
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    active: Arc<AtomicBool>,
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Keep the listener registered for the life of the hub
    pub fn detach(mut self) {
        self.remove = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn release(&mut self) {
        if let Some(remove) = self.remove.take() {
            self.active.store(false, Ordering::Release);
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
