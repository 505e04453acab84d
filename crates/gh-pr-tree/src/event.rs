//! Change notification channels
//!
//! `Emitter` is a synchronous publish/subscribe channel: `fire` calls every
//! listener on the caller's stack before returning. Subscribing hands back a
//! `Subscription` that must be disposed explicitly; dropping it leaves the
//! listener registered, so owners keep their subscriptions in a
//! `DisposableStore` and dispose the store on teardown.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Synchronous event channel
pub struct Emitter<T> {
    listeners: Arc<Mutex<Listeners<T>>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a listener
    pub fn event<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut listeners = lock(&self.listeners);
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Arc::new(listener)));
            id
        };

        let registry: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Deliver `value` to every listener registered at the time of the call
    ///
    /// Listeners run without the registry lock held, so they may subscribe,
    /// dispose or fire again.
    pub fn fire(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = lock(&self.listeners)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(value);
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }

    /// Drop every listener
    pub fn clear(&self) {
        lock(&self.listeners).entries.clear();
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &lock(&self.listeners).entries.len())
            .finish()
    }
}

/// Handle to a registered listener or any other releasable resource
///
/// `dispose` runs the release hook at most once.
pub struct Subscription {
    release: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// Release the resource; later calls are no-ops
    pub fn dispose(&self) {
        let release = lock(&self.release).take();
        if let Some(release) = release {
            release();
        }
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.release).is_none()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A bag of subscriptions released together
#[derive(Debug, Default)]
pub struct DisposableStore {
    items: Mutex<Vec<Subscription>>,
    disposed: AtomicBool,
}

impl DisposableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a subscription
    ///
    /// Adding to an already disposed store releases the subscription
    /// immediately instead of leaking it.
    pub fn add(&self, subscription: Subscription) {
        if self.disposed.load(Ordering::SeqCst) {
            log::debug!("DisposableStore: releasing subscription added after dispose");
            subscription.dispose();
            return;
        }
        lock(&self.items).push(subscription);
    }

    /// Release everything added so far; the store stays usable only in the
    /// sense that later additions are released on arrival
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.release_all();
    }

    /// Release everything added so far and keep accepting new subscriptions
    pub fn clear(&self) {
        self.release_all();
    }

    fn release_all(&self) {
        let items = std::mem::take(&mut *lock(&self.items));
        for item in items {
            item.dispose();
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_fire_reaches_all_listeners() {
        let emitter: Emitter<u32> = Emitter::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = Arc::clone(&total);
        let _a = emitter.event(move |v| {
            t1.fetch_add(*v as usize, Ordering::SeqCst);
        });
        let t2 = Arc::clone(&total);
        let _b = emitter.event(move |v| {
            t2.fetch_add(*v as usize * 10, Ordering::SeqCst);
        });

        emitter.fire(&2);
        assert_eq!(total.load(Ordering::SeqCst), 22);
        assert_eq!(emitter.listener_count(), 2);
    }

    #[test]
    fn test_dispose_removes_listener_once() {
        let emitter: Emitter<()> = Emitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let sub = emitter.event(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let _other = emitter.event(|_| {});

        sub.dispose();
        sub.dispose();
        assert!(sub.is_disposed());
        assert_eq!(emitter.listener_count(), 1);

        emitter.fire(&());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_may_fire_again_without_deadlock() {
        let emitter: Arc<Emitter<u32>> = Arc::new(Emitter::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&emitter);
        let s = Arc::clone(&seen);
        let _sub = emitter.event(move |v| {
            s.lock().unwrap().push(*v);
            if *v == 0 {
                inner.fire(&1);
            }
        });

        emitter.fire(&0);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_subscription_outliving_emitter() {
        let emitter: Emitter<()> = Emitter::new();
        let sub = emitter.event(|_| {});
        drop(emitter);
        sub.dispose();
        assert!(sub.is_disposed());
    }

    #[test]
    fn test_disposable_store() {
        let emitter: Emitter<()> = Emitter::new();
        let store = DisposableStore::new();
        store.add(emitter.event(|_| {}));
        store.add(emitter.event(|_| {}));
        assert_eq!(store.len(), 2);

        store.dispose();
        assert!(store.is_empty());
        assert_eq!(emitter.listener_count(), 0);

        // Late additions are released on arrival
        store.add(emitter.event(|_| {}));
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_disposable_store_clear_keeps_accepting() {
        let emitter: Emitter<()> = Emitter::new();
        let store = DisposableStore::new();
        store.add(emitter.event(|_| {}));
        store.clear();
        assert_eq!(emitter.listener_count(), 0);

        store.add(emitter.event(|_| {}));
        assert_eq!(emitter.listener_count(), 1);
        assert!(!store.is_disposed());
    }
}
