//! # Change Notifier
//!
//! In-process fan-out of "this collection changed" events.
//!
//! ```text
//!   Poller ── notify(Bills) ──► [cb1, cb2, cb3]   (subscription order)
//!                                  │    │    │
//!                                  ▼    ▼    ▼
//!                               views re-read the accessor
//! ```
//!
//! Callbacks run synchronously on the notifying task. The registry lock is
//! released before the first callback runs, so a callback may subscribe or
//! unsubscribe without deadlocking. A panicking callback is caught and logged
//! and the remaining callbacks still run.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glazier_core::DataType;
use tracing::{debug, error};

/// A change listener. Identity is the `Arc` allocation, so the same callback
/// can be registered twice and removed one registration at a time.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

type Registry = HashMap<DataType, Vec<Callback>>;

/// Registry of change listeners, keyed by data type.
///
/// Cheap to clone; clones share one registry.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    listeners: Arc<Mutex<Registry>>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.lock();
        let counts: HashMap<_, _> = listeners.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("ChangeNotifier").field("listeners", &counts).finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    // Callbacks never run under the lock, so poisoning only means a panic in
    // this module's own bookkeeping. The map is still consistent.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `callback` to the listeners of `data_type`.
    ///
    /// Registering the same callback twice makes it fire twice per change.
    pub fn subscribe(&self, data_type: DataType, callback: Callback) -> Subscription {
        let mut listeners = self.lock();
        let entry = listeners.entry(data_type).or_default();
        entry.push(callback.clone());
        debug!(data_type = %data_type, listeners = entry.len(), "Listener subscribed");

        Subscription {
            notifier: self.clone(),
            data_type,
            callback,
        }
    }

    /// Removes the first registration of `callback` for `data_type`.
    /// No-op when it is not registered.
    pub fn unsubscribe(&self, data_type: DataType, callback: &Callback) {
        let mut listeners = self.lock();
        let Some(entry) = listeners.get_mut(&data_type) else {
            return;
        };

        if let Some(pos) = entry.iter().position(|cb| Arc::ptr_eq(cb, callback)) {
            entry.remove(pos);
            debug!(data_type = %data_type, listeners = entry.len(), "Listener unsubscribed");
        }

        if entry.is_empty() {
            listeners.remove(&data_type);
        }
    }

    /// Invokes every listener registered for `data_type` at call time,
    /// in subscription order.
    pub fn notify(&self, data_type: DataType) {
        let snapshot: Vec<Callback> = self
            .lock()
            .get(&data_type)
            .map(|entry| entry.to_vec())
            .unwrap_or_default();

        for (index, callback) in snapshot.iter().enumerate() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                error!(
                    data_type = %data_type,
                    listener = index,
                    reason = panic_message(payload.as_ref()),
                    "Change listener panicked"
                );
            }
        }
    }

    /// Number of live registrations for `data_type`.
    pub fn subscriber_count(&self, data_type: DataType) -> usize {
        self.lock().get(&data_type).map_or(0, Vec::len)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Handle to one registration, returned by [`ChangeNotifier::subscribe`].
///
/// Dropping the handle leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    notifier: ChangeNotifier,
    data_type: DataType,
    callback: Callback,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("data_type", &self.data_type)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    /// Removes exactly this registration.
    pub fn unsubscribe(self) {
        self.notifier.unsubscribe(self.data_type, &self.callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let cb: Callback = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, cb)
    }

    #[test]
    fn test_notify_only_matching_type() {
        let notifier = ChangeNotifier::new();
        let (bills, cb) = counter();
        notifier.subscribe(DataType::Bills, cb);

        notifier.notify(DataType::Customers);
        assert_eq!(bills.load(Ordering::SeqCst), 0);

        notifier.notify(DataType::Bills);
        assert_eq!(bills.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_subscribe_fires_twice() {
        let notifier = ChangeNotifier::new();
        let (count, cb) = counter();
        notifier.subscribe(DataType::Bills, cb.clone());
        notifier.subscribe(DataType::Bills, cb.clone());

        notifier.notify(DataType::Bills);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        // One unsubscribe removes one registration.
        notifier.unsubscribe(DataType::Bills, &cb);
        notifier.notify(DataType::Bills);
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(notifier.subscriber_count(DataType::Bills), 1);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let notifier = ChangeNotifier::new();
        let (_, registered) = counter();
        let (_, stranger) = counter();
        notifier.subscribe(DataType::Quotations, registered);

        notifier.unsubscribe(DataType::Quotations, &stranger);
        notifier.unsubscribe(DataType::DailySales, &stranger);
        assert_eq!(notifier.subscriber_count(DataType::Quotations), 1);
    }

    #[test]
    fn test_subscription_handle_removes_itself() {
        let notifier = ChangeNotifier::new();
        let (count, cb) = counter();
        let first = notifier.subscribe(DataType::Customers, cb.clone());
        let _second = notifier.subscribe(DataType::Customers, cb);

        first.unsubscribe();
        notifier.notify(DataType::Customers);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_order() {
        let notifier = ChangeNotifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3 {
            let order = order.clone();
            notifier.subscribe(
                DataType::Bills,
                Arc::new(move || order.lock().unwrap().push(id)),
            );
        }

        notifier.notify(DataType::Bills);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let notifier = ChangeNotifier::new();
        let (before, cb_before) = counter();
        let (after, cb_after) = counter();

        notifier.subscribe(DataType::Bills, cb_before);
        notifier.subscribe(DataType::Bills, Arc::new(|| panic!("view crashed")));
        notifier.subscribe(DataType::Bills, cb_after);

        notifier.notify(DataType::Bills);
        notifier.notify(DataType::Bills);

        assert_eq!(before.load(Ordering::SeqCst), 2);
        assert_eq!(after.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reentrant_unsubscribe() {
        let notifier = ChangeNotifier::new();
        let (count, cb) = counter();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let inner = slot.clone();
        let once: Callback = Arc::new(move || {
            if let Some(sub) = inner.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(notifier.subscribe(DataType::Bills, once));
        notifier.subscribe(DataType::Bills, cb);

        notifier.notify(DataType::Bills);
        notifier.notify(DataType::Bills);

        assert_eq!(notifier.subscriber_count(DataType::Bills), 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
