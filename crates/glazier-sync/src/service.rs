//! # Sync Service
//!
//! One per process: wires the notifier, the accessor and the poll loop to a
//! single key-value store.
//!
//! ```text
//!   ┌──────────────┐  write   ┌───────────────┐  get/set  ┌──────────────┐
//!   │ view / repo  │─────────►│ StateAccessor │──────────►│ KeyValueStore│
//!   └──────▲───────┘          └───────▲───────┘           └──────────────┘
//!          │ callback                 │ updated_at
//!   ┌──────┴───────┐  notify  ┌───────┴───────┐
//!   │ChangeNotifier│◄─────────│    Poller     │  every poll_interval
//!   └──────────────┘          └───────────────┘
//! ```
//!
//! [`SyncedValue`] packages the common view pattern: load once, re-read on
//! every change notification, write through on `set`.

use std::fmt;
use std::sync::Arc;

use glazier_core::DataType;
use glazier_db::ChangePublisher;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::accessor::StateAccessor;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::notifier::{Callback, ChangeNotifier, Subscription};
use crate::poller::{PollState, Poller};
use crate::store::{KeyValueStore, MemoryStore};

/// Notifier, accessor and poll loop over one store.
#[derive(Debug)]
pub struct SyncService {
    notifier: ChangeNotifier,
    accessor: StateAccessor,
    poller: Poller,
}

impl SyncService {
    /// Builds a stopped service. Call [`start`](Self::start) to begin polling.
    pub fn new(config: &SyncConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let notifier = ChangeNotifier::new();
        let accessor = StateAccessor::new(store);
        let poller = Poller::new(
            accessor.clone(),
            notifier.clone(),
            config.tracked().to_vec(),
            config.poll_interval(),
        );

        SyncService {
            notifier,
            accessor,
            poller,
        }
    }

    /// Service over a fresh process-local store.
    pub fn in_memory(config: &SyncConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn start(&self) -> SyncResult<()> {
        self.poller.start()
    }

    pub fn stop(&self) {
        self.poller.stop();
        info!("Sync service stopped");
    }

    pub fn state(&self) -> PollState {
        self.poller.state()
    }

    /// Runs one scan now. Returns the data types whose listeners fired.
    pub async fn poll_once(&self) -> Vec<DataType> {
        self.poller.poll_once().await
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn subscribe(&self, data_type: DataType, callback: Callback) -> Subscription {
        self.notifier.subscribe(data_type, callback)
    }

    pub fn unsubscribe(&self, data_type: DataType, callback: &Callback) {
        self.notifier.unsubscribe(data_type, callback)
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Writes `value` for every other process. Listeners in this process are
    /// not notified of it.
    pub async fn write<T>(&self, data_type: DataType, value: &T) -> SyncResult<u64>
    where
        T: Serialize + ?Sized,
    {
        self.accessor.write(data_type, value).await
    }

    pub async fn read<T: DeserializeOwned>(&self, data_type: DataType) -> Option<T> {
        self.accessor.read(data_type).await
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn accessor(&self) -> &StateAccessor {
        &self.accessor
    }

    /// Publisher for `BillingService::with_publisher`.
    pub fn publisher(&self) -> Arc<dyn ChangePublisher> {
        Arc::new(self.accessor.clone())
    }

    /// A live view of `data_type`, starting from the stored value or
    /// `initial` when nothing readable is stored.
    pub async fn synced<T>(&self, data_type: DataType, initial: T) -> SyncResult<SyncedValue<T>>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        SyncedValue::open(self, data_type, initial).await
    }
}

// =============================================================================
// Synced Value
// =============================================================================

/// A value plus the stamp it was stored with.
#[derive(Debug, Clone, PartialEq)]
struct Stamped<T> {
    updated_at: u64,
    value: T,
}

/// Keeps only the newer of two versions, so refreshes that finish out of
/// order never roll the value back.
fn apply_newer<T>(tx: &watch::Sender<Stamped<T>>, updated_at: u64, value: T) -> bool {
    tx.send_if_modified(|current| {
        if updated_at > current.updated_at {
            *current = Stamped { updated_at, value };
            true
        } else {
            false
        }
    })
}

/// A locally cached view of one tracked collection that follows changes
/// from every process sharing the store.
///
/// Dropping it (or calling [`close`](Self::close)) unsubscribes.
pub struct SyncedValue<T> {
    data_type: DataType,
    accessor: StateAccessor,
    tx: Arc<watch::Sender<Stamped<T>>>,
    rx: watch::Receiver<Stamped<T>>,
    subscription: Option<Subscription>,
}

impl<T: fmt::Debug> fmt::Debug for SyncedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.rx.borrow();
        f.debug_struct("SyncedValue")
            .field("data_type", &self.data_type)
            .field("updated_at", &current.updated_at)
            .field("value", &current.value)
            .finish()
    }
}

impl<T> SyncedValue<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn open(service: &SyncService, data_type: DataType, initial: T) -> SyncResult<Self> {
        let handle = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let accessor = service.accessor.clone();

        let start = match accessor.read_envelope::<T>(data_type).await {
            Some(envelope) => Stamped {
                updated_at: envelope.updated_at,
                value: envelope.value,
            },
            None => Stamped {
                updated_at: 0,
                value: initial,
            },
        };
        let (tx, rx) = watch::channel(start);
        let tx = Arc::new(tx);

        let refresh: Callback = {
            let accessor = accessor.clone();
            let tx = tx.clone();
            Arc::new(move || {
                let accessor = accessor.clone();
                let tx = tx.clone();
                handle.spawn(async move {
                    if let Some(envelope) = accessor.read_envelope::<T>(data_type).await {
                        apply_newer(&tx, envelope.updated_at, envelope.value);
                    }
                });
            })
        };
        let subscription = service.subscribe(data_type, refresh);
        debug!(data_type = %data_type, "Synced value opened");

        Ok(SyncedValue {
            data_type,
            accessor,
            tx,
            rx,
            subscription: Some(subscription),
        })
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.rx.borrow().value.clone()
    }

    /// Stamp of the current value, zero for the initial value.
    pub fn updated_at(&self) -> u64 {
        self.rx.borrow().updated_at
    }

    /// Replaces the value locally and in the store.
    pub async fn set(&self, value: T) -> SyncResult<()> {
        let updated_at = self.accessor.write(self.data_type, &value).await?;
        apply_newer(&self.tx, updated_at, value);
        Ok(())
    }

    /// Waits until the value changes.
    pub async fn changed(&mut self) -> SyncResult<()> {
        self.rx.changed().await.map_err(|_| SyncError::ShuttingDown)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Stops following changes.
    pub fn close(self) {}
}

impl<T> Drop for SyncedValue<T> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use glazier_core::Customer;
    use serde_json::Value;

    fn tabs() -> (SyncService, SyncService) {
        let config = SyncConfig::default();
        let store = Arc::new(MemoryStore::new());
        (
            SyncService::new(&config, store.clone()),
            SyncService::new(&config, store),
        )
    }

    #[tokio::test]
    async fn test_write_in_one_tab_notifies_other_once() {
        let (tab_a, tab_b) = tabs();

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        tab_b.subscribe(
            DataType::Customers,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let customers = vec![Customer::new("Ravi Interiors", "91234 56780")];
        tab_a.write(DataType::Customers, &customers).await.unwrap();

        tab_b.poll_once().await;
        tab_b.poll_once().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let seen: Vec<Customer> = tab_b.read(DataType::Customers).await.unwrap();
        assert_eq!(seen, customers);
    }

    #[tokio::test]
    async fn test_writer_is_not_notified_of_own_write() {
        let (tab_a, tab_b) = tabs();

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        tab_a.subscribe(
            DataType::Bills,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tab_a.write(DataType::Bills, &Vec::<Value>::new()).await.unwrap();
        assert!(tab_a.poll_once().await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tab_b.write(DataType::Bills, &vec![Value::Null]).await.unwrap();
        tab_a.poll_once().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listener_that_writes_settles() {
        let (tab_a, tab_b) = tabs();
        let tab_a = Arc::new(tab_a);

        // Writes bills again from inside the bills listener.
        let calls = Arc::new(AtomicUsize::new(0));
        let (c, writer) = (calls.clone(), tab_a.clone());
        tab_a.subscribe(
            DataType::Bills,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
                let writer = writer.clone();
                tokio::spawn(async move {
                    writer.write(DataType::Bills, &"echo").await.ok();
                });
            }),
        );

        tab_b.write(DataType::Bills, &"original").await.unwrap();
        tab_a.poll_once().await;
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        tab_a.poll_once().await;
        tab_a.poll_once().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(tab_b.read::<String>(DataType::Bills).await.as_deref(), Some("echo"));
    }

    #[tokio::test]
    async fn test_synced_value_follows_other_tab() {
        let (tab_a, tab_b) = tabs();
        let mut view = tab_b.synced(DataType::Quotations, Vec::<String>::new()).await.unwrap();
        assert!(view.get().is_empty());
        assert_eq!(view.updated_at(), 0);

        tab_a
            .write(DataType::Quotations, &vec!["QTN-1".to_string()])
            .await
            .unwrap();
        tab_b.poll_once().await;

        view.changed().await.unwrap();
        assert_eq!(view.get(), vec!["QTN-1".to_string()]);
    }

    #[tokio::test]
    async fn test_synced_value_loads_stored_value() {
        let (tab_a, tab_b) = tabs();
        tab_a.write(DataType::Bills, &vec![1, 2, 3]).await.unwrap();

        let view = tab_b.synced(DataType::Bills, Vec::<i32>::new()).await.unwrap();
        assert_eq!(view.get(), vec![1, 2, 3]);
        assert!(view.updated_at() > 0);
    }

    #[tokio::test]
    async fn test_synced_value_set_writes_through() {
        let (tab_a, tab_b) = tabs();
        let view = tab_a.synced(DataType::DailySales, 0u32).await.unwrap();

        view.set(7).await.unwrap();
        assert_eq!(view.get(), 7);
        assert_eq!(tab_b.read::<u32>(DataType::DailySales).await, Some(7));
    }

    #[tokio::test]
    async fn test_close_unsubscribes() {
        let (tab_a, _) = tabs();
        let view = tab_a.synced(DataType::Customers, 0u32).await.unwrap();
        assert_eq!(tab_a.notifier().subscriber_count(DataType::Customers), 1);

        view.close();
        assert_eq!(tab_a.notifier().subscriber_count(DataType::Customers), 0);
    }

    #[test]
    fn test_out_of_order_refresh_is_ignored() {
        let (tx, rx) = watch::channel(Stamped { updated_at: 0, value: "initial" });

        assert!(apply_newer(&tx, 20, "newer"));
        assert!(!apply_newer(&tx, 10, "stale"));
        assert_eq!(rx.borrow().value, "newer");
    }

    #[tokio::test]
    async fn test_start_stop() {
        let (tab_a, _) = tabs();
        tab_a.start().unwrap();
        tab_a.start().unwrap();
        assert_eq!(tab_a.state(), PollState::Running);

        tab_a.stop();
        assert_eq!(tab_a.state(), PollState::Stopped);
    }

    #[tokio::test]
    async fn test_billing_change_reaches_other_process() {
        use glazier_db::{Database, DbConfig, Document};

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = SyncConfig::default();
        let counter_tab = SyncService::new(&config, Arc::new(db.kv()));
        let office_tab = SyncService::new(&config, Arc::new(db.kv()));

        let mut customers = office_tab
            .synced(DataType::Customers, Vec::<Document<Customer>>::new())
            .await
            .unwrap();

        let billing = db.billing().with_publisher(counter_tab.publisher());
        billing
            .add_customer(Customer::new("Anand Furniture", "90000 11122"))
            .await
            .unwrap();

        assert_eq!(office_tab.poll_once().await, vec![DataType::Customers]);
        customers.changed().await.unwrap();

        let seen = customers.get();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].data.name, "Anand Furniture");
    }
}
