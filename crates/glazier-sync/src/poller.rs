//! # Poll Loop
//!
//! Periodically compares each tracked collection's stored stamp with the
//! last stamp this process has seen and notifies listeners of the ones that
//! moved forward.
//!
//! ## Lifecycle
//! ```text
//!            start()                 stop()
//!   Stopped ─────────► Running ─────────────► Stopped
//!      ▲                  │ start() again: no-op
//!      └──────────────────┘
//! ```
//!
//! ## One Scan
//! ```text
//!   for data_type in tracked (in order):
//!       stamp = accessor.updated_at(data_type)
//!       if stamp > watermark[data_type]:
//!           watermark[data_type] = stamp      ← before listeners run
//!           if stamp is not our own write:
//!               notifier.notify(data_type)
//! ```
//!
//! Watermarks start at zero, so the first scan reports every collection that
//! already has data. A stamp this process wrote itself only moves the
//! watermark: the writer already has the value, and a listener that writes
//! must not wake itself up on every tick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use glazier_core::DataType;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::accessor::StateAccessor;
use crate::error::{SyncError, SyncResult};
use crate::notifier::ChangeNotifier;

/// Whether the interval task is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Stopped,
    Running,
}

/// The part of the poller the background task owns a share of.
#[derive(Debug)]
struct Scanner {
    accessor: StateAccessor,
    notifier: ChangeNotifier,
    tracked: Vec<DataType>,
    watermarks: Mutex<HashMap<DataType, u64>>,
}

impl Scanner {
    async fn scan(&self) -> Vec<DataType> {
        let mut changed = Vec::new();

        for &data_type in &self.tracked {
            let stamp = match self.accessor.updated_at(data_type).await {
                Ok(Some(stamp)) => stamp,
                Ok(None) => continue,
                Err(e) => {
                    warn!(data_type = %data_type, error = %e, "Skipping data type in scan");
                    continue;
                }
            };

            let own = self.accessor.last_written(data_type);
            let advanced = {
                let mut watermarks = self.watermarks.lock().unwrap_or_else(PoisonError::into_inner);
                let seen = watermarks.entry(data_type).or_insert(0);
                if stamp > *seen {
                    *seen = stamp;
                    stamp > own
                } else {
                    false
                }
            };

            if advanced {
                debug!(data_type = %data_type, updated_at = stamp, "Change detected");
                self.notifier.notify(data_type);
                changed.push(data_type);
            }
        }

        changed
    }
}

/// Interval-driven change detector.
#[derive(Debug)]
pub struct Poller {
    scanner: Arc<Scanner>,
    interval: Duration,
    /// Present while the interval task runs. Dropping it stops the task.
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
}

impl Poller {
    pub fn new(
        accessor: StateAccessor,
        notifier: ChangeNotifier,
        tracked: Vec<DataType>,
        interval: Duration,
    ) -> Self {
        Poller {
            scanner: Arc::new(Scanner {
                accessor,
                notifier,
                tracked,
                watermarks: Mutex::new(HashMap::new()),
            }),
            interval,
            shutdown_tx: Mutex::new(None),
        }
    }

    fn control(&self) -> MutexGuard<'_, Option<mpsc::Sender<()>>> {
        self.shutdown_tx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the interval task: one scan now, then one per interval.
    ///
    /// No-op while already running. Must be called inside a Tokio runtime.
    pub fn start(&self) -> SyncResult<()> {
        let mut control = self.control();
        if control.as_ref().is_some_and(|tx| !tx.is_closed()) {
            debug!("Poll loop already running");
            return Ok(());
        }

        let handle = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        handle.spawn(run(self.scanner.clone(), self.interval, shutdown_rx));
        *control = Some(shutdown_tx);

        info!(
            interval_ms = self.interval.as_millis() as u64,
            tracked = self.scanner.tracked.len(),
            "Poll loop started"
        );
        Ok(())
    }

    /// Stops future ticks. A scan already in progress finishes.
    pub fn stop(&self) {
        if let Some(tx) = self.control().take() {
            tx.try_send(()).ok();
        }
    }

    pub fn state(&self) -> PollState {
        match self.control().as_ref() {
            Some(tx) if !tx.is_closed() => PollState::Running,
            _ => PollState::Stopped,
        }
    }

    /// Runs one scan now, outside the interval. Returns the data types whose
    /// listeners were notified.
    pub async fn poll_once(&self) -> Vec<DataType> {
        self.scanner.scan().await
    }

    /// Highest stamp seen for `data_type`, zero before the first change.
    pub fn watermark(&self, data_type: DataType) -> u64 {
        self.scanner
            .watermarks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&data_type)
            .copied()
            .unwrap_or(0)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(scanner: Arc<Scanner>, period: Duration, mut shutdown_rx: mpsc::Receiver<()>) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let changed = scanner.scan().await;
                if !changed.is_empty() {
                    debug!(?changed, "Scan notified listeners");
                }
            }

            // Also fires when the sender is dropped.
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }

    info!("Poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::Callback;
    use crate::store::{KeyValueStore, MemoryStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    const PERIOD: Duration = Duration::from_millis(1000);

    /// Memory store that counts reads, can fail reads of one key and can
    /// fail the next few writes.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        gets: AtomicUsize,
        failing: Option<&'static str>,
        failing_sets: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for CountingStore {
        async fn get(&self, key: &str) -> SyncResult<Option<String>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.failing.is_some_and(|failing| failing == key) {
                return Err(SyncError::StoreFailed("disk unplugged".into()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
            let fail = self
                .failing_sets
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if fail {
                return Err(SyncError::StoreFailed("disk full".into()));
            }
            self.inner.set(key, value).await
        }
    }

    fn counter(notifier: &ChangeNotifier, data_type: DataType) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        notifier.subscribe(
            data_type,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        count
    }

    /// A poller plus an accessor of another process writing to the same store.
    fn poller(store: Arc<CountingStore>, tracked: Vec<DataType>) -> (StateAccessor, ChangeNotifier, Poller) {
        let writer = StateAccessor::new(store.clone());
        let notifier = ChangeNotifier::new();
        let poller = Poller::new(StateAccessor::new(store), notifier.clone(), tracked, PERIOD);
        (writer, notifier, poller)
    }

    #[tokio::test]
    async fn test_notifies_once_per_change() {
        let store = Arc::new(CountingStore::default());
        let (accessor, notifier, poller) = poller(store, DataType::ALL.to_vec());
        let bills = counter(&notifier, DataType::Bills);

        assert!(poller.poll_once().await.is_empty());

        accessor.write(DataType::Bills, &vec![1]).await.unwrap();
        assert_eq!(poller.poll_once().await, vec![DataType::Bills]);
        assert!(poller.poll_once().await.is_empty());
        assert_eq!(bills.load(Ordering::SeqCst), 1);

        accessor.write(DataType::Bills, &vec![1, 2]).await.unwrap();
        poller.poll_once().await;
        assert_eq!(bills.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_own_writes_only_move_watermark() {
        let store = Arc::new(CountingStore::default());
        let local = StateAccessor::new(store.clone());
        let notifier = ChangeNotifier::new();
        let poller = Poller::new(local.clone(), notifier.clone(), vec![DataType::Bills], PERIOD);
        let bills = counter(&notifier, DataType::Bills);

        let stamp = local.write(DataType::Bills, &1).await.unwrap();
        assert!(poller.poll_once().await.is_empty());
        assert_eq!(poller.watermark(DataType::Bills), stamp);

        // Another process writing afterwards is still reported.
        StateAccessor::new(store).write(DataType::Bills, &2).await.unwrap();
        assert_eq!(poller.poll_once().await, vec![DataType::Bills]);
        assert_eq!(bills.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_own_write_does_not_mask_foreign_stamp() {
        let store = Arc::new(CountingStore::default());
        let future = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap() + 60_000;
        store
            .inner
            .set("bills", &format!(r#"{{"value":[],"updatedAt":{future}}}"#))
            .await
            .unwrap();

        let local = StateAccessor::new(store.clone());
        let notifier = ChangeNotifier::new();
        let poller = Poller::new(local.clone(), notifier.clone(), vec![DataType::Bills], PERIOD);
        let bills = counter(&notifier, DataType::Bills);
        poller.poll_once().await;
        let before = bills.load(Ordering::SeqCst);

        store.failing_sets.store(1, Ordering::SeqCst);
        assert!(matches!(
            local.write(DataType::Bills, &1).await,
            Err(SyncError::StoreFailed(_))
        ));

        // Another process computes the same stamp the failed write used.
        let foreign = StateAccessor::new(store.clone()).write(DataType::Bills, &2).await.unwrap();
        assert_eq!(foreign, future + 1);

        assert_eq!(poller.poll_once().await, vec![DataType::Bills]);
        assert_eq!(bills.load(Ordering::SeqCst), before + 1);
        assert_eq!(poller.watermark(DataType::Bills), foreign);
    }

    #[tokio::test]
    async fn test_first_scan_reports_existing_data() {
        let store = Arc::new(CountingStore::default());
        let (accessor, _, _) = poller(store.clone(), vec![]);
        accessor.write(DataType::Customers, &"existing").await.unwrap();

        let (_, notifier, fresh) = poller(store, DataType::ALL.to_vec());
        let customers = counter(&notifier, DataType::Customers);

        assert_eq!(fresh.poll_once().await, vec![DataType::Customers]);
        assert_eq!(customers.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_watermark_moves_before_listeners_run() {
        let store = Arc::new(CountingStore::default());
        let (accessor, notifier, poller) = poller(store, vec![DataType::Bills]);
        let poller = Arc::new(poller);

        let observed = Arc::new(AtomicU64::new(0));
        let (p, o) = (poller.clone(), observed.clone());
        let cb: Callback = Arc::new(move || {
            o.store(p.watermark(DataType::Bills), Ordering::SeqCst);
        });
        notifier.subscribe(DataType::Bills, cb);

        let stamp = accessor.write(DataType::Bills, &0).await.unwrap();
        poller.poll_once().await;
        assert_eq!(observed.load(Ordering::SeqCst), stamp);
    }

    #[tokio::test]
    async fn test_failing_type_does_not_abort_scan() {
        let store = Arc::new(CountingStore {
            failing: Some("customers"),
            ..Default::default()
        });
        let (accessor, notifier, poller) = poller(store, DataType::ALL.to_vec());
        let bills = counter(&notifier, DataType::Bills);

        accessor.write(DataType::Bills, &1).await.unwrap();
        assert_eq!(poller.poll_once().await, vec![DataType::Bills]);
        assert_eq!(bills.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_type_does_not_abort_scan() {
        let store = Arc::new(CountingStore::default());
        store.inner.set("bills", "garbage").await.unwrap();
        let (accessor, _, poller) = poller(store, DataType::ALL.to_vec());

        accessor.write(DataType::DailySales, &1).await.unwrap();
        assert_eq!(poller.poll_once().await, vec![DataType::DailySales]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_runs_one_timer() {
        let store = Arc::new(CountingStore::default());
        let (_, _, poller) = poller(store.clone(), vec![DataType::Bills]);

        poller.start().unwrap();
        poller.start().unwrap();
        assert_eq!(poller.state(), PollState::Running);

        // Immediate first tick.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);

        tokio::time::sleep(PERIOD).await;
        assert_eq!(store.gets.load(Ordering::SeqCst), 2);

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(store.gets.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_future_ticks() {
        let store = Arc::new(CountingStore::default());
        let (_, _, poller) = poller(store.clone(), vec![DataType::Bills]);

        poller.stop();
        assert_eq!(poller.state(), PollState::Stopped);

        poller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.stop();
        poller.stop();
        assert_eq!(poller.state(), PollState::Stopped);

        let seen = store.gets.load(Ordering::SeqCst);
        tokio::time::sleep(PERIOD * 5).await;
        assert_eq!(store.gets.load(Ordering::SeqCst), seen);

        // Restart after stop.
        poller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.gets.load(Ordering::SeqCst), seen + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_picks_up_writes() {
        let store = Arc::new(CountingStore::default());
        let (accessor, notifier, poller) = poller(store, vec![DataType::Quotations]);
        let quotations = counter(&notifier, DataType::Quotations);

        poller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(quotations.load(Ordering::SeqCst), 0);

        accessor.write(DataType::Quotations, &"QTN-1").await.unwrap();
        tokio::time::sleep(PERIOD).await;
        assert_eq!(quotations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_start_outside_runtime() {
        let (_, _, poller) = poller(Arc::new(CountingStore::default()), vec![DataType::Bills]);
        assert!(matches!(poller.start(), Err(SyncError::NoRuntime)));
        assert_eq!(poller.state(), PollState::Stopped);
    }
}
