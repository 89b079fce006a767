//! # Descriptor Store
//!
//! A [`Store`] caches the [`Registry`] downloaded from one URL and keeps it fresh.
//!
//! ## Lifecycle
//!
//! 1. **Uninitialized**: the store is being opened, one load is performed synchronously.
//!    If it fails the store is never handed out.
//! 2. **Loaded**: readers get the last committed registry.
//! 3. **Refreshing**: a background load is in flight. Readers keep getting the previous registry
//!    until the new one is fully built and swapped in. A failed load leaves it untouched.
//! 4. **Closed**: the scheduler is stopped. The last registry stays readable.
//!
//! ## Access gated refresh
//!
//! The scheduler wakes up every `refresh_interval`, but it only downloads when the store was
//! read since the previous tick. Readers raise an [`AtomicBool`] and the tick takes it down
//! before loading, so a read that happens while a load is in flight counts for the next tick.
use crate::{
    logger::Logger,
    refresh::{LoadError, Loaded, RefreshStrategy},
    registry::Registry,
    transport::Transport,
};
use parking_lot::{Mutex, RwLock};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

/// A handle to the cached registry of a single URL.
///
/// Handles are cheap to clone and stay readable after the store is closed.
pub struct Store<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("url", &self.inner.url)
            .field("loaded", &self.inner.slot.read().is_some())
            .field("closed", &self.inner.closed.load(Ordering::Acquire))
            .finish()
    }
}

struct Inner<T> {
    url: String,
    transport: Arc<T>,
    strategy: RefreshStrategy,
    // The version and the registry it belongs to are always committed together.
    slot: RwLock<Option<Loaded>>,
    accessed: AtomicBool,
    closed: AtomicBool,
    logger: Arc<dyn Logger>,
    scheduler: Mutex<Option<Scheduler>>,
}

struct Scheduler {
    shutdown: oneshot::Sender<()>,
    // Dropping the handle detaches the task, an in-flight load is allowed to finish.
    _handle: JoinHandle<()>,
}

impl<T: Transport> Store<T> {
    /// Opens a store by performing its first load.
    ///
    /// # Returns
    ///
    /// * `Ok(Store)` - The store, holding a valid registry.
    /// * `Err(LoadError)` - If the first load failed. A version based store whose registry
    ///   advertises no usable version fails with `NoVersionsAvailable`.
    pub(crate) async fn open(
        url: String,
        transport: Arc<T>,
        strategy: RefreshStrategy,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, LoadError> {
        let inner = Inner {
            strategy,
            url,
            transport,
            slot: RwLock::new(None),
            accessed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            logger,
            scheduler: Mutex::new(None),
        };

        let loaded = inner.load().await;
        match loaded {
            Ok(()) => {}
            Err(LoadError::AlreadyUpToDate(_)) => {
                return Err(LoadError::NoVersionsAvailable(inner.url));
            }
            Err(err) => return Err(err),
        }

        inner
            .logger
            .info(&format!("stencil: loaded descriptors from {}", inner.url));

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Spawns the background refresh task on the current tokio runtime.
    ///
    /// The first tick happens one full `interval` after this call.
    pub(crate) fn start_scheduler(&self, interval: Duration) {
        let mut scheduler = self.inner.scheduler.lock();
        if scheduler.is_some() || self.inner.closed.load(Ordering::Acquire) {
            return;
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_scheduler(
            Arc::clone(&self.inner),
            interval,
            shutdown_rx,
        ));

        *scheduler = Some(Scheduler {
            shutdown,
            _handle: handle,
        });
    }

    /// Runs the loader right away, regardless of the access flag.
    ///
    /// `AlreadyUpToDate` is not a failure. On error the cached registry is left untouched.
    pub async fn refresh(&self) -> Result<(), LoadError> {
        match self.inner.load().await {
            Ok(()) | Err(LoadError::AlreadyUpToDate(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl<T> Store<T> {
    /// Returns the current registry and records the access for the scheduler.
    ///
    /// Never waits on a download: readers only contend on the registry lock.
    pub fn registry(&self) -> Option<Registry> {
        self.inner.accessed.store(true, Ordering::Release);
        self.inner
            .slot
            .read()
            .as_ref()
            .map(|loaded| loaded.registry.clone())
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// The last version loaded by a version based store.
    pub fn last_version(&self) -> Option<i64> {
        match self.inner.strategy {
            RefreshStrategy::LongPolling => None,
            RefreshStrategy::VersionBased => Some(self.inner.committed_version()),
        }
    }

    /// Whether the store was read since the last scheduler tick.
    pub fn was_accessed(&self) -> bool {
        self.inner.accessed.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Stops the background scheduler. No further ticks are processed.
    ///
    /// A load already in flight may still commit. The registry stays readable.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        if let Some(scheduler) = self.inner.scheduler.lock().take() {
            let _ = scheduler.shutdown.send(());
        }
    }
}

impl<T> Inner<T> {
    fn committed_version(&self) -> i64 {
        self.slot.read().as_ref().map_or(0, |loaded| loaded.version)
    }
}

impl<T: Transport> Inner<T> {
    /// Loads and commits a registry.
    ///
    /// Loads may overlap (a scheduler tick and a manual refresh). A load that finishes after a
    /// newer version was committed is dropped and reported as `AlreadyUpToDate`.
    async fn load(&self) -> Result<(), LoadError> {
        let loaded = self
            .strategy
            .load(&*self.transport, &self.url, self.committed_version())
            .await?;

        let mut slot = self.slot.write();
        let committed = slot.as_ref().map_or(0, |current| current.version);
        if committed > loaded.version {
            return Err(LoadError::AlreadyUpToDate(committed));
        }

        *slot = Some(loaded);
        Ok(())
    }

    async fn tick(&self) {
        if !self.accessed.swap(false, Ordering::AcqRel) {
            tracing::debug!(url = %self.url, "store not accessed since last tick, skipping refresh");
            return;
        }

        match self.load().await {
            Ok(()) => self
                .logger
                .info(&format!("stencil: refreshed descriptors from {}", self.url)),
            Err(LoadError::AlreadyUpToDate(version)) => self.logger.info(&format!(
                "stencil: descriptors from {} already up to date (version {version})",
                self.url
            )),
            Err(err) => self.logger.error(&format!(
                "stencil: failed to refresh descriptors from {}: {err}",
                self.url
            )),
        }
    }
}

async fn run_scheduler<T: Transport>(
    inner: Arc<Inner<T>>,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => inner.tick().await,
        }
    }

    tracing::debug!(url = %inner.url, "store scheduler stopped");
}
