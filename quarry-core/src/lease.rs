use crate::{Connection, ConnectionString, ErrorContext, LeaseConfig, OrmError, Result};
use std::{
    collections::HashMap,
    fmt,
    ops::Deref,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak},
    thread::{self, ThreadId},
    time::Instant,
};
use tokio::{runtime::Handle, sync::OnceCell, task::JoinHandle};

thread_local! {
    /// Dropped when the thread exits, the lease entries keep a weak reference to it.
    static THREAD_ALIVE: Arc<()> = Arc::new(());
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LeaseKey {
    connection: String,
    thread: Option<ThreadId>,
}

struct LeaseEntry<C> {
    url: ConnectionString,
    connection: Arc<OnceCell<Arc<C>>>,
    references: usize,
    released_at: Option<Instant>,
    watcher: Option<JoinHandle<()>>,
    owner: Option<Weak<()>>,
    /// Bumped when the sweep takes the references away, older leases are then ignored.
    generation: u64,
    /// Bumped each time the references drop to zero, identifies the pending watcher.
    release_epoch: u64,
}

struct LeaseInner<C> {
    config: LeaseConfig,
    entries: Mutex<HashMap<LeaseKey, LeaseEntry<C>>>,
    runtime: OnceLock<Handle>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<C> Drop for LeaseInner<C> {
    fn drop(&mut self) {
        let sweeper = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(sweeper) = sweeper.take() {
            sweeper.abort();
        }
    }
}

/// Reference counted cache of open connections, keyed by connection string and calling
/// thread.
///
/// The first [`acquire`](LeaseManager::acquire) for a key opens the connection, the next ones
/// share it. When the last [`Lease`] is dropped the connection stays open for the grace
/// period and is closed only if nobody acquired it again in the meantime. Leases held by
/// threads that exited are reclaimed by [`sweep`](LeaseManager::sweep), which also runs
/// periodically in the background.
pub struct LeaseManager<C: Connection> {
    inner: Arc<LeaseInner<C>>,
}

impl<C: Connection> Clone for LeaseManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Connection> Default for LeaseManager<C> {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

impl<C: Connection> fmt::Debug for LeaseManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaseManager")
            .field("config", &self.inner.config)
            .field("entries", &self.len())
            .finish()
    }
}

impl<C: Connection> LeaseManager<C> {
    pub fn new(config: LeaseConfig) -> Self {
        Self {
            inner: Arc::new(LeaseInner {
                config,
                entries: Default::default(),
                runtime: OnceLock::new(),
                sweeper: Default::default(),
            }),
        }
    }

    pub fn config(&self) -> &LeaseConfig {
        &self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<LeaseKey, LeaseEntry<C>>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn key(&self, url: &ConnectionString) -> LeaseKey {
        LeaseKey {
            connection: url.key(),
            thread: self
                .inner
                .config
                .thread_affine
                .then(|| thread::current().id()),
        }
    }

    fn runtime(&self) -> Option<Handle> {
        Handle::try_current()
            .ok()
            .or_else(|| self.inner.runtime.get().cloned())
    }

    /// Shared connection for `url`, opened on the first acquire of the key.
    ///
    /// Acquiring during the grace period of a released connection cancels its disposal.
    pub async fn acquire(&self, url: &ConnectionString) -> Result<Lease<C>> {
        if let Ok(handle) = Handle::try_current() {
            let _ = self.inner.runtime.set(handle);
        }
        self.start_sweeper();
        let key = self.key(url);
        let (cell, url, guard) = {
            let mut entries = self.lock();
            let entry = entries.entry(key.clone()).or_insert_with(|| LeaseEntry {
                url: url.clone(),
                connection: Default::default(),
                references: 0,
                released_at: None,
                watcher: None,
                owner: self
                    .inner
                    .config
                    .thread_affine
                    .then(|| THREAD_ALIVE.with(Arc::downgrade)),
                generation: 0,
                release_epoch: 0,
            });
            if let Some(watcher) = entry.watcher.take() {
                watcher.abort();
                log::debug!("Reusing {} within its grace period", entry.url);
            }
            if entry.references == 0 && entry.connection.get().is_none() && entry.url != *url {
                entry.url = url.clone();
            }
            entry.references += 1;
            entry.released_at = None;
            let guard = ReleaseGuard {
                manager: self.clone(),
                key,
                generation: entry.generation,
            };
            (entry.connection.clone(), entry.url.clone(), guard)
        };
        let connection = cell
            .get_or_try_init(|| async {
                log::debug!("Opening connection to {url}");
                C::connect(&url).await.map(Arc::new)
            })
            .await
            .map_err(|e| {
                let e = e.context(OrmError::Connection(format!(
                    "Could not open a connection to {url}"
                )));
                log::error!("{:#}", e);
                e
            })?
            .clone();
        Ok(Lease { connection, guard })
    }

    fn release(&self, key: &LeaseKey, generation: u64) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.generation != generation {
            return;
        }
        entry.references = entry.references.saturating_sub(1);
        if entry.references == 0 {
            self.schedule_close(key, entry);
        }
    }

    fn schedule_close(&self, key: &LeaseKey, entry: &mut LeaseEntry<C>) {
        entry.released_at = Some(Instant::now());
        entry.release_epoch += 1;
        let epoch = entry.release_epoch;
        if let Some(watcher) = entry.watcher.take() {
            watcher.abort();
        }
        let Some(runtime) = self.runtime() else {
            log::warn!(
                "No async runtime available, {} stays open until the manager is dropped",
                entry.url
            );
            return;
        };
        let manager = self.clone();
        let key = key.clone();
        let grace_period = self.inner.config.grace_period;
        entry.watcher = Some(runtime.spawn(async move {
            tokio::time::sleep(grace_period).await;
            manager.close_if_idle(&key, epoch).await;
        }));
    }

    async fn close_if_idle(&self, key: &LeaseKey, epoch: u64) {
        let (url, cell) = {
            let mut entries = self.lock();
            match entries.get(key) {
                Some(entry) if entry.references == 0 && entry.release_epoch == epoch => {}
                _ => return,
            }
            let Some(entry) = entries.remove(key) else {
                return;
            };
            (entry.url, entry.connection)
        };
        let Some(connection) = Arc::try_unwrap(cell).ok().and_then(OnceCell::into_inner) else {
            return;
        };
        let Ok(connection) = Arc::try_unwrap(connection) else {
            log::warn!("Connection to {url} is still referenced, dropping it without closing");
            return;
        };
        match connection
            .disconnect()
            .await
            .with_context(|| format!("While closing the connection to {url}"))
        {
            Ok(()) => log::debug!("Closed connection to {url}"),
            Err(e) => log::error!("{:#}", e),
        }
    }

    /// Takes the references away from the leases of threads that exited, returns how many
    /// entries were reclaimed. Their connections are then closed after the grace period.
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock();
        let mut swept = 0;
        for (key, entry) in entries.iter_mut() {
            let dead = entry
                .owner
                .as_ref()
                .is_some_and(|owner| owner.strong_count() == 0);
            if !dead || entry.references == 0 {
                continue;
            }
            log::debug!(
                "Sweeping {} leases of {} held by an exited thread",
                entry.references,
                entry.url
            );
            entry.references = 0;
            entry.generation += 1;
            self.schedule_close(key, entry);
            swept += 1;
        }
        swept
    }

    fn start_sweeper(&self) {
        if !self.inner.config.thread_affine {
            return;
        }
        let mut sweeper = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if sweeper.is_some() {
            return;
        }
        let Some(runtime) = self.runtime() else {
            return;
        };
        let inner = Arc::downgrade(&self.inner);
        let period = self.inner.config.sweep_interval;
        *sweeper = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                LeaseManager { inner }.sweep();
            }
        }));
    }

    /// References held on `url` by the calling thread.
    pub fn references(&self, url: &ConnectionString) -> usize {
        self.lock()
            .get(&self.key(url))
            .map(|e| e.references)
            .unwrap_or_default()
    }

    /// The connection for `url` and the calling thread is open, possibly in its grace period.
    pub fn is_open(&self, url: &ConnectionString) -> bool {
        self.lock()
            .get(&self.key(url))
            .is_some_and(|e| e.connection.initialized())
    }

    /// Moment the references on `url` dropped to zero, if they did.
    pub fn released_at(&self, url: &ConnectionString) -> Option<Instant> {
        self.lock().get(&self.key(url)).and_then(|e| e.released_at)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct ReleaseGuard<C: Connection> {
    manager: LeaseManager<C>,
    key: LeaseKey,
    generation: u64,
}

impl<C: Connection> Drop for ReleaseGuard<C> {
    fn drop(&mut self) {
        self.manager.release(&self.key, self.generation);
    }
}

/// A reference on a shared connection, released when dropped.
pub struct Lease<C: Connection> {
    // Dropped before the guard
    connection: Arc<C>,
    guard: ReleaseGuard<C>,
}

impl<C: Connection> Lease<C> {
    pub fn handle(&self) -> &Arc<C> {
        &self.connection
    }

    /// Connection string this lease was acquired for.
    pub fn key(&self) -> &str {
        &self.guard.key.connection
    }

    pub fn release(self) {}
}

impl<C: Connection> Deref for Lease<C> {
    type Target = C;
    fn deref(&self) -> &C {
        &self.connection
    }
}

impl<C: Connection> fmt::Debug for Lease<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease").field("key", &self.key()).finish()
    }
}
