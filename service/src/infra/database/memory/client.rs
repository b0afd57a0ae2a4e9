//! In-memory database client definitions.

use std::{collections::HashMap, future::Future, mem, sync::Arc};

use common::DateTime;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracerr::Traced;

use crate::{
    domain::{duty, setting},
    infra::database,
};

use super::state::{Staged, State, View, Write};

/// Connection to the stored data.
pub trait Connection {
    /// Runs the provided function upon a consistent [`View`] of the stored
    /// data.
    fn view<R>(&self, f: impl FnOnce(View<'_>) -> R) -> impl Future<Output = R>;

    /// Performs the provided [`Write`].
    ///
    /// # Errors
    ///
    /// If the [`Write`] violates a constraint of the stored data.
    fn write(
        &self,
        write: Write,
    ) -> impl Future<Output = Result<(), Traced<database::Error>>>;

    /// Allocates the next trip sequence number of the day the provided
    /// [`DateTime`] belongs to.
    ///
    /// Allocations are never rolled back.
    fn next_trip_sequence(&self, at: DateTime) -> impl Future<Output = u32>;
}

/// Key of a lockable document.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum LockKey {
    /// [`Duty`] document.
    ///
    /// [`Duty`]: crate::domain::Duty
    Duty(duty::Id),

    /// [`Setting`] document.
    ///
    /// [`Setting`]: crate::domain::Setting
    Setting(setting::Key),
}

/// Data shared between all the clients.
#[derive(Debug, Default)]
struct Store {
    /// Committed [`State`].
    state: RwLock<State>,

    /// Document locks.
    ///
    /// Only the locks being held or waited for are kept.
    locks: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

/// Forgets the locks nobody holds or waits for.
fn prune(locks: &mut HashMap<LockKey, Arc<Mutex<()>>>) {
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
}

/// Non-transactional in-memory database client.
///
/// Every [`Write`] is committed immediately.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`Store`].
    store: Arc<Store>,
}

impl Connection for NonTx {
    async fn view<R>(&self, f: impl FnOnce(View<'_>) -> R) -> R {
        let state = self.store.state.read().await;
        f(View::committed(&state))
    }

    async fn write(&self, write: Write) -> Result<(), Traced<database::Error>> {
        let mut state = self.store.state.write().await;
        write
            .check(View::committed(&state))
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        state.apply(write);
        Ok(())
    }

    async fn next_trip_sequence(&self, at: DateTime) -> u32 {
        self.store.state.write().await.next_trip_sequence(at)
    }
}

#[cfg(test)]
impl NonTx {
    /// Returns the number of the document locks being remembered.
    pub(crate) async fn lock_count(&self) -> usize {
        self.store.locks.lock().await.len()
    }
}

/// Transactional in-memory database client.
///
/// [`Write`]s are staged until the [`Tx::commit()`], and discarded if the
/// client is dropped without it. Acquired locks are held until then too.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Shared [`Store`].
    store: Arc<Store>,

    /// Inner representation of this client.
    inner: Arc<Mutex<Inner>>,
}

/// Inner representation of the [`Tx`] client.
#[derive(Debug, Default)]
struct Inner {
    /// [`Staged`] writes.
    staged: Staged,

    /// Guards of the acquired locks.
    guards: HashMap<LockKey, OwnedMutexGuard<()>>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: &NonTx) -> Self {
        Self {
            store: Arc::clone(&client.store),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Acquires the lock of the document with the provided [`LockKey`],
    /// waiting for other [`Tx`] clients to release it.
    ///
    /// Re-acquiring an already held lock is a no-op.
    pub(crate) async fn lock(&self, key: LockKey) {
        if self.inner.lock().await.guards.contains_key(&key) {
            return;
        }

        let lock = Arc::clone(self.store.locks.lock().await.entry(key).or_default());
        let guard = lock.lock_owned().await;
        _ = self.inner.lock().await.guards.insert(key, guard);
    }

    /// Commits this [`Tx`] client, releasing all its locks.
    ///
    /// # Errors
    ///
    /// Never for the in-memory store.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let mut inner = self.inner.lock().await;
        let staged = mem::take(&mut inner.staged);
        self.store.state.write().await.commit(staged);
        inner.guards.clear();
        prune(&mut *self.store.locks.lock().await);
        Ok(())
    }
}

impl Drop for Tx {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) > 1 {
            return;
        }
        if let Ok(mut inner) = self.inner.try_lock() {
            inner.guards.clear();
        }
        // Skipped locks are pruned by the next commit.
        if let Ok(mut locks) = self.store.locks.try_lock() {
            prune(&mut locks);
        }
    }
}

impl Connection for Tx {
    async fn view<R>(&self, f: impl FnOnce(View<'_>) -> R) -> R {
        let inner = self.inner.lock().await;
        let state = self.store.state.read().await;
        f(View::staged(&state, &inner.staged))
    }

    async fn write(&self, write: Write) -> Result<(), Traced<database::Error>> {
        let mut inner = self.inner.lock().await;
        let state = self.store.state.read().await;
        write
            .check(View::staged(&state, &inner.staged))
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        inner.staged.apply(write);
        Ok(())
    }

    async fn next_trip_sequence(&self, at: DateTime) -> u32 {
        self.store.state.write().await.next_trip_sequence(at)
    }
}
