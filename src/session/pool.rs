use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, info, warn};

use crate::sql::Dialect;
use crate::Result;

/// Opens physical connections on demand for a [`SessionPool`].
pub trait ConnectionFactory: Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Open a new physical connection. May block on I/O; never called with the pool lock held.
    fn connect(&self) -> Result<Self::Connection>;

    /// SQL dialect spoken by connections from this factory
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

/// A physical connection tagged with the serial id the pool assigned when it was opened
struct Pooled<C> {
    id: u64,
    conn: C,
}

struct PoolState<C> {
    /// Idle connections, most recently released at the front
    reserve: VecDeque<Pooled<C>>,
    epoch: u64,
    reused: u64,
    discarded: u64,
}

struct PoolShared<C> {
    state: Mutex<PoolState<C>>,
    opened: AtomicU64,
}

impl<C> PoolShared<C> {
    fn release(&self, pooled: Pooled<C>, checkout_epoch: u64) {
        let mut state = self.state.lock();
        if state.epoch == checkout_epoch {
            debug!("Returning connection {} to reserve (epoch {})", pooled.id, checkout_epoch);
            state.reserve.push_front(pooled);
            return;
        }

        state.discarded += 1;
        let current = state.epoch;
        drop(state);

        debug!(
            "Discarding stale connection {} (checked out at epoch {}, pool now at {})",
            pooled.id, checkout_epoch, current
        );
        drop(pooled);
    }
}

/// Point-in-time view of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub idle: usize,
    pub epoch: u64,
    pub opened: u64,
    pub reused: u64,
    pub discarded: u64,
}

/// Keeps idle connections for reuse and invalidates checked-out ones lazily via an epoch.
///
/// The pool never caps how many connections exist; when the reserve is empty
/// it asks the factory for another one.
pub struct SessionPool<F: ConnectionFactory> {
    factory: F,
    shared: Arc<PoolShared<F::Connection>>,
}

impl<F: ConnectionFactory> SessionPool<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState {
                    reserve: VecDeque::new(),
                    epoch: 0,
                    reused: 0,
                    discarded: 0,
                }),
                opened: AtomicU64::new(0),
            }),
        }
    }

    /// Check out a session, reusing the most recently released connection when one is idle
    pub fn get(&self) -> Result<Session<F::Connection>> {
        let (idle, epoch) = {
            let mut state = self.shared.state.lock();
            let idle = state.reserve.pop_front();
            if idle.is_some() {
                state.reused += 1;
            }
            (idle, state.epoch)
        };

        let pooled = match idle {
            Some(pooled) => {
                debug!("Reusing connection {} (epoch {})", pooled.id, epoch);
                pooled
            }
            None => {
                let conn = self.factory.connect().inspect_err(|e| {
                    warn!("Failed to open connection: {}", e);
                })?;
                let id = self.shared.opened.fetch_add(1, Ordering::Relaxed) + 1;
                info!("Opened connection {} (epoch {})", id, epoch);
                Pooled { id, conn }
            }
        };

        let pool = Arc::downgrade(&self.shared);
        Ok(Session::checked_out(pooled, epoch, move |pooled| {
            // A pool that is gone has nowhere to put the connection; dropping closes it
            if let Some(shared) = pool.upgrade() {
                shared.release(pooled, epoch);
            }
        }))
    }

    /// Close every idle connection and advance the epoch.
    ///
    /// Sessions that are checked out keep working; their connections are
    /// discarded instead of returned when they are released.
    pub fn reset(&self) {
        let (stale, epoch) = {
            let mut state = self.shared.state.lock();
            state.epoch += 1;
            (std::mem::take(&mut state.reserve), state.epoch)
        };
        info!("Session pool reset to epoch {} ({} idle connections closed)", epoch, stale.len());
        drop(stale);
    }

    pub fn epoch(&self) -> u64 {
        self.shared.state.lock().epoch
    }

    pub fn idle_connections(&self) -> usize {
        self.shared.state.lock().reserve.len()
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        PoolStats {
            idle: state.reserve.len(),
            epoch: state.epoch,
            opened: self.shared.opened.load(Ordering::Relaxed),
            reused: state.reused,
            discarded: state.discarded,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}

type ReleaseFn<C> = Box<dyn FnOnce(Pooled<C>) + Send + Sync>;

struct SessionInner<C> {
    id: u64,
    checkout_epoch: u64,
    conn: ReentrantMutex<Option<C>>,
    on_release: Option<ReleaseFn<C>>,
}

impl<C> Drop for SessionInner<C> {
    fn drop(&mut self) {
        if let (Some(conn), Some(release)) = (self.conn.get_mut().take(), self.on_release.take()) {
            release(Pooled { id: self.id, conn });
        }
    }
}

/// Shared handle to one checked-out physical connection.
///
/// Cloning adds an owner. When the last owner drops, the connection goes back
/// to the pool it came from, or is closed if the pool was reset meanwhile.
pub struct Session<C> {
    inner: Arc<SessionInner<C>>,
}

impl<C> Session<C> {
    fn checked_out(
        pooled: Pooled<C>,
        checkout_epoch: u64,
        on_release: impl FnOnce(Pooled<C>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: pooled.id,
                checkout_epoch,
                conn: ReentrantMutex::new(Some(pooled.conn)),
                on_release: Some(Box::new(on_release)),
            }),
        }
    }

    /// Serial id of the physical connection behind this session
    pub fn connection_id(&self) -> u64 {
        self.inner.id
    }

    /// Pool epoch at the time this session was checked out
    pub fn checkout_epoch(&self) -> u64 {
        self.inner.checkout_epoch
    }

    /// Object identity, not connection equality
    pub fn ptr_eq(a: &Session<C>, b: &Session<C>) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn owners(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn downgrade(&self) -> WeakSession<C> {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Run `f` with the connection locked to the calling thread.
    ///
    /// The lock is reentrant: nested work on the same thread that reaches
    /// this session again (e.g. through `Database::get_session`) shares it.
    /// Other threads block until the outermost call returns.
    pub fn with_connection<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        let guard = self.inner.conn.lock();
        let conn = guard
            .as_ref()
            .expect("session connection is only taken when the last owner drops");
        f(conn)
    }
}

impl<C> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> PartialEq for Session<C> {
    fn eq(&self, other: &Self) -> bool {
        Session::ptr_eq(self, other)
    }
}

impl<C> Eq for Session<C> {}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("connection_id", &self.inner.id)
            .field("checkout_epoch", &self.inner.checkout_epoch)
            .field("owners", &self.owners())
            .finish()
    }
}

/// Non-owning observation of a [`Session`]; expires when the last owner drops it
pub struct WeakSession<C> {
    inner: Weak<SessionInner<C>>,
}

impl<C> WeakSession<C> {
    pub fn upgrade(&self) -> Option<Session<C>> {
        self.inner.upgrade().map(|inner| Session { inner })
    }

    pub fn is_expired(&self) -> bool {
        self.inner.strong_count() == 0
    }

    /// True if this observes `session` and `session` is still alive
    pub fn refers_to(&self, session: &Session<C>) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(&session.inner)) && !self.is_expired()
    }
}

impl<C> Clone for WeakSession<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}
