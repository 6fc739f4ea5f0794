use std::collections::HashMap;
use std::fmt;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::session::pool::{Session, WeakSession};

/// Identifies the execution context a cached session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    Thread(ThreadId),
    /// An explicit unit of work, e.g. a task or request handled across threads
    Scope(Uuid),
}

impl ContextKey {
    pub fn current_thread() -> Self {
        ContextKey::Thread(thread::current().id())
    }

    pub fn new_scope() -> Self {
        ContextKey::Scope(Uuid::new_v4())
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKey::Thread(id) => write!(f, "thread {id:?}"),
            ContextKey::Scope(id) => write!(f, "scope {id}"),
        }
    }
}

/// Per-context weak observations of the most recently issued session.
///
/// Holds no ownership: a slot goes stale as soon as every owner of its
/// session has dropped it.
pub struct SessionFinder<C> {
    slots: Mutex<Slots<C>>,
    prune_threshold: usize,
}

struct Slots<C> {
    map: HashMap<ContextKey, WeakSession<C>>,
    /// Slot count above which the next observation prunes
    prune_at: usize,
}

impl<C> SessionFinder<C> {
    pub fn new(prune_threshold: usize) -> Self {
        let prune_threshold = prune_threshold.max(1);
        Self {
            slots: Mutex::new(Slots {
                map: HashMap::new(),
                prune_at: prune_threshold,
            }),
            prune_threshold,
        }
    }

    /// The context's session, if one is still alive
    #[inline]
    pub fn find(&self, context: &ContextKey) -> Option<Session<C>> {
        self.slots.lock().map.get(context).and_then(WeakSession::upgrade)
    }

    /// Remember `session` as the context's current one
    pub fn observe(&self, context: ContextKey, session: &Session<C>) {
        let mut slots = self.slots.lock();
        slots.map.insert(context, session.downgrade());

        if slots.map.len() > slots.prune_at {
            let before = slots.map.len();
            slots.map.retain(|_, weak| !weak.is_expired());
            let live = slots.map.len();
            // Live slots survive pruning; wait for the map to double before scanning again
            slots.prune_at = self.prune_threshold.max(live * 2);
            debug!(
                "Pruned {} expired session observations, next prune above {}",
                before - live,
                slots.prune_at
            );
        }
    }

    pub fn is_observing(&self, context: &ContextKey, session: &Session<C>) -> bool {
        self.slots
            .lock()
            .map
            .get(context)
            .is_some_and(|weak| weak.refers_to(session))
    }

    /// Drop the context's observation without touching the session itself
    pub fn forget(&self, context: &ContextKey) {
        self.slots.lock().map.remove(context);
    }

    /// Number of slots, live or expired
    pub fn len(&self) -> usize {
        self.slots.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
