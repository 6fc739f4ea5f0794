use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use sqlweave::session::ConnectionFactory;
use sqlweave::{Result, SqlWeaveError};

/// Stand-in physical connection carrying the factory call that created it
#[derive(Debug)]
pub struct MockConnection {
    pub serial: usize,
}

/// Factory that counts how many connections it has opened
#[derive(Clone, Default)]
pub struct CountingFactory {
    calls: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl CountingFactory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

impl ConnectionFactory for CountingFactory {
    type Connection = MockConnection;

    fn connect(&self) -> Result<MockConnection> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SqlWeaveError::connection("mock", "connection refused"));
        }
        let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockConnection { serial })
    }
}
