use crate::{MemoryTransaction, Store};
use silo::{ConnectOptions, Engine, GenericSqlWriter, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Self-contained in-memory engine. Every opened engine owns an independent
/// store, so two connections never share data; useful as the default engine
/// in tests and demos wherever a real database would be overkill.
#[derive(Debug)]
pub struct MemoryEngine {
    store: Mutex<Store>,
    executed: AtomicU64,
    max_size: u64,
    name: String,
}

impl MemoryEngine {
    /// Number of statements this engine was asked to run, including failed
    /// ones. Lets callers assert that an operation stayed purely in memory.
    pub fn executed_statements(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Engine for MemoryEngine {
    type Transaction<'c> = MemoryTransaction<'c>;
    type SqlWriter = GenericSqlWriter;

    async fn open(options: &ConnectOptions) -> Result<Self> {
        log::debug!("Opening in-memory engine `{}`", options.name);
        Ok(Self {
            store: Mutex::new(Store::default()),
            executed: AtomicU64::new(0),
            max_size: options.max_size,
            name: options.name.clone(),
        })
    }

    async fn begin(&self) -> Result<MemoryTransaction<'_>> {
        let guard = self.store.lock().await;
        Ok(MemoryTransaction::new(guard, &self.executed, self.max_size))
    }

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }
}
