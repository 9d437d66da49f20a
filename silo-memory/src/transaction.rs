use crate::{Store, run_statement};
use silo::{EngineTransaction, Error, Result, ResultSet, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::MutexGuard;

/// Snapshot transaction over the engine's store. Statements run against a
/// working clone taken at `begin`; `commit` writes the clone back over the
/// shared store and `rollback` simply drops it. Holding the store guard for
/// the transaction's lifetime serializes writers.
pub struct MemoryTransaction<'c> {
    guard: MutexGuard<'c, Store>,
    working: Store,
    executed: &'c AtomicU64,
    max_size: u64,
}

impl<'c> MemoryTransaction<'c> {
    pub(crate) fn new(guard: MutexGuard<'c, Store>, executed: &'c AtomicU64, max_size: u64) -> Self {
        let working = guard.clone();
        Self {
            guard,
            working,
            executed,
            max_size,
        }
    }
}

impl EngineTransaction for MemoryTransaction<'_> {
    async fn execute_statement(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        self.executed.fetch_add(1, Ordering::Relaxed);
        let result = run_statement(&mut self.working, sql, params)?;
        let size = self.working.estimated_size();
        if size > self.max_size {
            return Err(Error::msg(format!(
                "Storage size {size} exceeds the configured limit of {} bytes",
                self.max_size
            )));
        }
        Ok(result)
    }

    async fn commit(self) -> Result<()> {
        let Self {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
