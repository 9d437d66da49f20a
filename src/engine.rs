use crate::{ConnectOptions, Result, SqlWriter, Value};
use std::{future::Future, sync::Arc};

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// Everything an engine reports back for one executed statement. Queries fill
/// `labels` and `rows`; modify statements fill `rows_affected` and, for
/// inserts where the engine assigned the key, `last_insert_id`.
#[derive(Debug, Default, Clone)]
pub struct ResultSet {
    pub labels: RowNames,
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

impl ResultSet {
    /// A rows-less result for modify statements.
    pub fn affected(rows_affected: u64, last_insert_id: Option<i64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
            ..Default::default()
        }
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.labels.iter().position(|label| label == column)?;
        self.rows.get(row)?.get(index)
    }
}

/// Boundary between the mapping layer and an actual SQL engine.
///
/// The layer needs very little: open a handle from [`ConnectOptions`], begin
/// a transaction, and know which [`SqlWriter`] dialect to synthesize
/// statements with. Everything else (storage, parsing, constraint
/// enforcement) stays behind this seam.
pub trait Engine: Send + Sync + Sized + 'static {
    type Transaction<'c>: EngineTransaction + Send
    where
        Self: 'c;
    type SqlWriter: SqlWriter;

    fn open(options: &ConnectOptions) -> impl Future<Output = Result<Self>> + Send;
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction<'_>>> + Send;
    fn sql_writer(&self) -> Self::SqlWriter;
}

/// A transaction handed out by [`Engine::begin`]. The mapping layer runs
/// exactly one statement per transaction; `commit` and `rollback` consume the
/// transaction so nothing can execute on it afterwards.
pub trait EngineTransaction: Send {
    fn execute_statement(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<ResultSet>> + Send;
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
