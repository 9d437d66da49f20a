use crate::{Engine, EngineTransaction, Result, ResultSet, Value};
use std::fmt;

/// Connection parameters handed to [`Engine::open`]. The fields mirror what a
/// browser-era SQL database wanted to know about its caller; engines are free
/// to ignore what does not apply to them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    pub name: String,
    pub version: String,
    pub display_name: String,
    /// Storage budget in bytes the engine may enforce.
    pub max_size: u64,
    /// Report every statement and its parameters to the log before running.
    pub log: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            name: "anonymous".into(),
            version: "1.0".into(),
            display_name: "anonymous".into(),
            max_size: 1_048_576,
            log: false,
        }
    }
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = value.into();
        self
    }
    pub fn version(mut self, value: impl Into<String>) -> Self {
        self.version = value.into();
        self
    }
    pub fn display_name(mut self, value: impl Into<String>) -> Self {
        self.display_name = value.into();
        self
    }
    pub fn max_size(mut self, value: u64) -> Self {
        self.max_size = value;
        self
    }
    pub fn log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }
}

/// A live engine handle shared by every entity type bound to it.
///
/// `execute` is the whole surface: one statement, wrapped in its own
/// transaction, committed on success. There is no multi statement transaction
/// and no retry; a failed statement is rolled back best effort and the engine
/// error propagates unchanged.
pub struct Connection<E: Engine> {
    engine: E,
    options: ConnectOptions,
}

impl<E: Engine> Connection<E> {
    pub async fn open(options: ConnectOptions) -> Result<Self> {
        let engine = E::open(&options).await?;
        Ok(Self { engine, options })
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn sql_writer(&self) -> E::SqlWriter {
        self.engine.sql_writer()
    }

    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        if self.options.log {
            log::debug!("Executing `{}` with {:?}", sql, params);
        }
        let mut transaction = self.engine.begin().await?;
        match transaction.execute_statement(sql, params).await {
            Ok(result) => {
                transaction.commit().await?;
                Ok(result)
            }
            Err(error) => {
                log::error!("{}", error);
                if let Err(error) = transaction.rollback().await {
                    log::error!("{}", error);
                }
                Err(error)
            }
        }
    }
}

impl<E: Engine> fmt::Debug for Connection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
