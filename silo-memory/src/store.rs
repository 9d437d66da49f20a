use silo::Value;
use std::collections::{BTreeMap, HashMap};

/// The whole database. Cheap to clone, which is what gives transactions
/// their snapshot: they work on a clone and commit by writing it back.
#[derive(Clone, Debug, Default)]
pub(crate) struct Store {
    pub(crate) tables: HashMap<String, Table>,
}

/// Rows are keyed by an internal rowid so scans replay insertion order.
#[derive(Clone, Debug)]
pub(crate) struct Table {
    pub(crate) columns: Vec<String>,
    pub(crate) primary_key: Option<String>,
    pub(crate) auto_key: bool,
    pub(crate) next_key: i64,
    pub(crate) next_rowid: u64,
    pub(crate) rows: BTreeMap<u64, HashMap<String, Value>>,
}

impl Table {
    pub(crate) fn new(columns: Vec<String>, primary_key: Option<String>, auto_key: bool) -> Self {
        Self {
            columns,
            primary_key,
            auto_key,
            next_key: 1,
            next_rowid: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl Store {
    /// Rough accounting of the bytes held, checked against the connection's
    /// size limit after every mutating statement.
    pub(crate) fn estimated_size(&self) -> u64 {
        self.tables
            .values()
            .map(|table| {
                let header = table
                    .columns
                    .iter()
                    .map(|column| column.len() as u64)
                    .sum::<u64>();
                let rows = table
                    .rows
                    .values()
                    .flat_map(|row| row.values())
                    .map(value_size)
                    .sum::<u64>();
                header + rows
            })
            .sum()
    }
}

fn value_size(value: &Value) -> u64 {
    match value {
        Value::Null | Value::Boolean(_) => 1,
        Value::Integer(_) | Value::Float(_) => 8,
        Value::Text(text) => 24 + text.len() as u64,
    }
}
