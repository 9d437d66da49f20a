use crate::{Error, Result, Value};
use std::{fmt, sync::Arc};

type DefaultsFn = Arc<dyn Fn() -> Vec<(String, Value)> + Send + Sync>;

/// Where the starting columns of a blank entity come from.
#[derive(Clone, Default)]
pub enum Defaults {
    #[default]
    None,
    /// Fixed column values merged into every blank entity.
    Map(Vec<(String, Value)>),
    /// Invoked once per blank entity, so every instance gets fresh values.
    With(DefaultsFn),
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defaults::None => f.write_str("None"),
            Defaults::Map(columns) => f.debug_tuple("Map").field(columns).finish(),
            Defaults::With(..) => f.write_str("With(..)"),
        }
    }
}

/// Immutable description of one mapped table: its name, the ordered column
/// list statements are synthesized from, the primary key column and the
/// defaults for blank instances.
///
/// The primary key does not have to be listed in `columns`; engines that
/// assign it (`INTEGER PRIMARY KEY` and the like) never receive it on insert.
#[derive(Debug, Clone)]
pub struct Schema {
    pub table: String,
    pub columns: Vec<String>,
    pub primary_key: String,
    /// Logical entity name, empty means "use the table name".
    pub name: String,
    pub defaults: Defaults,
}

impl Schema {
    /// A schema with primary key `id`, the entity name defaulting to the
    /// table name and no defaults.
    pub fn new(
        table: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            primary_key: "id".into(),
            name: String::new(),
            defaults: Defaults::None,
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Registers the entity under this name instead of the table name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fixed defaults merged into every blank instance.
    pub fn defaults(
        mut self,
        columns: impl IntoIterator<Item = (impl Into<String>, impl Into<Value>)>,
    ) -> Self {
        self.defaults = Defaults::Map(
            columns
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        );
        self
    }

    /// A producer called for each blank instance.
    pub fn defaults_with(
        mut self,
        producer: impl Fn() -> Vec<(String, Value)> + Send + Sync + 'static,
    ) -> Self {
        self.defaults = Defaults::With(Arc::new(producer));
        self
    }

    /// The name the entity type is registered under.
    pub fn entity_name(&self) -> &str {
        if self.name.is_empty() {
            &self.table
        } else {
            &self.name
        }
    }

    pub(crate) fn default_columns(&self) -> Vec<(String, Value)> {
        match &self.defaults {
            Defaults::None => Vec::new(),
            Defaults::Map(columns) => columns.clone(),
            Defaults::With(producer) => producer(),
        }
    }

    /// Checked at definition time so misuse surfaces before any statement is
    /// synthesized from the schema.
    pub fn validate(&self) -> Result<()> {
        if self.table.is_empty() {
            return Err(Error::msg("Cannot define an entity without a table name"));
        }
        if self.columns.is_empty() {
            return Err(Error::msg(format!(
                "Cannot define an entity on table `{}` without columns",
                self.table,
            )));
        }
        if self.columns.iter().any(|column| column.is_empty()) {
            return Err(Error::msg(format!(
                "Schema for table `{}` contains an empty column name",
                self.table,
            )));
        }
        if self.primary_key.is_empty() {
            return Err(Error::msg(format!(
                "Schema for table `{}` has an empty primary key column",
                self.table,
            )));
        }
        Ok(())
    }
}
