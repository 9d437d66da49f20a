use crate::{Connection, Engine, Error, Result, ResultSet, Schema, SqlWriter, Value, deferred};
use std::{collections::HashMap, fmt, sync::Arc};

type Operation<E> = Arc<dyn Fn(&mut Entity<E>, &[Value]) -> Result<Value> + Send + Sync>;
type AdmitFn = Arc<dyn Fn(&[(String, Value)]) -> bool + Send + Sync>;

/// Per entity type capabilities: named operations every instance can
/// [`invoke`](Entity::invoke), plus an optional admit hook that can veto
/// instance construction. Composition replaces inheritance here; an entity
/// type is its schema plus whatever operations were attached at definition.
pub struct Behavior<E: Engine> {
    operations: HashMap<String, Operation<E>>,
    admit: Option<AdmitFn>,
}

impl<E: Engine> Behavior<E> {
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
            admit: None,
        }
    }

    /// Attaches a named operation to every instance of the entity type.
    pub fn operation(
        mut self,
        name: impl Into<String>,
        operation: impl Fn(&mut Entity<E>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.operations.insert(name.into(), Arc::new(operation));
        self
    }

    /// Rows the hook refuses never become instances; `find` skips them.
    pub fn admit(
        mut self,
        hook: impl Fn(&[(String, Value)]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.admit = Some(Arc::new(hook));
        self
    }
}

impl<E: Engine> Default for Behavior<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Engine> fmt::Debug for Behavior<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .field("admit", &self.admit.is_some())
            .finish()
    }
}

/// The class-like construct standing for one registered schema. Obtained from
/// [`Registry::define`](crate::Registry::define); hands out live row
/// instances and loads them back from the engine.
pub struct EntityType<E: Engine> {
    schema: Schema,
    connection: Arc<Connection<E>>,
    behavior: Behavior<E>,
}

impl<E: Engine> EntityType<E> {
    pub(crate) fn new(
        schema: Schema,
        connection: Arc<Connection<E>>,
        behavior: Behavior<E>,
    ) -> Arc<Self> {
        Arc::new(Self {
            schema,
            connection,
            behavior,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn connection(&self) -> &Arc<Connection<E>> {
        &self.connection
    }

    pub fn name(&self) -> &str {
        self.schema.entity_name()
    }

    /// Instance factory: merges the raw columns into a fresh instance.
    /// Returns `None` when the admit hook vetoes the row.
    pub fn entity(self: &Arc<Self>, columns: Vec<(String, Value)>) -> Option<Entity<E>> {
        if let Some(admit) = &self.behavior.admit
            && !admit(&columns)
        {
            return None;
        }
        let mut entity = Entity {
            class: self.clone(),
            fields: HashMap::new(),
        };
        entity.update(columns);
        Some(entity)
    }

    /// A fresh unsaved instance carrying the schema defaults.
    pub fn blank(self: &Arc<Self>) -> Entity<E> {
        let mut entity = Entity {
            class: self.clone(),
            fields: HashMap::new(),
        };
        entity.update(self.schema.default_columns());
        entity
    }

    /// Loads every row matching the raw `condition` fragment, materialized in
    /// result set order. An empty condition selects the whole table. Rows the
    /// admit hook vetoes are skipped. Instances are always freshly allocated;
    /// finding the same row twice yields two independent instances.
    pub async fn find(
        self: &Arc<Self>,
        condition: &str,
        params: &[Value],
    ) -> Result<Vec<Entity<E>>> {
        let this = self.clone();
        let condition = condition.to_owned();
        let params = params.to_vec();
        deferred(move |slot| async move {
            let mut sql = String::new();
            this.connection
                .sql_writer()
                .write_select(&mut sql, &this.schema, &condition);
            let ResultSet { labels, rows, .. } = this.connection.execute(&sql, &params).await?;
            let total = rows.len();
            let mut entities = Vec::with_capacity(total);
            for row in rows {
                let columns = labels.iter().cloned().zip(row.into_vec()).collect();
                if let Some(entity) = this.entity(columns) {
                    entities.push(entity);
                }
            }
            if this.connection.options().log {
                log::debug!(
                    "{}: materialized {} of {} rows",
                    this.name(),
                    entities.len(),
                    total
                );
            }
            slot.resolve(entities);
            Ok(())
        })
        .await
    }

    pub async fn find_all(self: &Arc<Self>) -> Result<Vec<Entity<E>>> {
        self.find("", &[]).await
    }
}

impl<E: Engine> fmt::Debug for EntityType<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("schema", &self.schema)
            .field("behavior", &self.behavior)
            .finish_non_exhaustive()
    }
}

/// A live row of its entity type: column-keyed values plus the identity
/// rules. Mutate it in memory, then [`save`](Entity::save) once.
pub struct Entity<E: Engine> {
    class: Arc<EntityType<E>>,
    fields: HashMap<String, Value>,
}

impl<E: Engine> Entity<E> {
    pub fn class(&self) -> &Arc<EntityType<E>> {
        &self.class
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Shallow merge of column values; later pairs win, untouched columns
    /// survive.
    pub fn update(&mut self, columns: impl IntoIterator<Item = (String, Value)>) -> &mut Self {
        for (column, value) in columns {
            self.fields.insert(column, value);
        }
        self
    }

    /// The primary key value when it is present: not absent, not `Null`, not
    /// an empty `Text`. Zero and `false` count as present.
    fn primary_key_value(&self) -> Option<&Value> {
        let value = self.fields.get(&self.class.schema.primary_key)?;
        match value {
            Value::Null => None,
            Value::Text(text) if text.is_empty() => None,
            _ => Some(value),
        }
    }

    /// An instance is saved when its primary key column holds a present
    /// value. A freshly built instance is unsaved until the first `save`.
    pub fn is_saved(&self) -> bool {
        self.primary_key_value().is_some()
    }

    /// Same entity type and same saved identity. Two unsaved instances are
    /// never equal, not even an instance compared against itself; identity
    /// only exists once the engine knows the row.
    pub fn is_equal(&self, other: &Entity<E>) -> bool {
        Arc::ptr_eq(&self.class, &other.class)
            && match (self.primary_key_value(), other.primary_key_value()) {
                (Some(mine), Some(theirs)) => mine == theirs,
                _ => false,
            }
    }

    /// Persists the instance: UPDATE when it already has a saved identity,
    /// INSERT otherwise. Absent columns are bound as `Null`, booleans as
    /// `1`/`0`; everything else is bound verbatim. On a successful insert the
    /// identifier the engine assigned (when it reports one) becomes the
    /// primary key value. A rejected statement leaves the instance untouched.
    pub async fn save(&mut self) -> Result<&mut Self> {
        let schema = &self.class.schema;
        let mut params: Vec<Value> = schema
            .columns
            .iter()
            .map(|column| match self.fields.get(column) {
                None | Some(Value::Null) => Value::Null,
                Some(Value::Boolean(value)) => Value::Integer(*value as i64),
                Some(value) => value.clone(),
            })
            .collect();
        let writer = self.class.connection.sql_writer();
        let mut sql = String::new();
        if let Some(key) = self.primary_key_value() {
            params.push(key.clone());
            writer.write_update(&mut sql, schema);
            self.class.connection.execute(&sql, &params).await?;
        } else {
            writer.write_insert(&mut sql, schema);
            let result = self.class.connection.execute(&sql, &params).await?;
            if let Some(id) = result.last_insert_id {
                self.fields
                    .insert(schema.primary_key.clone(), Value::Integer(id));
            }
        }
        Ok(self)
    }

    /// Deletes the row behind a saved instance and clears its identity, so
    /// the instance can be saved again as a new row. Unsaved instances
    /// resolve immediately without issuing any statement. On failure the
    /// primary key column is left untouched.
    pub async fn destroy(&mut self) -> Result<&mut Self> {
        let Some(key) = self.primary_key_value().cloned() else {
            return Ok(self);
        };
        let schema = &self.class.schema;
        let mut sql = String::new();
        self.class
            .connection
            .sql_writer()
            .write_delete(&mut sql, schema);
        self.class.connection.execute(&sql, &[key]).await?;
        let column = schema.primary_key.clone();
        self.fields.remove(&column);
        Ok(self)
    }

    /// Runs a named behavior operation against this instance.
    pub fn invoke(&mut self, operation: &str, args: &[Value]) -> Result<Value> {
        let class = self.class.clone();
        let operation = class.behavior.operations.get(operation).ok_or_else(|| {
            let error = Error::msg(format!(
                "Entity `{}` has no operation named `{}`",
                class.name(),
                operation,
            ));
            log::error!("{}", error);
            error
        })?;
        operation(self, args)
    }
}

impl<E: Engine> fmt::Debug for Entity<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("type", &self.class.name())
            .field("fields", &self.fields)
            .finish()
    }
}
