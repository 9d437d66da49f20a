use crate::{Behavior, ConnectOptions, Connection, Engine, EntityType, Error, Result, Schema};
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::sync::Mutex;

/// Caller-owned catalog of entity types. Owns the default connection,
/// opened lazily the first time a definition needs one, and maps each
/// entity name to its [`EntityType`]. Applications typically keep one
/// registry for their whole lifetime, but nothing stops a test from
/// holding several independent ones.
pub struct Registry<E: Engine> {
    connection: Mutex<Option<Arc<Connection<E>>>>,
    entities: Mutex<HashMap<String, Arc<EntityType<E>>>>,
}

impl<E: Engine> Registry<E> {
    pub fn new() -> Self {
        Self {
            connection: Mutex::new(None),
            entities: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the default connection, or opens one. `None` reuses the
    /// memoized default when it exists; passing options always opens a fresh
    /// connection. Whichever connection is produced first becomes the
    /// registry default.
    pub async fn open(&self, options: Option<ConnectOptions>) -> Result<Arc<Connection<E>>> {
        let mut default = self.connection.lock().await;
        if let (Some(connection), None) = (&*default, &options) {
            return Ok(connection.clone());
        }
        let connection = Arc::new(Connection::open(options.unwrap_or_default()).await?);
        if default.is_none() {
            *default = Some(connection.clone());
        }
        Ok(connection)
    }

    /// Defines an entity type on the registry's default connection.
    pub async fn define(
        &self,
        schema: Schema,
        behavior: Behavior<E>,
    ) -> Result<Arc<EntityType<E>>> {
        let connection = self.open(None).await?;
        self.define_on(schema, behavior, &connection).await
    }

    /// Defines an entity type bound to an explicit connection. The schema is
    /// validated up front and the entity name must be free; redefining an
    /// existing name is an error rather than a silent replacement.
    pub async fn define_on(
        &self,
        schema: Schema,
        behavior: Behavior<E>,
        connection: &Arc<Connection<E>>,
    ) -> Result<Arc<EntityType<E>>> {
        schema.validate()?;
        let name = schema.entity_name().to_owned();
        let mut entities = self.entities.lock().await;
        if entities.contains_key(&name) {
            let error = Error::msg(format!("Entity `{}` is already defined", name));
            log::error!("{}", error);
            return Err(error);
        }
        let entity_type = EntityType::new(schema, connection.clone(), behavior);
        entities.insert(name, entity_type.clone());
        Ok(entity_type)
    }

    pub async fn entity_type(&self, name: &str) -> Option<Arc<EntityType<E>>> {
        self.entities.lock().await.get(name).cloned()
    }
}

impl<E: Engine> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Engine> fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}
