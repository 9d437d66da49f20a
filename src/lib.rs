mod connection;
mod engine;
mod entity;
mod registry;
mod schema;
mod sql_writer;
mod task;
mod util;
mod value;

pub use ::anyhow::Context;
pub use connection::*;
pub use engine::*;
pub use entity::*;
pub use registry::*;
pub use schema::*;
pub use sql_writer::*;
pub use task::*;
pub use util::*;
pub use value::*;
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
