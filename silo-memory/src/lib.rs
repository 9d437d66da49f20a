mod engine;
mod eval;
mod interpret;
mod store;
mod transaction;

pub(crate) use eval::*;
pub(crate) use interpret::*;
pub(crate) use store::*;

pub use engine::*;
pub use transaction::*;
