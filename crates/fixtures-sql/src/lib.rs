mod insert;
mod models;
mod schema;
mod writer;
#[cfg(feature = "sqlite")]
mod open;
#[cfg(feature = "sqlite")]
mod query;

pub use insert::*;
pub use models::*;
pub use schema::*;
pub use writer::*;
#[cfg(feature = "sqlite")]
pub use open::Db;
