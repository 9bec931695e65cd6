//! Relational storage for the content directory mirror.
//!
//! Every domain row is keyed by its ledger entity id. Functions take a plain
//! [`SqliteConnection`](sqlx::SqliteConnection) so that callers decide the
//! transaction boundary; the materializer wraps each batch in one.

mod db;
pub mod error;
pub mod models;
mod record;

pub use crate::db::Database;
pub use crate::record::{Record, delete, exists, table_of};
