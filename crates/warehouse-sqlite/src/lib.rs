//! SQLite warehouse: full-refresh loads of the threat and server tables plus a run ledger.

mod open;
mod models;
mod insert;
mod query;
mod schema;

pub use open::{ConnectionError, ConnectionTarget, Warehouse};
pub use models::*;
