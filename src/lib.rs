/*!
 * Storage of inhouse games: who played which seat, with which rating, on which champion
 */

#[macro_use]
extern crate diesel;

pub mod cmd;
pub mod config;
pub mod error;
pub mod extensions;
pub mod models;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use store::{MemoryStore, PgStore, Store};
