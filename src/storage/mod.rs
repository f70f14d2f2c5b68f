pub mod db;
mod groups;
pub mod models;
mod slots;
mod tables;

pub use db::{Database, DatabaseError};
pub use tables::*;
