//! SQLite database module for the enrollment engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
