//! Database access for Shamba services

pub mod init;
pub mod models;
pub mod transactions;

pub use init::{create_schema, init_database};
pub use models::Transaction;
