//! HTTP API handlers for shamba-pv

pub mod health;
pub mod payment;
pub mod transactions;
pub mod verify;

pub use health::health_routes;
pub use payment::verify_payment;
pub use transactions::{create_transaction, get_transaction, list_transactions};
pub use verify::verify_transaction;
