//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Read-only connection pools
//! - Column reflection
//! - Query execution
//! - Row decoding

pub mod executor;
pub mod pool;
pub mod reflector;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::{DatabaseType, DbPool, connect};
pub use reflector::{ColumnReflector, SqlxReflector};
