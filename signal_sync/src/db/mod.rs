//! Warehouse database utilities.
//!
//! This module provides:
//! - [`connection::connect_sqlite`]: open a warehouse with WAL, foreign_keys=ON and a 5000ms busy_timeout.
//! - [`migrate::run_sqlite`] / [`migrate::open_warehouse`]: apply the embedded migrations.
//! - [`ident::Ident`]: allow-listed identifiers for the table, column and view names
//!   that SQL cannot bind as parameters.
//! - [`catalog`]: small lookups against `sqlite_master` and `pragma_table_info`.
//!
//! Example:
//! ```no_run
//! use signal_sync::db::migrate;
//!
//! let db_path = std::env::temp_dir().join("signal_sync_example.db");
//! let _conn = migrate::open_warehouse(db_path.to_str().unwrap()).expect("warehouse");
//! ```

pub mod catalog;
pub mod connection;
pub mod ident;
pub mod migrate;
