//! Core types for the Sarge launcher.
//!
//! This crate contains shared data structures used by the frontend crates:
//! - Row descriptors for servers, demos and levels
//! - Persisted configuration and application data
//! - The save/load store adapter
//! - Server address validation
//! - Error types

mod address;
mod config;
mod error;
mod row;
mod store;

pub use address::{valid_ip, valid_server_address};
pub use config::{config_dir, data_dir, AppData, AppDataList, Config, Q3Executable};
pub use error::{ConfigError, StoreError};
pub use row::{Demo, DemoPlayer, Level, MasterServer, Quake3Server, Row, RowKind, ServerPlayer};
pub use store::{JsonFileStore, Store};
