//! Per-user key-value storage for stateful web applications.
//!
//! Many logical key spaces ("users", or sessions) share one physical
//! store. Each value is kept under `{user_id}_{key_name}`, so every user can
//! use the same key names without seeing anyone else's data.
//!
//! Backends:
//!
//! - in memory, nothing persisted
//! - RocksDB in a temporary directory removed on drop
//! - RocksDB at a caller supplied path, durable across restarts
//!
//! ```ignore
//! use user_vault::{MissingPolicy, StoreConfig, UserVault};
//!
//! let vault = UserVault::open(&StoreConfig::in_memory())?;
//! vault.set_value(123, "account_id", &46887)?;
//! vault.set_value(123, "favorite_animal", "monkey")?;
//! let keys = vault.list_keys(123)?;
//! vault.delete_value(123, "favorite_animal", MissingPolicy::Raise)?;
//! vault.delete_all_values(123)?;
//! ```

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod memvault;
pub mod prelude;
pub mod rocksvault;
pub mod store_factory;
pub mod vault;


pub use codec::{Codec, JsonCodec};
pub use config::{StoreConfig, StoreLocation, VaultConfig};
pub use error::{Result, VaultError};
pub use keys::{Ident, IdentArg, KeyComposer};
pub use memvault::MemVault;
pub use prelude::{KVStore, Store};
pub use rocksvault::RocksDbVault;
pub use vault::{MissingPolicy, PolicyArg, UserVault};
