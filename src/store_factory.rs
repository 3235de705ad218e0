use crate::config;
use crate::memvault;
use crate::rocksvault;
use crate::prelude::Store;

pub fn create_store(cfg: &config::StoreConfig) -> std::io::Result<Store>
{
    match &cfg.location {
        config::StoreLocation::InMemory => memvault::build_kvstore_mem(),
        config::StoreLocation::TempFile => {
            rocksvault::build_kvstore_rocks_temp()
        },
        config::StoreLocation::Path(dbpath) => {
            rocksvault::build_kvstore_rocks(dbpath)
        },
    }
}
