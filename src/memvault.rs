use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;

use crate::prelude::{KVStore, Store};

pub const MEMORY_LOCATION: &str = ":memory:";

pub fn build_kvstore_mem() -> std::io::Result<Store>
{
    let mv = MemVault::new();
    Ok(Arc::new(mv))
}

/// Ephemeral backend, gone with the process. Clones share the same map.
#[derive(Debug, Default)]
pub struct MemVault
{
    map: Arc<RwLock<HashMap<String, Vec<u8>>>>
}

impl MemVault
{
    pub fn new() -> MemVault
    {
        MemVault{ map: Arc::new(RwLock::new(HashMap::new())) }
    }

    fn read(&self)
        -> std::io::Result<RwLockReadGuard<'_, HashMap<String, Vec<u8>>>>
    {
        self.map.read().map_err(|_| poisoned())
    }

    fn write(&self)
        -> std::io::Result<RwLockWriteGuard<'_, HashMap<String, Vec<u8>>>>
    {
        self.map.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> std::io::Error
{
    std::io::Error::new(std::io::ErrorKind::Other, "memvault lock poisoned")
}

impl Clone for MemVault
{
    fn clone(&self) -> MemVault
    {
        MemVault{ map: self.map.clone() }
    }

}

impl KVStore for MemVault
{
    fn get(&self, k: &str) -> std::io::Result<Option<Vec<u8>>>
    {
        let map_locked = self.read()?;
        Ok(map_locked.get(k).cloned())
    }

    fn set(&self, k: &str, v: Vec<u8>) -> std::io::Result<()>
    {
        let mut map_locked = self.write()?;
        map_locked.insert(k.to_string(), v);
        Ok(())
    }

    fn delete(&self, k: &str) -> std::io::Result<()>
    {
        let mut map_locked = self.write()?;
        match map_locked.remove(k) {
            Some(_) => Ok(()),
            None => Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    std::format!("Key {} not found", k))),
        }
    }

    fn all_keys(&self) -> std::io::Result<Vec<String>>
    {
        let map_locked = self.read()?;
        Ok(map_locked.keys().cloned().collect())
    }

    fn exists(&self, k: &str) -> std::io::Result<bool>
    {
        let map_locked = self.read()?;
        Ok(map_locked.contains_key(k))
    }

    fn location(&self) -> String
    {
        MEMORY_LOCATION.to_string()
    }
}

impl std::fmt::Display for MemVault
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result
    {
        let map_locked = self.map.read().map_err(|_| std::fmt::Error)?;
        write!(f, "---- memvault: {} keys ----", map_locked.len())?;
        for k in map_locked.keys() {
            write!(f, "\n{k}")?;
        }
        Ok(())
    }
}
