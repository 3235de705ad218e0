use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::prelude::{KVStore, Store};

// --- RocksDb based KVStore

pub fn build_kvstore_rocks(dbpath: &Path) -> std::io::Result<Store>
{
    Ok(Arc::new(RocksDbVault::open(dbpath)?))
}

pub fn build_kvstore_rocks_temp() -> std::io::Result<Store>
{
    Ok(Arc::new(RocksDbVault::open_temporary()?))
}

#[derive(Clone)]
pub struct RocksDbVault
{
    // Declared before `tmpdir` so the database closes before its
    // directory is removed.
    db: Arc<rocksdb::DB>,
    // Held across the presence check and the delete, and by writes, so
    // two deletes of one key cannot both succeed.
    write_lock: Arc<Mutex<()>>,
    tmpdir: Option<Arc<tempfile::TempDir>>,
}

fn rocks_err(what: &str, e: rocksdb::Error) -> std::io::Error
{
    std::io::Error::new(std::io::ErrorKind::Other,
                        std::format!("rocksdb {} failed: {}", what, e))
}

impl RocksDbVault
{
    pub fn open(dbpath: &Path) -> std::io::Result<Self>
    {
        let mut options = rocksdb::Options::default();
        options.create_if_missing(true);

        let db = rocksdb::DB::open(&options, dbpath)
            .map_err(|e| rocks_err("open", e))?;
        tracing::info!(path = %dbpath.display(), "opened rocksdb vault");
        Ok(RocksDbVault {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
            tmpdir: None,
        })
    }

    /// Opens a database under a fresh temporary directory which is
    /// removed once the last clone of this vault is dropped.
    pub fn open_temporary() -> std::io::Result<Self>
    {
        let tmpdir = tempfile::Builder::new()
            .prefix("user_vault")
            .tempdir()?;
        let mut vault = RocksDbVault::open(tmpdir.path())?;
        vault.tmpdir = Some(Arc::new(tmpdir));
        Ok(vault)
    }

    pub fn is_temporary(&self) -> bool
    {
        self.tmpdir.is_some()
    }

    fn lock_writes(&self) -> std::io::Result<MutexGuard<'_, ()>>
    {
        self.write_lock.lock().map_err(|_| std::io::Error::new(
                std::io::ErrorKind::Other, "rocksvault write lock poisoned"))
    }

    fn sync_writes() -> rocksdb::WriteOptions
    {
        let mut opts = rocksdb::WriteOptions::default();
        opts.set_sync(true);
        opts
    }
}

impl KVStore for RocksDbVault
{
    fn get(&self, k: &str) -> std::io::Result<Option<Vec<u8>>>
    {
        self.db.get(k).map_err(|e| rocks_err("get", e))
    }

    fn set(&self, k: &str, v: Vec<u8>) -> std::io::Result<()>
    {
        let _guard = self.lock_writes()?;
        self.db.put_opt(k, v, &Self::sync_writes())
            .map_err(|e| rocks_err("put", e))
    }

    fn delete(&self, k: &str) -> std::io::Result<()>
    {
        // Deletes are blind in rocksdb, check presence first.
        let _guard = self.lock_writes()?;
        if !self.exists(k)? {
            return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    std::format!("Key {} not found", k)));
        }
        self.db.delete_opt(k, &Self::sync_writes())
            .map_err(|e| rocks_err("delete", e))
    }

    fn all_keys(&self) -> std::io::Result<Vec<String>>
    {
        let mut keys = Vec::new();
        for item in self.db.iterator(rocksdb::IteratorMode::Start) {
            let (k, _) = item.map_err(|e| rocks_err("iterate", e))?;
            match std::str::from_utf8(&k) {
                Ok(key) => keys.push(key.to_string()),
                Err(_) => {
                    tracing::warn!(key = ?k, "skipping non utf-8 key");
                },
            }
        }
        Ok(keys)
    }

    fn exists(&self, k: &str) -> std::io::Result<bool>
    {
        let pinned = self.db.get_pinned(k)
            .map_err(|e| rocks_err("get", e))?;
        Ok(pinned.is_some())
    }

    fn commit(&self) -> std::io::Result<()>
    {
        self.db.flush().map_err(|e| rocks_err("flush", e))
    }

    fn location(&self) -> String
    {
        self.db.path().display().to_string()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_values_persist_across_reopen()
    {
        let dir = tempfile::tempdir().unwrap();
        {
            let vault = RocksDbVault::open(dir.path()).unwrap();
            vault.set("123_account_id", b"46887".to_vec()).unwrap();
            vault.commit().unwrap();
        }
        let vault = RocksDbVault::open(dir.path()).unwrap();
        assert_eq!(vault.get("123_account_id").unwrap(),
                   Some(b"46887".to_vec()));
        assert_eq!(vault.all_keys().unwrap(),
                   vec!["123_account_id".to_string()]);
    }

    #[test]
    fn test_delete_missing_is_not_found()
    {
        let vault = RocksDbVault::open_temporary().unwrap();
        vault.set("a", vec![1]).unwrap();
        vault.delete("a").unwrap();
        let err = vault.delete("a").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert_eq!(vault.get("a").unwrap(), None);
    }

    #[test]
    fn test_concurrent_deletes_of_one_key_succeed_once()
    {
        let vault = RocksDbVault::open_temporary().unwrap();
        for round in 0..20 {
            let k = std::format!("7_key_{round}");
            vault.set(&k, vec![1]).unwrap();

            let barrier = Arc::new(std::sync::Barrier::new(4));
            let handles: Vec<_> = (0..4).map(|_| {
                let vault = vault.clone();
                let barrier = barrier.clone();
                let k = k.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    vault.delete(&k)
                })
            }).collect();

            let mut deleted = 0;
            for handle in handles {
                match handle.join().unwrap() {
                    Ok(()) => deleted += 1,
                    Err(e) => {
                        assert_eq!(e.kind(), std::io::ErrorKind::NotFound)
                    },
                }
            }
            assert_eq!(deleted, 1, "round {round}");
        }
    }

    #[test]
    fn test_temporary_dir_removed_on_drop()
    {
        let vault = RocksDbVault::open_temporary().unwrap();
        assert!(vault.is_temporary());
        let location = std::path::PathBuf::from(vault.location());
        assert!(location.exists());

        let clone = vault.clone();
        drop(vault);
        assert!(location.exists());
        drop(clone);
        assert!(!location.exists());
    }
}
