// Backends implement this over a single flat keyspace. Namespacing is
// layered on top by the vault, backends never see namespace ids.

pub trait KVStore
{
    fn get(&self, k: &str) -> std::io::Result<Option<Vec<u8>>>;
    fn set(&self, k: &str, v: Vec<u8>) -> std::io::Result<()>;

    /// Fails with `ErrorKind::NotFound` when `k` is absent.
    fn delete(&self, k: &str) -> std::io::Result<()>;

    /// Snapshot of every physical key, in backend scan order.
    fn all_keys(&self) -> std::io::Result<Vec<String>>;

    fn exists(&self, k: &str) -> std::io::Result<bool>
    {
        Ok(self.get(k)?.is_some())
    }

    fn commit(&self) -> std::io::Result<()>
    {
        Ok(())
    }

    /// Where the data lives, for diagnostics only.
    fn location(&self) -> String;
}

pub type Store = std::sync::Arc<dyn KVStore + Send + Sync>;
