//! Per-user operations over a shared backend.
//!
//! Every user (or session) gets its own key space inside one physical
//! store. Keys are composed as `{namespace_id}{separator}{key_name}`, see
//! [`crate::keys`]. The vault holds no locks of its own; concurrent callers
//! rely on the backend to serialize physical access.

use std::fmt;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};

use crate::codec::{Codec, JsonCodec};
use crate::config::StoreConfig;
use crate::error::{Result, VaultError};
use crate::keys::{Ident, IdentArg, KeyComposer};
use crate::prelude::Store;
use crate::store_factory;

/// What `delete_value` does when the key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy
{
    /// Treat the delete as a no-op.
    #[default]
    Ignore,
    /// Fail with [`VaultError::KeyNotFound`].
    Raise,
}

impl FromStr for MissingPolicy
{
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self>
    {
        match s {
            "ignore" => Ok(MissingPolicy::Ignore),
            "raise" => Ok(MissingPolicy::Raise),
            other => Err(VaultError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for MissingPolicy
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            MissingPolicy::Ignore => f.write_str("ignore"),
            MissingPolicy::Raise => f.write_str("raise"),
        }
    }
}

/// Accepts either a [`MissingPolicy`] or its string name.
pub trait PolicyArg
{
    fn to_policy(&self) -> Result<MissingPolicy>;
}

impl PolicyArg for MissingPolicy
{
    fn to_policy(&self) -> Result<MissingPolicy>
    {
        Ok(*self)
    }
}

impl PolicyArg for str
{
    fn to_policy(&self) -> Result<MissingPolicy>
    {
        self.parse()
    }
}

impl PolicyArg for String
{
    fn to_policy(&self) -> Result<MissingPolicy>
    {
        self.parse()
    }
}

impl<T: PolicyArg + ?Sized> PolicyArg for &T
{
    fn to_policy(&self) -> Result<MissingPolicy>
    {
        (**self).to_policy()
    }
}

/// Namespaced key-value storage for the users of an application.
///
/// ```ignore
/// let vault = UserVault::open(&StoreConfig::in_memory())?;
/// vault.set_value(123, "account_id", &46887)?;
/// vault.set_value(123, "favorite_animal", "monkey")?;
/// assert_eq!(vault.get_value::<String, _, _>(123, "favorite_animal")?,
///            Some("monkey".to_string()));
/// vault.delete_all_values(123)?;
/// ```
#[derive(Clone)]
pub struct UserVault<C = JsonCodec>
{
    store: Store,
    keys: KeyComposer,
    codec: C,
}

impl UserVault<JsonCodec>
{
    pub fn open(cfg: &StoreConfig) -> Result<Self>
    {
        cfg.validate()?;
        let store = store_factory::create_store(cfg)?;
        let vault = UserVault::with_store(store, cfg.separator.as_str())?;
        tracing::info!(location = %vault.location(),
                       separator = %cfg.separator, "opened user vault");
        Ok(vault)
    }

    pub fn with_store(store: Store, separator: &str) -> Result<Self>
    {
        if separator.is_empty() {
            return Err(VaultError::Config(
                    "separator must not be empty".to_string()));
        }
        Ok(UserVault {
            store,
            keys: KeyComposer::new(separator),
            codec: JsonCodec,
        })
    }
}

impl<C: Codec> UserVault<C>
{
    pub fn with_codec<D: Codec>(self, codec: D) -> UserVault<D>
    {
        UserVault { store: self.store, keys: self.keys, codec }
    }

    pub fn store(&self) -> &Store
    {
        &self.store
    }

    pub fn key_composer(&self) -> &KeyComposer
    {
        &self.keys
    }

    pub fn location(&self) -> String
    {
        self.store.location()
    }

    fn namespace<N: IdentArg>(&self, namespace_id: N) -> Result<Ident>
    {
        let ns = namespace_id.to_ident("namespace_id")?;
        self.keys.check_namespace(&ns)?;
        Ok(ns)
    }

    /// Validates both identifiers and returns the physical key.
    fn physical_key<N, K>(&self, namespace_id: N, key_name: K)
        -> Result<(Ident, String)>
        where N: IdentArg, K: IdentArg
    {
        let ns = self.namespace(namespace_id)?;
        let key = key_name.to_ident("key_name")?;
        let physical = self.keys.compose(&ns, &key);
        Ok((key, physical))
    }

    /// Key names stored for `namespace_id`, in backend scan order.
    pub fn list_keys<N: IdentArg>(&self, namespace_id: N) -> Result<Vec<String>>
    {
        let ns = self.namespace(namespace_id)?;
        self.list_ident_keys(&ns)
    }

    fn list_ident_keys(&self, ns: &Ident) -> Result<Vec<String>>
    {
        let user_keys: Vec<String> = self.store.all_keys()?
            .iter()
            .filter_map(|k| self.keys.strip_prefix(k, ns))
            .map(str::to_string)
            .collect();
        tracing::debug!(namespace = %ns, count = user_keys.len(), "listed keys");
        Ok(user_keys)
    }

    /// `Ok(None)` when nothing is stored under the key.
    pub fn get_value<V, N, K>(&self, namespace_id: N, key_name: K)
        -> Result<Option<V>>
        where V: DeserializeOwned, N: IdentArg, K: IdentArg
    {
        let (_, physical) = self.physical_key(namespace_id, key_name)?;
        tracing::debug!(key = %physical, "get value");
        match self.store.get(&physical)? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Stores `value`, replacing whatever was there.
    pub fn set_value<V, N, K>(&self, namespace_id: N, key_name: K, value: &V)
        -> Result<()>
        where V: Serialize + ?Sized, N: IdentArg, K: IdentArg
    {
        let (_, physical) = self.physical_key(namespace_id, key_name)?;
        let bytes = self.codec.encode(value)?;
        tracing::debug!(key = %physical, len = bytes.len(), "set value");
        self.store.set(&physical, bytes)?;
        Ok(())
    }

    pub fn contains_key<N, K>(&self, namespace_id: N, key_name: K)
        -> Result<bool>
        where N: IdentArg, K: IdentArg
    {
        let (_, physical) = self.physical_key(namespace_id, key_name)?;
        Ok(self.store.exists(&physical)?)
    }

    pub fn delete_value<N, K, P>(&self, namespace_id: N, key_name: K,
                                 missing_policy: P) -> Result<()>
        where N: IdentArg, K: IdentArg, P: PolicyArg
    {
        let (key, physical) = self.physical_key(namespace_id, key_name)?;
        let policy = missing_policy.to_policy()?;
        self.delete_physical(&key, &physical, policy)?;
        Ok(())
    }

    /// `Ok(false)` when the key was already gone under `Ignore`.
    fn delete_physical(&self, key: &Ident, physical: &str,
                       policy: MissingPolicy) -> Result<bool>
    {
        match self.store.delete(physical) {
            Ok(()) => {
                tracing::debug!(key = %physical, "deleted value");
                Ok(true)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                match policy {
                    MissingPolicy::Ignore => Ok(false),
                    MissingPolicy::Raise => {
                        Err(VaultError::KeyNotFound(key.to_string()))
                    },
                }
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every key of the namespace. Not atomic: an interrupted call
    /// leaves a subset of the keys deleted, and keys written concurrently
    /// may or may not survive. Returns how many keys this call removed.
    pub fn delete_all_values<N: IdentArg>(&self, namespace_id: N)
        -> Result<usize>
    {
        let ns = self.namespace(namespace_id)?;
        let user_keys = self.list_ident_keys(&ns)?;
        let mut removed = 0;
        for name in &user_keys {
            let key = Ident::Str(name.clone());
            let physical = self.keys.compose(&ns, &key);
            if self.delete_physical(&key, &physical, MissingPolicy::Ignore)? {
                removed += 1;
            }
        }
        tracing::debug!(namespace = %ns, listed = user_keys.len(), removed,
                        "deleted all values");
        Ok(removed)
    }

    pub fn commit(&self) -> Result<()>
    {
        Ok(self.store.commit()?)
    }
}

impl<C> fmt::Display for UserVault<C>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "UserVault at {}", self.store.location())
    }
}

impl<C> fmt::Debug for UserVault<C>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("UserVault")
            .field("location", &self.store.location())
            .field("separator", &self.keys.separator())
            .finish()
    }
}
