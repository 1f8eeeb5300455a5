//! Zarr storage: abstract stores of byte sequences addressed by keys.
//!
//! A Zarr store is a system that can be used to store and retrieve data from
//! a Zarr hierarchy. For example: a filesystem, an HTTP server, an Amazon S3
//! bucket, or an in-memory map.
//!
//! This module defines the abstract store interfaces
//! ([`ReadableStorageTraits`], [`WritableStorageTraits`],
//! [`ListableStorageTraits`]), two stores ([`FilesystemStore`],
//! [`MemoryStore`]), and functions mapping hierarchy node paths to the
//! reserved Zarr v2 metadata keys (`.zarray`, `.zgroup`, `.zattrs`) and to
//! chunk data keys.

mod filesystem_store;
mod memory_store;
mod store_key;
mod store_prefix;

use thiserror::Error;

use crate::node::{NodeNameError, NodePath, NodePathError};

pub use filesystem_store::{FilesystemStore, FilesystemStoreCreateError};
pub use memory_store::MemoryStore;
pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError, StorePrefixes};

/// The value of a store key, if present.
pub type MaybeBytes = Option<Vec<u8>>;

/// Readable storage traits.
pub trait ReadableStorageTraits: Send + Sync {
    /// Retrieve the value (bytes) associated with a given [`StoreKey`].
    ///
    /// Returns [`None`] if the key is not found.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError>;

    /// Return the size in bytes of the value at `key`.
    ///
    /// Returns [`None`] if the key is not found.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError>;
}

/// Writable storage traits.
pub trait WritableStorageTraits: Send + Sync {
    /// Store bytes at a [`StoreKey`], creating any parents.
    ///
    /// A completed `set` fully replaces any previous value of the key.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on failure to store.
    fn set(&self, key: &StoreKey, value: &[u8]) -> Result<(), StorageError>;

    /// Erase a [`StoreKey`].
    ///
    /// Succeeds if the key does not exist.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn erase(&self, key: &StoreKey) -> Result<(), StorageError>;

    /// Erase all [`StoreKey`]s under [`StorePrefix`].
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError>;
}

/// Listable storage traits.
pub trait ListableStorageTraits: Send + Sync {
    /// Retrieve all [`StoreKeys`] in the store.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn list(&self) -> Result<StoreKeys, StorageError>;

    /// Retrieve all [`StoreKeys`] with a given [`StorePrefix`].
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError>;

    /// Retrieve all [`StoreKeys`] and [`StorePrefix`]es which are direct
    /// children of [`StorePrefix`].
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError>;
}

/// Readable and listable storage traits.
pub trait ReadableListableStorageTraits: ReadableStorageTraits + ListableStorageTraits {}

impl<T: ReadableStorageTraits + ListableStorageTraits> ReadableListableStorageTraits for T {}

/// [`StoreKeys`] and [`StorePrefixes`].
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StoreKeysPrefixes {
    keys: StoreKeys,
    prefixes: StorePrefixes,
}

impl StoreKeysPrefixes {
    /// Create a new [`StoreKeysPrefixes`].
    #[must_use]
    pub const fn new(keys: StoreKeys, prefixes: StorePrefixes) -> Self {
        Self { keys, prefixes }
    }

    /// Returns the keys.
    #[must_use]
    pub const fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Returns the prefixes.
    #[must_use]
    pub const fn prefixes(&self) -> &StorePrefixes {
        &self.prefixes
    }
}

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An error parsing the metadata for a key.
    #[error("error parsing metadata for {0}: {1}")]
    InvalidMetadata(StoreKey, String),
    /// An invalid store prefix.
    #[error("invalid store prefix {0}")]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error("invalid store key {0}")]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid node path.
    #[error("invalid node path {0}")]
    NodePathError(#[from] NodePathError),
    /// An invalid node name.
    #[error("invalid node name {0}")]
    NodeNameError(#[from] NodeNameError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Return the metadata key given a node path for a specified metadata file name.
#[must_use]
fn meta_key_any(path: &NodePath, metadata_file_name: &str) -> StoreKey {
    let path = path.as_str();
    if path.eq("/") {
        unsafe { StoreKey::new_unchecked(metadata_file_name.to_string()) }
    } else {
        let path = path.strip_prefix('/').unwrap_or(path);
        unsafe { StoreKey::new_unchecked(format!("{path}/{metadata_file_name}")) }
    }
}

/// Return the array metadata key (`.zarray`) given a node path.
#[must_use]
pub fn meta_key_array(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zarray")
}

/// Return the group metadata key (`.zgroup`) given a node path.
#[must_use]
pub fn meta_key_group(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zgroup")
}

/// Return the user attributes key (`.zattrs`) given a node path.
#[must_use]
pub fn meta_key_attributes(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zattrs")
}

/// Return the data key given a node path and an encoded chunk key.
#[must_use]
pub fn data_key(path: &NodePath, chunk_key: &str) -> StoreKey {
    let path = path.as_str();
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        unsafe { StoreKey::new_unchecked(chunk_key.to_string()) }
    } else {
        unsafe { StoreKey::new_unchecked(format!("{path}/{chunk_key}")) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_keys() {
        let root = NodePath::root();
        assert_eq!(meta_key_array(&root).as_str(), ".zarray");
        assert_eq!(meta_key_group(&root).as_str(), ".zgroup");
        let path = NodePath::new("/group/array").unwrap();
        assert_eq!(meta_key_array(&path).as_str(), "group/array/.zarray");
        assert_eq!(meta_key_attributes(&path).as_str(), "group/array/.zattrs");
    }

    #[test]
    fn data_keys() {
        let root = NodePath::root();
        assert_eq!(data_key(&root, "0.0").as_str(), "0.0");
        let path = NodePath::new("/array").unwrap();
        assert_eq!(data_key(&path, "1.2.3").as_str(), "array/1.2.3");
    }
}
