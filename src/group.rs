//! Zarr groups.
//!
//! A group is a named container of child arrays and groups. On disk a group
//! directory holds a `.zgroup` document, an optional `.zattrs` document, and
//! one subdirectory per child; child names are directory names.
//!
//! Use [`Group::new`] to set up a new group (stored explicitly with
//! [`Group::store_metadata`]), or [`Group::open`] to read an existing group.
//! Children are discovered by directory enumeration with
//! [`Group::child_names`] and opened with [`Group::array`] and
//! [`Group::child_group`].

use std::sync::Arc;

use derive_more::Display;
use thiserror::Error;

use crate::{
    array::{Array, ArrayCreateError, Element},
    metadata::{AttributesMetadata, GroupMetadata},
    node::{NodeName, NodeNameError, NodePath, NodePathError},
    storage::{
        meta_key_array, meta_key_attributes, meta_key_group, ListableStorageTraits,
        ReadableStorageTraits, StorageError, StorePrefix, WritableStorageTraits,
    },
};

/// A group.
#[derive(Clone, Debug, Display)]
#[display("group at {path}")]
pub struct Group<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the group in the store.
    path: NodePath,
    /// The metadata.
    metadata: GroupMetadata,
    /// Optional user attributes, persisted as `.zattrs`.
    attributes: AttributesMetadata,
}

/// A group creation error.
#[derive(Debug, Error)]
pub enum GroupCreateError {
    /// Group metadata (`.zgroup`) is missing.
    #[error("group metadata is missing")]
    MissingMetadata,
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// An invalid node name.
    #[error(transparent)]
    NodeNameError(#[from] NodeNameError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

impl<TStorage: ?Sized> Group<TStorage> {
    /// Create a new group in `storage` at `path` with default metadata.
    ///
    /// This does **not** write to the store; use
    /// [`store_metadata`](Group::store_metadata) to persist the group.
    ///
    /// # Errors
    /// Returns a [`GroupCreateError`] if the path is invalid.
    pub fn new(storage: Arc<TStorage>, path: &str) -> Result<Self, GroupCreateError> {
        let path = NodePath::new(path)?;
        Ok(Self {
            storage,
            path,
            metadata: GroupMetadata::default(),
            attributes: AttributesMetadata::default(),
        })
    }

    /// Get the path of the group.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Return the underlying group metadata.
    #[must_use]
    pub const fn metadata(&self) -> &GroupMetadata {
        &self.metadata
    }

    /// Get the group attributes.
    #[must_use]
    pub const fn attributes(&self) -> &AttributesMetadata {
        &self.attributes
    }

    /// Mutably borrow the group attributes.
    ///
    /// Mutated attributes are only persisted by a subsequent
    /// [`store_metadata`](Group::store_metadata).
    pub fn attributes_mut(&mut self) -> &mut AttributesMetadata {
        &mut self.attributes
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Group<TStorage> {
    /// Open an existing group in `storage` at `path`, reading `.zgroup` and
    /// the optional `.zattrs`.
    ///
    /// # Errors
    /// Returns [`GroupCreateError::MissingMetadata`] if `.zgroup` is absent,
    /// or a [`GroupCreateError`] if metadata is invalid or the store fails.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, GroupCreateError> {
        let node_path = NodePath::new(path)?;

        let key = meta_key_group(&node_path);
        let metadata = storage
            .get(&key)?
            .ok_or(GroupCreateError::MissingMetadata)?;
        let metadata: GroupMetadata = serde_json::from_slice(&metadata)
            .map_err(|err| StorageError::InvalidMetadata(key, err.to_string()))?;

        let attributes_key = meta_key_attributes(&node_path);
        let attributes = storage
            .get(&attributes_key)?
            .map(|bytes| {
                serde_json::from_slice::<AttributesMetadata>(&bytes)
                    .map_err(|err| StorageError::InvalidMetadata(attributes_key, err.to_string()))
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            storage,
            path: node_path,
            metadata,
            attributes,
        })
    }

    /// Open the child array named `name` with element type `T`.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the child does not hold an array
    /// of a data type matching `T`.
    pub fn array<T: Element>(&self, name: &str) -> Result<Array<T>, ArrayCreateError> {
        let path = self.path.child(&NodeName::new(name).map_err(StorageError::NodeNameError)?);
        Array::load(&*self.storage, path.as_str())
    }

    /// Open the child group named `name`.
    ///
    /// # Errors
    /// Returns a [`GroupCreateError`] if the child does not hold a group.
    pub fn child_group(&self, name: &str) -> Result<Group<TStorage>, GroupCreateError> {
        let path = self.path.child(&NodeName::new(name)?);
        Self::open(self.storage.clone(), path.as_str())
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits + ListableStorageTraits> Group<TStorage> {
    /// Return the names of the child arrays and groups of this group, by
    /// directory enumeration.
    ///
    /// Directories holding neither `.zarray` nor `.zgroup` are skipped.
    ///
    /// # Errors
    /// Returns a [`GroupCreateError`] if the store fails.
    pub fn child_names(&self) -> Result<Vec<NodeName>, GroupCreateError> {
        let prefix: StorePrefix = (&self.path)
            .try_into()
            .map_err(StorageError::StorePrefixError)?;
        let mut names = Vec::new();
        for child_prefix in self.storage.list_dir(&prefix)?.prefixes() {
            let child_path: NodePath = child_prefix.try_into()?;
            let is_node = self.storage.size_key(&meta_key_array(&child_path))?.is_some()
                || self.storage.size_key(&meta_key_group(&child_path))?.is_some();
            if is_node {
                names.push(child_path.name());
            }
        }
        Ok(names)
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> Group<TStorage> {
    /// Store the group metadata: `.zgroup`, and `.zattrs` when the
    /// attributes are non-empty.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store fails.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let metadata = serde_json::to_vec_pretty(&self.metadata)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage.set(&meta_key_group(&self.path), &metadata)?;

        if !self.attributes.is_empty() {
            let attributes = serde_json::to_vec_pretty(&self.attributes)
                .map_err(|err| StorageError::Other(err.to_string()))?;
            self.storage
                .set(&meta_key_attributes(&self.path), &attributes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{ArrayBuilder, DataType};
    use crate::storage::MemoryStore;

    #[test]
    fn group_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let mut group = Group::new(store.clone(), "/group")?;
        group
            .attributes_mut()
            .insert("spam".to_string(), "ham".into());
        group.store_metadata()?;

        let group = Group::open(store, "/group")?;
        assert_eq!(
            group.attributes().get("spam"),
            Some(&serde_json::Value::from("ham"))
        );
        Ok(())
    }

    #[test]
    fn group_missing() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            Group::open(store, "/group"),
            Err(GroupCreateError::MissingMetadata)
        ));
    }

    #[test]
    fn group_children() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let group = Group::new(store.clone(), "/group")?;
        group.store_metadata()?;

        let array: Array<u8> = ArrayBuilder::new(vec![2], DataType::UInt8).build(vec![1, 2])?;
        array.save(&*store, "/group/mask")?;
        let subgroup = Group::new(store.clone(), "/group/inner")?;
        subgroup.store_metadata()?;

        let group = Group::open(store, "/group")?;
        let mut names: Vec<_> = group
            .child_names()?
            .iter()
            .map(|name| name.as_str().to_string())
            .collect();
        names.sort();
        assert_eq!(names, ["inner", "mask"]);

        let mask: Array<u8> = group.array("mask")?;
        assert_eq!(mask.to_vec(), vec![1, 2]);
        assert!(group.child_group("inner").is_ok());
        assert!(group.child_group("mask").is_err());
        Ok(())
    }
}
