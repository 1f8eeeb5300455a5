//! Generic persistence of composite values as nested groups.
//!
//! A record type maps to a group directory: the record saves a `.zgroup` and
//! each field saves under `dir/<field_name>`. Leaves are
//! [`Array`](crate::array::Array)s; optional fields save nothing when absent
//! and load as [`None`] when their child directory holds no metadata.
//!
//! The [`zarr_record!`](crate::zarr_record!) macro defines a struct together
//! with its [`SaveHierarchy`] and [`LoadHierarchy`] implementations:
//!
//! ```
//! # use zarr2::array::{Array, ArrayBuilder, DataType, Endianness};
//! # use zarr2::hierarchy::{SaveHierarchy, LoadHierarchy};
//! # use zarr2::storage::MemoryStore;
//! zarr2::zarr_record! {
//!     /// One storm track observation set.
//!     pub struct Observations {
//!         temp: Array<f32>,
//!         mask: Array<u8>,
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let observations = Observations {
//!     temp: ArrayBuilder::new(vec![4], DataType::Float32(Endianness::Little))
//!         .build(vec![1.0, 2.0, 3.0, 4.0])?,
//!     mask: ArrayBuilder::new(vec![4], DataType::UInt8).build(vec![1, 0, 0, 1])?,
//! };
//! let store = MemoryStore::new();
//! observations.save_hierarchy(&store, "/obs")?;
//! let loaded = Observations::load_hierarchy(&store, "/obs")?;
//! assert_eq!(loaded.temp, observations.temp);
//! # Ok(())
//! # }
//! ```
//!
//! Sum types are saved by implementing the traits by hand: the selected
//! variant saves against the same directory, and load recovers the variant
//! structurally by attempting each in turn.

use thiserror::Error;

use crate::{
    array::{Array, ArrayCreateError, ArrayError, Element},
    metadata::GroupMetadata,
    node::{NodeName, NodeNameError, NodePath, NodePathError},
    storage::{
        meta_key_array, meta_key_group, ReadableStorageTraits, StorageError,
        WritableStorageTraits,
    },
};

/// A hierarchy persistence error.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// A required child is missing.
    #[error("missing child {0}")]
    MissingChild(String),
    /// A child failed to load.
    #[error("malformed child {0}: {1}")]
    MalformedChild(String, #[source] Box<HierarchyError>),
    /// An array operation error.
    #[error(transparent)]
    ArrayError(#[from] ArrayError),
    /// An array creation error.
    #[error(transparent)]
    ArrayCreateError(#[from] ArrayCreateError),
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

/// A value that saves itself as a Zarr hierarchy entry.
pub trait SaveHierarchy {
    /// Save the value under `path` in `storage`.
    ///
    /// # Errors
    /// Returns a [`HierarchyError`] on the first failing component.
    fn save_hierarchy<TStorage: ?Sized + WritableStorageTraits>(
        &self,
        storage: &TStorage,
        path: &str,
    ) -> Result<(), HierarchyError>;
}

/// A value that loads itself from a Zarr hierarchy entry.
pub trait LoadHierarchy: Sized {
    /// Load the value from `path` in `storage`.
    ///
    /// # Errors
    /// Returns a [`HierarchyError`] if the entry is missing or malformed.
    fn load_hierarchy<TStorage: ?Sized + ReadableStorageTraits>(
        storage: &TStorage,
        path: &str,
    ) -> Result<Self, HierarchyError>;

    /// Returns true if an entry of this type is present at `path`.
    ///
    /// # Errors
    /// Returns a [`HierarchyError`] if the store fails.
    fn exists_hierarchy<TStorage: ?Sized + ReadableStorageTraits>(
        storage: &TStorage,
        path: &str,
    ) -> Result<bool, HierarchyError>;
}

impl<T: Element> SaveHierarchy for Array<T> {
    fn save_hierarchy<TStorage: ?Sized + WritableStorageTraits>(
        &self,
        storage: &TStorage,
        path: &str,
    ) -> Result<(), HierarchyError> {
        Ok(self.save(storage, path)?)
    }
}

impl<T: Element> LoadHierarchy for Array<T> {
    fn load_hierarchy<TStorage: ?Sized + ReadableStorageTraits>(
        storage: &TStorage,
        path: &str,
    ) -> Result<Self, HierarchyError> {
        Ok(Self::load(storage, path)?)
    }

    fn exists_hierarchy<TStorage: ?Sized + ReadableStorageTraits>(
        storage: &TStorage,
        path: &str,
    ) -> Result<bool, HierarchyError> {
        let path = NodePath::new(path)?;
        Ok(storage.size_key(&meta_key_array(&path))?.is_some())
    }
}

impl<T: SaveHierarchy> SaveHierarchy for Option<T> {
    /// An absent optional field saves nothing at all.
    fn save_hierarchy<TStorage: ?Sized + WritableStorageTraits>(
        &self,
        storage: &TStorage,
        path: &str,
    ) -> Result<(), HierarchyError> {
        match self {
            Some(value) => value.save_hierarchy(storage, path),
            None => Ok(()),
        }
    }
}

impl<T: LoadHierarchy> LoadHierarchy for Option<T> {
    fn load_hierarchy<TStorage: ?Sized + ReadableStorageTraits>(
        storage: &TStorage,
        path: &str,
    ) -> Result<Self, HierarchyError> {
        if T::exists_hierarchy(storage, path)? {
            Ok(Some(T::load_hierarchy(storage, path)?))
        } else {
            Ok(None)
        }
    }

    fn exists_hierarchy<TStorage: ?Sized + ReadableStorageTraits>(
        _storage: &TStorage,
        _path: &str,
    ) -> Result<bool, HierarchyError> {
        Ok(true)
    }
}

/// Save the `.zgroup` document of a record directory.
///
/// # Errors
/// Returns a [`HierarchyError`] if the store fails.
pub fn save_group_metadata<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &str,
) -> Result<(), HierarchyError> {
    let path = NodePath::new(path)?;
    let metadata = serde_json::to_vec_pretty(&GroupMetadata::default())
        .map_err(|err| StorageError::Other(err.to_string()))?;
    storage.set(&meta_key_group(&path), &metadata)?;
    Ok(())
}

/// Returns true if a `.zgroup` document is present at `path`.
///
/// # Errors
/// Returns a [`HierarchyError`] if the store fails.
pub fn group_metadata_exists<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &str,
) -> Result<bool, HierarchyError> {
    let path = NodePath::new(path)?;
    Ok(storage.size_key(&meta_key_group(&path))?.is_some())
}

/// Return the path of the child field `name` under `path`.
///
/// # Errors
/// Returns a [`HierarchyError`] if `name` is not a valid node name.
pub fn child_path(path: &str, name: &str) -> Result<String, HierarchyError> {
    let path = NodePath::new(path)?;
    Ok(path.child(&NodeName::new(name)?).as_str().to_string())
}

/// Define a record struct together with its [`SaveHierarchy`] and
/// [`LoadHierarchy`] implementations.
///
/// The record saves as a group: a `.zgroup` document plus one child per
/// field, named after the field. Loading fails with
/// [`HierarchyError::MissingChild`] when a required field has no entry and
/// wraps any field failure in [`HierarchyError::MalformedChild`].
#[macro_export]
macro_rules! zarr_record {
    (
        $(#[$attribute:meta])*
        $visibility:vis struct $name:ident {
            $($field:ident : $field_type:ty),+ $(,)?
        }
    ) => {
        $(#[$attribute])*
        #[derive(Debug, Clone, PartialEq)]
        $visibility struct $name {
            $(
                /// Saved under a child directory named after the field.
                $visibility $field: $field_type,
            )+
        }

        impl $crate::hierarchy::SaveHierarchy for $name {
            fn save_hierarchy<TStorage: ?Sized + $crate::storage::WritableStorageTraits>(
                &self,
                storage: &TStorage,
                path: &str,
            ) -> Result<(), $crate::hierarchy::HierarchyError> {
                $crate::hierarchy::save_group_metadata(storage, path)?;
                $(
                    $crate::hierarchy::SaveHierarchy::save_hierarchy(
                        &self.$field,
                        storage,
                        &$crate::hierarchy::child_path(path, stringify!($field))?,
                    )?;
                )+
                Ok(())
            }
        }

        impl $crate::hierarchy::LoadHierarchy for $name {
            fn load_hierarchy<TStorage: ?Sized + $crate::storage::ReadableStorageTraits>(
                storage: &TStorage,
                path: &str,
            ) -> Result<Self, $crate::hierarchy::HierarchyError> {
                if !$crate::hierarchy::group_metadata_exists(storage, path)? {
                    return Err($crate::hierarchy::HierarchyError::MissingChild(
                        path.to_string(),
                    ));
                }
                Ok(Self {
                    $(
                        $field: {
                            let child = $crate::hierarchy::child_path(path, stringify!($field))?;
                            if !<$field_type as $crate::hierarchy::LoadHierarchy>::exists_hierarchy(
                                storage, &child,
                            )? {
                                return Err($crate::hierarchy::HierarchyError::MissingChild(
                                    stringify!($field).to_string(),
                                ));
                            }
                            <$field_type as $crate::hierarchy::LoadHierarchy>::load_hierarchy(
                                storage, &child,
                            )
                            .map_err(|err| {
                                $crate::hierarchy::HierarchyError::MalformedChild(
                                    stringify!($field).to_string(),
                                    Box::new(err),
                                )
                            })?
                        },
                    )+
                })
            }

            fn exists_hierarchy<TStorage: ?Sized + $crate::storage::ReadableStorageTraits>(
                storage: &TStorage,
                path: &str,
            ) -> Result<bool, $crate::hierarchy::HierarchyError> {
                $crate::hierarchy::group_metadata_exists(storage, path)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{ArrayBuilder, DataType, Endianness};
    use crate::storage::MemoryStore;

    crate::zarr_record! {
        struct Pair {
            first: Array<i32>,
            second: Option<Array<u8>>,
        }
    }

    fn first_array() -> Array<i32> {
        ArrayBuilder::new(vec![2], DataType::Int32(Endianness::Little))
            .build(vec![1, 2])
            .unwrap()
    }

    #[test]
    fn record_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemoryStore::new();
        let pair = Pair {
            first: first_array(),
            second: Some(ArrayBuilder::new(vec![1], DataType::UInt8).build(vec![7])?),
        };
        pair.save_hierarchy(&store, "/pair")?;

        let loaded = Pair::load_hierarchy(&store, "/pair")?;
        assert_eq!(loaded, pair);
        Ok(())
    }

    #[test]
    fn record_optional_absent() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemoryStore::new();
        let pair = Pair {
            first: first_array(),
            second: None,
        };
        pair.save_hierarchy(&store, "/pair")?;

        // No subdirectory at all for the absent field.
        use crate::storage::ListableStorageTraits;
        let keys = store.list()?;
        assert!(keys.iter().all(|key| !key.as_str().contains("second")));

        let loaded = Pair::load_hierarchy(&store, "/pair")?;
        assert!(loaded.second.is_none());
        Ok(())
    }

    #[test]
    fn record_missing_child() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemoryStore::new();
        save_group_metadata(&store, "/pair")?;
        assert!(matches!(
            Pair::load_hierarchy(&store, "/pair"),
            Err(HierarchyError::MissingChild(name)) if name == "first"
        ));
        Ok(())
    }

    #[test]
    fn record_malformed_child() -> Result<(), Box<dyn std::error::Error>> {
        use crate::storage::WritableStorageTraits;
        let store = MemoryStore::new();
        let pair = Pair {
            first: first_array(),
            second: None,
        };
        pair.save_hierarchy(&store, "/pair")?;
        store.set(&"pair/first/.zarray".try_into()?, b"not json")?;
        assert!(matches!(
            Pair::load_hierarchy(&store, "/pair"),
            Err(HierarchyError::MalformedChild(name, _)) if name == "first"
        ));
        Ok(())
    }
}
