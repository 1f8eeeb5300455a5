//! Zarr hierarchy nodes.
//!
//! A node in a Zarr v2 hierarchy represents either an
//! [`Array`](crate::array::Array) or a [`Group`](crate::group::Group).
//! Unlike Zarr v3, a v2 node is identified by which reserved metadata
//! document is present in its directory: `.zarray` for arrays and `.zgroup`
//! for groups.
//!
//! The [`Node::open`] function reads a whole subtree, and
//! [`Node::hierarchy_tree`] renders it as a string.

mod node_name;
mod node_path;

pub use node_name::{NodeName, NodeNameError};
pub use node_path::{NodePath, NodePathError};

use thiserror::Error;

use crate::{
    metadata::{ArrayMetadata, GroupMetadata},
    storage::{
        meta_key_array, meta_key_group, ListableStorageTraits, ReadableStorageTraits,
        StorageError, StorePrefix,
    },
};

/// The metadata of a hierarchy node: either an array or a group.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeMetadata {
    /// Array metadata (`.zarray`).
    Array(ArrayMetadata),
    /// Group metadata (`.zgroup`).
    Group(GroupMetadata),
}

/// A Zarr hierarchy node.
#[derive(Debug)]
pub struct Node {
    /// Node path.
    path: NodePath,
    /// Node metadata.
    metadata: NodeMetadata,
    /// Node children.
    ///
    /// Only group nodes can have children.
    children: Vec<Node>,
}

/// A node creation error.
#[derive(Debug, Error)]
pub enum NodeCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Neither `.zarray` nor `.zgroup` was found at the node path.
    #[error("no array or group metadata found at {0}")]
    MissingMetadata(NodePath),
    /// An error parsing the metadata.
    #[error("{0}")]
    Metadata(String),
}

impl Node {
    /// Create a new node at `path` with `metadata` and `children`.
    #[must_use]
    pub fn new(path: NodePath, metadata: NodeMetadata, children: Vec<Node>) -> Self {
        Self {
            path,
            metadata,
            children,
        }
    }

    /// Open the node at `path` in `storage`, reading metadata and children.
    ///
    /// Children are discovered recursively by directory enumeration;
    /// directories holding neither `.zarray` nor `.zgroup` are skipped.
    ///
    /// # Errors
    /// Returns [`NodeCreateError`] if metadata is missing or invalid, or
    /// there is a failure to list child nodes.
    pub fn open<TStorage: ?Sized + ReadableStorageTraits + ListableStorageTraits>(
        storage: &TStorage,
        path: &str,
    ) -> Result<Self, NodeCreateError> {
        let path: NodePath = path.try_into()?;
        Self::open_impl(storage, path)
    }

    fn open_impl<TStorage: ?Sized + ReadableStorageTraits + ListableStorageTraits>(
        storage: &TStorage,
        path: NodePath,
    ) -> Result<Self, NodeCreateError> {
        let metadata = Self::read_metadata(storage, &path)?
            .ok_or_else(|| NodeCreateError::MissingMetadata(path.clone()))?;
        let children = match metadata {
            NodeMetadata::Array(_) => Vec::default(),
            NodeMetadata::Group(_) => {
                let prefix: StorePrefix = (&path)
                    .try_into()
                    .map_err(StorageError::StorePrefixError)?;
                let mut children = Vec::new();
                for child_prefix in storage.list_dir(&prefix)?.prefixes() {
                    let child_path: NodePath = child_prefix
                        .try_into()
                        .map_err(NodeCreateError::NodePathError)?;
                    if Self::read_metadata(storage, &child_path)?.is_some() {
                        children.push(Self::open_impl(storage, child_path)?);
                    }
                }
                children
            }
        };
        Ok(Node {
            path,
            metadata,
            children,
        })
    }

    fn read_metadata<TStorage: ?Sized + ReadableStorageTraits>(
        storage: &TStorage,
        path: &NodePath,
    ) -> Result<Option<NodeMetadata>, NodeCreateError> {
        if let Some(bytes) = storage.get(&meta_key_array(path))? {
            let metadata: ArrayMetadata = serde_json::from_slice(&bytes)
                .map_err(|err| NodeCreateError::Metadata(err.to_string()))?;
            return Ok(Some(NodeMetadata::Array(metadata)));
        }
        if let Some(bytes) = storage.get(&meta_key_group(path))? {
            let metadata: GroupMetadata = serde_json::from_slice(&bytes)
                .map_err(|err| NodeCreateError::Metadata(err.to_string()))?;
            return Ok(Some(NodeMetadata::Group(metadata)));
        }
        Ok(None)
    }

    /// Indicates if a node is the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.as_str().eq("/")
    }

    /// Returns the path of the node.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Returns the name of the node.
    #[must_use]
    pub fn name(&self) -> NodeName {
        self.path.name()
    }

    /// Returns the metadata of the node.
    #[must_use]
    pub const fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    /// Returns the children of the node.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Return a tree representation of a hierarchy as a string.
    ///
    /// Arrays are annotated with their shape and data type.
    /// For example:
    /// ```text
    /// a
    ///   baz [10000, 1000] <f8
    ///   foo [10000, 1000] <f8
    /// b
    /// ```
    #[must_use]
    pub fn hierarchy_tree(&self) -> String {
        fn print_metadata(name: &str, string: &mut String, metadata: &NodeMetadata) {
            match metadata {
                NodeMetadata::Array(array_metadata) => {
                    let s = format!(
                        "{} {:?} {}",
                        name, array_metadata.shape, array_metadata.dtype
                    );
                    string.push_str(&s);
                }
                NodeMetadata::Group(_) => {
                    string.push_str(name);
                }
            }
            string.push('\n');
        }

        fn update_tree(string: &mut String, children: &[Node], depth: usize) {
            for child in children {
                let name = child.name();
                string.push_str(&" ".repeat(depth * 2));
                print_metadata(name.as_str(), string, &child.metadata);
                update_tree(string, &child.children, depth + 1);
            }
        }

        let mut string = String::default();
        print_metadata("/", &mut string, &self.metadata);
        update_tree(&mut string, &self.children, 1);
        string
    }
}
