use derive_more::Display;
use std::path::PathBuf;
use thiserror::Error;

use super::NodeName;
use crate::storage::StorePrefix;

/// A Zarr hierarchy node path.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("{}", _0.to_string_lossy())]
pub struct NodePath(PathBuf);

/// An invalid node path.
#[derive(Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new Zarr node path from `path`.
    ///
    /// # Errors
    /// Returns [`NodePathError`] if `path` is not valid according to [`NodePath::validate`()].
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(PathBuf::from(path)))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root node.
    #[must_use]
    pub fn root() -> Self {
        Self(PathBuf::from("/"))
    }

    /// Extracts a string slice containing the node path `String`.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap()
    }

    /// Return the path of the child node named `name`.
    #[must_use]
    pub fn child(&self, name: &NodeName) -> NodePath {
        let path = self.as_str();
        if path.eq("/") {
            Self(PathBuf::from(format!("/{name}")))
        } else {
            Self(PathBuf::from(format!("{path}/{name}")))
        }
    }

    /// Returns the name of the node, or an empty name for the root.
    #[must_use]
    pub fn name(&self) -> NodeName {
        let name = self.as_str().split('/').next_back().unwrap_or_default();
        unsafe { NodeName::new_unchecked(name) }
    }

    /// Validates a path according to the following rules from the specification:
    /// - a path always starts with `/`, and
    /// - a non-root path cannot end with `/`, because node names must be non-empty and cannot contain `/`.
    ///
    /// Additionally, it checks that there are no empty nodes (i.e. a `//` substring).
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path.eq("/") || (path.starts_with('/') && !path.ends_with('/') && !path.contains("//"))
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

impl TryFrom<&StorePrefix> for NodePath {
    type Error = NodePathError;

    fn try_from(prefix: &StorePrefix) -> Result<Self, Self::Error> {
        let path = "/".to_string() + prefix.as_str().strip_suffix('/').unwrap_or(prefix.as_str());
        Self::new(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path() {
        assert!(NodePath::new("/").is_ok());
        assert!(NodePath::new("/a/b").is_ok());
        assert_eq!(NodePath::new("/a/b").unwrap().to_string(), "/a/b");
        assert!(NodePath::new("/a/b/").is_err());
        assert!(NodePath::new("/a//b").is_err());
        assert!(NodePath::new("a/b").is_err());
    }

    #[test]
    fn node_path_child() {
        let root = NodePath::root();
        let child = root.child(&"temp".try_into().unwrap());
        assert_eq!(child.as_str(), "/temp");
        let grandchild = child.child(&"mask".try_into().unwrap());
        assert_eq!(grandchild.as_str(), "/temp/mask");
        assert_eq!(grandchild.name().as_str(), "mask");
    }
}
