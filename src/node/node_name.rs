use derive_more::Display;
use thiserror::Error;

/// The name of a Zarr hierarchy node.
///
/// A node name is the final component of a node path. It must be non-empty,
/// must not contain `/`, and must not be one of the reserved metadata file
/// names (`.zarray`, `.zgroup`, `.zattrs`).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct NodeName(String);

/// An invalid node name.
#[derive(Debug, Error)]
#[error("invalid node name {0}")]
pub struct NodeNameError(String);

impl NodeName {
    /// Create a new Zarr node name from `name`.
    ///
    /// # Errors
    /// Returns [`NodeNameError`] if `name` is not valid according to [`NodeName::validate`()].
    pub fn new(name: impl Into<String>) -> Result<Self, NodeNameError> {
        let name = name.into();
        if Self::validate(&name) {
            Ok(Self(name))
        } else {
            Err(NodeNameError(name))
        }
    }

    /// Create a new Zarr node name from `name` without validation.
    ///
    /// # Safety
    /// `name` is not validated, so this can result in an invalid node name.
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(name.is_empty() || Self::validate(&name));
        Self(name)
    }

    /// Extracts a string slice of the underlying name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a name.
    #[must_use]
    pub fn validate(name: &str) -> bool {
        !name.is_empty()
            && !name.contains('/')
            && !matches!(name, ".zarray" | ".zgroup" | ".zattrs")
    }
}

impl TryFrom<&str> for NodeName {
    type Error = NodeNameError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_name() {
        assert!(NodeName::new("a").is_ok());
        assert!(NodeName::new("").is_err());
        assert!(NodeName::new("a/b").is_err());
        assert!(NodeName::new(".zarray").is_err());
        assert_eq!(NodeName::new("temp").unwrap().as_str(), "temp");
    }
}
