use std::{error::Error, sync::Arc};

use zarr2::{
    array::{Array, ArrayBuilder, DataType, Endianness},
    group::Group,
    hierarchy::{LoadHierarchy, SaveHierarchy},
    node::Node,
    storage::{FilesystemStore, MemoryStore},
    zarr_record,
};

zarr_record! {
    /// A record of one measurement pass.
    pub struct Measurements {
        temp: Array<f32>,
        mask: Array<u8>,
    }
}

fn measurements() -> Result<Measurements, Box<dyn Error>> {
    Ok(Measurements {
        temp: ArrayBuilder::new(vec![4], DataType::Float32(Endianness::Little))
            .chunk_shape(vec![4])
            .build(vec![20.5, 21.0, 19.5, 18.0])?,
        mask: ArrayBuilder::new(vec![4], DataType::UInt8)
            .chunk_shape(vec![4])
            .build(vec![1, 1, 0, 1])?,
    })
}

/// A two-field record persists as a group of two arrays.
#[test]
#[cfg_attr(miri, ignore)]
fn record_of_two_arrays() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::TempDir::new()?;
    let store = FilesystemStore::new(dir.path())?;

    measurements()?.save_hierarchy(&store, "/obs")?;

    for expected in [
        "obs/.zgroup",
        "obs/temp/.zarray",
        "obs/temp/0",
        "obs/mask/.zarray",
        "obs/mask/0",
    ] {
        assert!(dir.path().join(expected).is_file(), "{expected}");
    }

    let loaded = Measurements::load_hierarchy(&store, "/obs")?;
    assert_eq!(loaded, measurements()?);
    Ok(())
}

/// Records nest: a record saved under another record's directory.
#[test]
fn nested_records() -> Result<(), Box<dyn Error>> {
    zarr_record! {
        pub struct Dataset {
            observations: Measurements,
            reference: Option<Array<f32>>,
        }
    }

    let store = MemoryStore::new();
    let dataset = Dataset {
        observations: measurements()?,
        reference: None,
    };
    dataset.save_hierarchy(&store, "/dataset")?;

    let loaded = Dataset::load_hierarchy(&store, "/dataset")?;
    assert_eq!(loaded, dataset);
    assert!(loaded.reference.is_none());
    Ok(())
}

/// Group child discovery and typed child access.
#[test]
fn group_discovers_children() -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    measurements()?.save_hierarchy(&*store, "/obs")?;

    let group = Group::open(store, "/obs")?;
    let mut names: Vec<_> = group
        .child_names()?
        .iter()
        .map(|name| name.as_str().to_string())
        .collect();
    names.sort();
    assert_eq!(names, ["mask", "temp"]);

    let temp: Array<f32> = group.array("temp")?;
    assert_eq!(temp.to_vec(), vec![20.5, 21.0, 19.5, 18.0]);
    Ok(())
}

/// The node hierarchy opens recursively and renders as a tree.
#[test]
fn node_hierarchy_tree() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    measurements()?.save_hierarchy(&store, "/obs")?;

    let node = Node::open(&store, "/obs")?;
    assert!(!node.is_root());
    assert_eq!(node.children().len(), 2);

    let tree = node.hierarchy_tree();
    assert!(tree.contains("mask"), "{tree}");
    assert!(tree.contains("temp"), "{tree}");
    assert!(tree.contains("<f4"), "{tree}");
    Ok(())
}

/// A variant value saves against the same directory and is recovered
/// structurally.
#[test]
fn sum_type_dispatch() -> Result<(), Box<dyn Error>> {
    zarr_record! {
        pub struct Wide {
            wide: Array<f64>,
        }
    }
    zarr_record! {
        pub struct Narrow {
            narrow: Array<u8>,
        }
    }

    #[derive(Debug, PartialEq)]
    enum Either {
        Wide(Wide),
        Narrow(Narrow),
    }

    impl SaveHierarchy for Either {
        fn save_hierarchy<TStorage: ?Sized + zarr2::storage::WritableStorageTraits>(
            &self,
            storage: &TStorage,
            path: &str,
        ) -> Result<(), zarr2::hierarchy::HierarchyError> {
            match self {
                Either::Wide(wide) => wide.save_hierarchy(storage, path),
                Either::Narrow(narrow) => narrow.save_hierarchy(storage, path),
            }
        }
    }

    impl LoadHierarchy for Either {
        fn load_hierarchy<TStorage: ?Sized + zarr2::storage::ReadableStorageTraits>(
            storage: &TStorage,
            path: &str,
        ) -> Result<Self, zarr2::hierarchy::HierarchyError> {
            if let Ok(wide) = Wide::load_hierarchy(storage, path) {
                return Ok(Either::Wide(wide));
            }
            Narrow::load_hierarchy(storage, path).map(Either::Narrow)
        }

        fn exists_hierarchy<TStorage: ?Sized + zarr2::storage::ReadableStorageTraits>(
            storage: &TStorage,
            path: &str,
        ) -> Result<bool, zarr2::hierarchy::HierarchyError> {
            zarr2::hierarchy::group_metadata_exists(storage, path)
        }
    }

    let store = MemoryStore::new();
    let narrow = Either::Narrow(Narrow {
        narrow: ArrayBuilder::new(vec![2], DataType::UInt8).build(vec![1, 2])?,
    });
    narrow.save_hierarchy(&store, "/either")?;

    let loaded = Either::load_hierarchy(&store, "/either")?;
    assert_eq!(loaded, narrow);
    Ok(())
}
