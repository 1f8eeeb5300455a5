use std::error::Error;

use zarr2::{
    array::{Array, ArrayBuilder, DataType, Endianness},
    metadata::{DimensionSeparator, Order},
    storage::{
        FilesystemStore, ListableStorageTraits, MemoryStore, ReadableStorageTraits,
        WritableStorageTraits,
    },
};

/// 1-D int round-trip: byte-exact little-endian chunk payloads.
#[test]
fn one_dimensional_int_round_trip() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let array: Array<i32> = ArrayBuilder::new(vec![6], DataType::Int32(Endianness::Little))
        .chunk_shape(vec![3])
        .build(vec![1, 2, 3, 4, 5, 6])?;
    array.save(&store, "/array")?;

    let keys: Vec<String> = store
        .list()?
        .iter()
        .map(|key| key.as_str().to_string())
        .collect();
    assert_eq!(keys, ["array/.zarray", "array/0", "array/1"]);

    assert_eq!(
        store.get(&"array/0".try_into()?)?.unwrap(),
        &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]
    );
    assert_eq!(
        store.get(&"array/1".try_into()?)?.unwrap(),
        &[4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 0, 0]
    );

    let loaded: Array<i32> = Array::load(&store, "/array")?;
    assert_eq!(loaded.to_vec(), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(loaded, array);
    Ok(())
}

/// Big-endian payloads are byte-swapped on disk and reload equal.
#[test]
fn one_dimensional_int_big_endian() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let array: Array<i32> = ArrayBuilder::new(vec![2], DataType::Int32(Endianness::Big))
        .chunk_shape(vec![2])
        .build(vec![1, 2])?;
    array.save(&store, "/array")?;

    assert_eq!(
        store.get(&"array/0".try_into()?)?.unwrap(),
        &[0, 0, 0, 1, 0, 0, 0, 2]
    );
    let loaded: Array<i32> = Array::load(&store, "/array")?;
    assert_eq!(loaded.to_vec(), vec![1, 2]);
    Ok(())
}

/// Ragged last chunk: the tail chunk file is full-size, padded with fill.
#[test]
fn ragged_last_chunk_padded_with_fill() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let array: Array<u8> = ArrayBuilder::new(vec![5], DataType::UInt8)
        .chunk_shape(vec![2])
        .fill_value(0)
        .build(vec![10, 20, 30, 40, 50])?;
    array.save(&store, "/array")?;

    assert_eq!(store.get(&"array/0".try_into()?)?.unwrap(), &[10, 20]);
    assert_eq!(store.get(&"array/1".try_into()?)?.unwrap(), &[30, 40]);
    assert_eq!(store.get(&"array/2".try_into()?)?.unwrap(), &[50, 0]);

    let loaded: Array<u8> = Array::load(&store, "/array")?;
    assert_eq!(loaded.to_vec(), vec![10, 20, 30, 40, 50]);
    Ok(())
}

/// Arrays written with order C and order F hold the same logical elements.
#[test]
fn order_c_and_f_load_equal() -> Result<(), Box<dyn Error>> {
    let elements: Vec<i16> = (0..12).collect();
    let store = MemoryStore::new();
    for (path, order) in [("/c", Order::C), ("/f", Order::F)] {
        let array: Array<i16> = ArrayBuilder::new(vec![3, 4], DataType::Int16(Endianness::Little))
            .chunk_shape(vec![2, 2])
            .order(order)
            .build(elements.clone())?;
        array.save(&store, path)?;
    }

    // The on-disk payloads differ...
    assert_ne!(
        store.get(&"c/0.0".try_into()?)?.unwrap(),
        store.get(&"f/0.0".try_into()?)?.unwrap()
    );

    // ...but the logical arrays are equal.
    let c: Array<i16> = Array::load(&store, "/c")?;
    let f: Array<i16> = Array::load(&store, "/f")?;
    assert_eq!(c.to_vec(), elements);
    assert_eq!(f.to_vec(), elements);
    Ok(())
}

/// F-order payload of one chunk has the first axis fastest.
#[test]
fn order_f_payload_layout() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let array: Array<u8> = ArrayBuilder::new(vec![2, 2], DataType::UInt8)
        .chunk_shape(vec![2, 2])
        .order(Order::F)
        .build(vec![1, 2, 3, 4])?;
    array.save(&store, "/array")?;
    // Row-major elements [[1, 2], [3, 4]] stored column-major.
    assert_eq!(store.get(&"array/0.0".try_into()?)?.unwrap(), &[1, 3, 2, 4]);
    Ok(())
}

/// The `/` dimension separator nests chunk files in subdirectories.
#[test]
fn slash_dimension_separator() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let array: Array<u8> = ArrayBuilder::new(vec![2, 2], DataType::UInt8)
        .chunk_shape(vec![1, 2])
        .dimension_separator(DimensionSeparator::Slash)
        .build(vec![1, 2, 3, 4])?;
    array.save(&store, "/array")?;

    assert_eq!(store.get(&"array/0/0".try_into()?)?.unwrap(), &[1, 2]);
    assert_eq!(store.get(&"array/1/0".try_into()?)?.unwrap(), &[3, 4]);

    let loaded: Array<u8> = Array::load(&store, "/array")?;
    assert_eq!(loaded.to_vec(), vec![1, 2, 3, 4]);
    Ok(())
}

/// Round-trip through a filesystem store, checking the directory layout.
#[test]
#[cfg_attr(miri, ignore)]
fn filesystem_round_trip() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let store = FilesystemStore::new(path.path())?;

    let mut attributes = serde_json::Map::new();
    attributes.insert("units".to_string(), "K".into());
    let array: Array<f32> = ArrayBuilder::new(vec![4], DataType::Float32(Endianness::Little))
        .chunk_shape(vec![2])
        .fill_value(0.0)
        .attributes(attributes)
        .build(vec![1.0, 2.0, 3.0, 4.0])?;
    array.save(&store, "/temp")?;

    assert!(path.path().join("temp/.zarray").is_file());
    assert!(path.path().join("temp/.zattrs").is_file());
    assert!(path.path().join("temp/0").is_file());
    assert!(path.path().join("temp/1").is_file());

    let loaded: Array<f32> = Array::load(&store, "/temp")?;
    assert_eq!(loaded, array);
    assert_eq!(
        loaded.attributes().unwrap().get("units"),
        Some(&serde_json::Value::from("K"))
    );
    Ok(())
}

/// A rank-0 array persists as the single chunk key `0`.
#[test]
fn rank_0_round_trip() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let array: Array<f64> = ArrayBuilder::new(vec![], DataType::Float64(Endianness::Little))
        .build(vec![6.5])?;
    array.save(&store, "/scalar")?;

    assert!(store.get(&"scalar/0".try_into()?)?.is_some());
    let loaded: Array<f64> = Array::load(&store, "/scalar")?;
    assert_eq!(loaded.get(&[])?, &6.5);
    Ok(())
}

/// Loading with a mismatched element type fails.
#[test]
fn load_element_type_mismatch() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let array: Array<i32> = ArrayBuilder::new(vec![2], DataType::Int32(Endianness::Little))
        .build(vec![1, 2])?;
    array.save(&store, "/array")?;
    assert!(Array::<u8>::load(&store, "/array").is_err());
    Ok(())
}

/// Loading a missing array fails with missing metadata.
#[test]
fn load_missing_metadata() {
    let store = MemoryStore::new();
    assert!(matches!(
        Array::<u8>::load(&store, "/array"),
        Err(zarr2::array::ArrayCreateError::MissingMetadata)
    ));
}

/// Unknown filters fail loudly rather than being skipped.
#[test]
fn load_unknown_filter() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let array: Array<u8> = ArrayBuilder::new(vec![2], DataType::UInt8).build(vec![1, 2])?;
    array.save(&store, "/array")?;

    let metadata = store.get(&"array/.zarray".try_into()?)?.unwrap();
    let mut metadata: serde_json::Value = serde_json::from_slice(&metadata)?;
    metadata["filters"] = serde_json::json!([{"id": "delta", "dtype": "|u1"}]);
    store.set(&"array/.zarray".try_into()?, &serde_json::to_vec(&metadata)?)?;

    assert!(Array::<u8>::load(&store, "/array").is_err());
    Ok(())
}
