//! A rust library for the [Zarr storage specification version 2](https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html) for chunked, compressed, N-dimensional arrays.
//!
//! A Zarr v2 hierarchy is a directory tree of JSON metadata documents
//! (`.zarray`, `.zgroup`, `.zattrs`) and binary chunk files. A single logical
//! array is partitioned into a regular grid of chunks, each independently
//! compressed and addressed by its grid coordinates.
//!
//! The best docs to start with are [`array::Array`] and [`storage`].
//!
//! ## Implementation Status
//! - [x] Arrays: all fixed-size data types (bool, integers, floats, complex,
//!   fixed-length bytes `|S`, fixed-length unicode `|U`, structured), C and F
//!   chunk layouts, `.` and `/` dimension separators, fill values.
//! - [x] Compressors: `blosc`, `zlib`, or none.
//! - [x] Stores: [`FilesystemStore`](crate::storage::FilesystemStore),
//!   [`MemoryStore`](crate::storage::MemoryStore).
//! - [x] Groups and hierarchy discovery ([`node::Node`]).
//! - [x] Generic persistence of record types as nested groups
//!   ([`hierarchy`], [`zarr_record!`]).
//! - [ ] Zarr v3, partial-chunk updates, and cloud stores are out of scope.
//!
//! ## Licence
//! zarr2 is licensed under either of
//!  - the Apache License, Version 2.0 or
//!  - the MIT license, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array;
pub mod array_subset;
pub mod group;
pub mod hierarchy;
pub mod metadata;
pub mod node;
pub mod storage;

/// Re-export [`half`].
pub use half;

/// Re-export [`num`].
pub use num;

/// Re-export [`serde_json`].
pub use serde_json;
