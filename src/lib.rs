// SPDX-License-Identifier: MIT OR Apache-2.0
//! Streaming, allocation-light, endian-correct, locale-safe STL (ASCII and
//! binary) mesh codec, plus a minimal ZIP/Zip64 container reader/writer for
//! shipping STL files inside a single-entry archive.
//!
//! The whole surface is built around a few small capability traits rather
//! than concrete types: [`stream::Stream`] for I/O, [`stl::Mesh`] /
//! [`stl::MeshCreator`] for mesh production/consumption. Callers supply a
//! [`memblock::Memblock`] scratch buffer; this crate never allocates on the
//! read/write hot path beyond what that buffer and the ASCII line cursor
//! need.
//!
//! Usage in the high level:
//!
//! 1. Pick a [`stream::Stream`] (`MemReader`/`MemReadWrite` for in-memory
//!    data, `StdStream` for files via [`stl::stl_read_file`]/
//!    [`stl::stl_write_file`]).
//! 2. Implement [`stl::MeshCreator`] (read direction) or [`stl::Mesh`]
//!    (write direction) over your own mesh representation.
//! 3. Call [`stl::stl_read`]/[`stl::stl_write`] with an [`stl::Options`].
//!
//! The [`zip`] module is independent of the STL codec: it knows nothing
//! about triangles, only about bytes a caller hands it.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ascii_num;
pub mod endian;
pub mod error;
pub mod locale;
pub mod memblock;
pub mod numeric;
pub mod stl;
pub mod stream;
pub mod stringstream;
pub mod strutil;
pub mod zip;

pub use error::{Error, ErrorKind, Result};
