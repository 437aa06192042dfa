//! STL mesh codec: binary and ASCII variants behind a shared `Mesh`/
//! `MeshCreator` capability interface, plus format detection and the public
//! entry points in [`facade`].

pub mod ascii_reader;
pub mod ascii_writer;
pub mod binary_reader;
pub mod binary_writer;
pub mod facade;
pub mod types;

pub use ascii_reader::stla_read;
pub use ascii_writer::stla_write;
pub use binary_reader::stlb_read;
pub use binary_writer::stlb_write;
pub use facade::{
    detect_format, probe, stl_read, stl_read_file, stl_write, stl_write_file, Format,
    FormatChoice, Options, ProbeInfo,
};
pub use types::{BinaryHeader, Coord, Mesh, MeshCreator, Triangle};
