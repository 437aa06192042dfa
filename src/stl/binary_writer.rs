//! STL binary writer: header+count emit, batched triangle encode with
//! endian swap (§4.7). Dual of [`crate::stl::binary_reader`].

use crate::endian::{self, ByteOrder};
use crate::error::{Error, ErrorKind};
use crate::memblock::Memblock;
use crate::stl::types::{BinaryHeader, Mesh, Triangle};
use crate::stream::Stream;

fn encode_triangle(triangle: &Triangle, order: ByteOrder, out: &mut [u8; Triangle::WIRE_SIZE]) {
    let mut off = 0;
    for coord in [triangle.normal, triangle.v1, triangle.v2, triangle.v3] {
        for component in [coord.x, coord.y, coord.z] {
            out[off..off + 4].copy_from_slice(&endian::encode_f32(component, order));
            off += 4;
        }
    }
    out[48..50].copy_from_slice(&endian::encode_u16(triangle.attr_byte_count, order));
}

fn write_all(stream: &mut dyn Stream, buf: &[u8]) -> Result<(), Error> {
    let mut written = 0;
    while written < buf.len() {
        let n = stream.write(&buf[written..])?;
        if n == 0 {
            return Err(Error::new(ErrorKind::StreamShortWrite));
        }
        written += n;
    }
    Ok(())
}

/// Writes `mesh` to `stream` as STL binary, using `memblock` as the sole
/// scratch buffer for triangle batches, encoding with `order`.
///
/// `progress`, if given, is called as `(triangles_done, triangles_total)`
/// after every encoded triangle; returning `false` aborts the write with
/// [`ErrorKind::TaskStopped`].
pub fn stlb_write(
    stream: &mut dyn Stream,
    mesh: &dyn Mesh,
    memblock: &mut Memblock,
    order: ByteOrder,
    header: Option<&BinaryHeader>,
    mut progress: Option<&mut dyn FnMut(u64, u64) -> bool>,
) -> Result<(), Error> {
    if !memblock.is_valid() {
        return Err(Error::new(ErrorKind::InvalidMemblockSize));
    }

    let header = header.copied().unwrap_or_default();
    write_all(stream, header.as_bytes())?;

    let tri_count = mesh.triangle_count();
    write_all(stream, &tri_count.to_le_bytes())?;

    log::debug!("stlb_write: tri_count={tri_count} order={order:?}");

    let batch_size = (memblock.len() / Triangle::WIRE_SIZE).max(1);
    let scratch = memblock.as_mut_slice();

    let mut tri_id = 0u32;
    while tri_id < tri_count {
        let remaining = (tri_count - tri_id) as usize;
        let batch = remaining.min(batch_size);

        for i in 0..batch {
            let triangle = mesh.get_triangle(tri_id + i as u32);
            let off = i * Triangle::WIRE_SIZE;
            let mut raw = [0u8; Triangle::WIRE_SIZE];
            encode_triangle(&triangle, order, &mut raw);
            scratch[off..off + Triangle::WIRE_SIZE].copy_from_slice(&raw);
        }
        log::trace!("stlb_write: batch of {batch} triangles");
        write_all(stream, &scratch[..batch * Triangle::WIRE_SIZE])?;
        tri_id += batch as u32;
        if let Some(progress) = progress.as_mut() {
            if !progress(u64::from(tri_id), u64::from(tri_count)) {
                return Err(Error::new(ErrorKind::TaskStopped));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stl::types::Coord;
    use crate::stream::MemReadWrite;

    struct FixedMesh(Vec<Triangle>);

    impl Mesh for FixedMesh {
        fn triangle_count(&self) -> u32 {
            self.0.len() as u32
        }
        fn get_triangle(&self, id: u32) -> Triangle {
            self.0[id as usize]
        }
    }

    fn sample_triangles() -> Vec<Triangle> {
        vec![
            Triangle::new(
                Coord::new(0.0, 0.0, 1.0),
                Coord::new(0.0, 0.0, 0.0),
                Coord::new(1.0, 0.0, 0.0),
                Coord::new(0.0, 1.0, 0.0),
                0,
            ),
            Triangle::new(
                Coord::new(0.0, 1.0, 0.0),
                Coord::new(0.0, 0.0, 0.0),
                Coord::new(1.0, 0.0, 0.0),
                Coord::new(0.0, 0.0, 1.0),
                0xBEEF,
            ),
        ]
    }

    #[test]
    fn binary_round_trip_byte_for_byte() {
        use crate::stl::binary_reader::stlb_read;
        use crate::stl::types::{BinaryHeader, MeshCreator};

        let mesh = FixedMesh(sample_triangles());
        let mut stream = MemReadWrite::new();
        let mut mb = Memblock::from_vec(vec![0u8; 4096]);
        stlb_write(&mut stream, &mesh, &mut mb, ByteOrder::Little, None, None).unwrap();

        let bytes = stream.into_inner();
        assert_eq!(bytes.len(), 184);

        struct Collector(Vec<Triangle>);
        impl MeshCreator for Collector {
            fn add_triangle(&mut self, _id: u32, t: &Triangle) {
                self.0.push(*t);
            }
        }

        let mut reader = crate::stream::MemReader::new(&bytes);
        let mut collector = Collector(Vec::new());
        let mut mb = Memblock::from_vec(vec![0u8; 4096]);
        stlb_read(&mut reader, &mut collector, &mut mb, ByteOrder::Little, None).unwrap();

        for (original, read_back) in mesh.0.iter().zip(collector.0.iter()) {
            let mut raw_original = [0u8; Triangle::WIRE_SIZE];
            let mut raw_read_back = [0u8; Triangle::WIRE_SIZE];
            encode_triangle(original, ByteOrder::Little, &mut raw_original);
            encode_triangle(read_back, ByteOrder::Little, &mut raw_read_back);
            assert_eq!(raw_original, raw_read_back);
        }
        let _ = BinaryHeader::zeroed();
    }

    #[test]
    fn zero_triangle_header_defaults_to_zero_filled() {
        let mesh = FixedMesh(Vec::new());
        let mut stream = MemReadWrite::new();
        let mut mb = Memblock::from_vec(vec![0u8; 256]);
        stlb_write(&mut stream, &mesh, &mut mb, ByteOrder::Little, None, None).unwrap();
        let bytes = stream.into_inner();
        assert_eq!(&bytes[..80], &[0u8; 80][..]);
        assert_eq!(&bytes[80..84], &0u32.to_le_bytes());
    }
}
