//! STL binary reader: header+count parse, batched triangle decode with
//! endian swap (§4.6).

use crate::endian::{self, ByteOrder};
use crate::error::{Error, ErrorKind};
use crate::memblock::Memblock;
use crate::stl::types::{BinaryHeader, Coord, MeshCreator, Triangle};
use crate::stream::Stream;

fn decode_triangle(bytes: &[u8; Triangle::WIRE_SIZE], order: ByteOrder) -> Triangle {
    let f = |off: usize| -> f32 {
        let mut b = [0u8; 4];
        b.copy_from_slice(&bytes[off..off + 4]);
        endian::decode_f32(b, order)
    };
    let coord = |off: usize| Coord::new(f(off), f(off + 4), f(off + 8));

    let normal = coord(0);
    let v1 = coord(12);
    let v2 = coord(24);
    let v3 = coord(36);
    let attr = {
        let mut b = [0u8; 2];
        b.copy_from_slice(&bytes[48..50]);
        endian::decode_u16(b, order)
    };
    Triangle::new(normal, v1, v2, v3, attr)
}

fn read_exact(stream: &mut dyn Stream, buf: &mut [u8]) -> Result<(), Error> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(Error::new(ErrorKind::StreamShortRead));
        }
        filled += n;
    }
    Ok(())
}

/// Reads an STL binary file from `stream` into `creator`, using `memblock`
/// as the sole scratch buffer for triangle batches, decoding with `order`.
///
/// `progress`, if given, is called as `(triangles_done, triangles_total)`
/// after every decoded triangle; returning `false` aborts the read with
/// [`ErrorKind::TaskStopped`].
///
/// `stream` must be positioned at the start of the STL file.
pub fn stlb_read(
    stream: &mut dyn Stream,
    creator: &mut dyn MeshCreator,
    memblock: &mut Memblock,
    order: ByteOrder,
    mut progress: Option<&mut dyn FnMut(u64, u64) -> bool>,
) -> Result<(), Error> {
    if !memblock.is_valid() {
        return Err(Error::new(ErrorKind::InvalidMemblockSize));
    }

    let mut header_bytes = [0u8; 80];
    read_exact(stream, &mut header_bytes).map_err(|_| Error::new(ErrorKind::StlBinaryBadHeader))?;
    let header = BinaryHeader(header_bytes);

    let mut count_bytes = [0u8; 4];
    read_exact(stream, &mut count_bytes)
        .map_err(|_| Error::new(ErrorKind::StlBinaryBadHeader))?;
    let tri_count = u32::from_le_bytes(count_bytes);

    if let (Some(size), Ok(pos)) = (stream.size(), stream.tell()) {
        let expected_remaining = u64::from(tri_count) * Triangle::WIRE_SIZE as u64;
        let actual_remaining = size.saturating_sub(pos);
        if expected_remaining != actual_remaining {
            return Err(Error::new(ErrorKind::StreamLengthMismatch));
        }
    }

    log::debug!("stlb_read: tri_count={tri_count} order={order:?}");
    creator.binary_begin_solid(tri_count, &header);

    let batch_size = (memblock.len() / Triangle::WIRE_SIZE).max(1);
    let scratch = memblock.as_mut_slice();

    let mut tri_id = 0u32;
    while tri_id < tri_count {
        let remaining = (tri_count - tri_id) as usize;
        let batch = remaining.min(batch_size);
        let batch_bytes = batch * Triangle::WIRE_SIZE;
        read_exact(stream, &mut scratch[..batch_bytes])
            .map_err(|_| Error::new(ErrorKind::StreamShortRead))?;

        log::trace!("stlb_read: batch of {batch} triangles");
        for i in 0..batch {
            let off = i * Triangle::WIRE_SIZE;
            let mut raw = [0u8; Triangle::WIRE_SIZE];
            raw.copy_from_slice(&scratch[off..off + Triangle::WIRE_SIZE]);
            let triangle = decode_triangle(&raw, order);
            creator.add_triangle(tri_id, &triangle);
            tri_id += 1;
            if let Some(progress) = progress.as_mut() {
                if !progress(u64::from(tri_id), u64::from(tri_count)) {
                    return Err(Error::new(ErrorKind::TaskStopped));
                }
            }
        }
    }

    creator.end_solid();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memblock::Memblock;
    use crate::stream::MemReader;

    struct Collector {
        header: Option<BinaryHeader>,
        triangles: Vec<Triangle>,
        ended: bool,
        begin_count: Option<u32>,
    }

    impl Collector {
        fn new() -> Self {
            Self {
                header: None,
                triangles: Vec::new(),
                ended: false,
                begin_count: None,
            }
        }
    }

    impl MeshCreator for Collector {
        fn binary_begin_solid(&mut self, triangle_count: u32, header: &BinaryHeader) {
            assert!(self.triangles.is_empty(), "begin before any triangle");
            self.header = Some(*header);
            self.begin_count = Some(triangle_count);
        }

        fn add_triangle(&mut self, id: u32, triangle: &Triangle) {
            assert_eq!(id as usize, self.triangles.len());
            self.triangles.push(*triangle);
        }

        fn end_solid(&mut self) {
            self.ended = true;
        }
    }

    fn sample_binary() -> Vec<u8> {
        let mut buf = vec![0u8; 80];
        buf.extend_from_slice(&2u32.to_le_bytes());

        let t1 = Triangle::new(
            Coord::new(0.0, 0.0, 1.0),
            Coord::new(0.0, 0.0, 0.0),
            Coord::new(1.0, 0.0, 0.0),
            Coord::new(0.0, 1.0, 0.0),
            0,
        );
        let t2 = Triangle::new(
            Coord::new(0.0, 1.0, 0.0),
            Coord::new(0.0, 0.0, 0.0),
            Coord::new(1.0, 0.0, 0.0),
            Coord::new(0.0, 0.0, 1.0),
            0xBEEF,
        );
        for t in [t1, t2] {
            for c in [t.normal, t.v1, t.v2, t.v3] {
                buf.extend_from_slice(&c.x.to_le_bytes());
                buf.extend_from_slice(&c.y.to_le_bytes());
                buf.extend_from_slice(&c.z.to_le_bytes());
            }
            buf.extend_from_slice(&t.attr_byte_count.to_le_bytes());
        }
        buf
    }

    #[test]
    fn binary_round_trip_scenario() {
        let data = sample_binary();
        assert_eq!(data.len(), 184);

        let mut reader = MemReader::new(&data);
        let mut collector = Collector::new();
        let mut mb = Memblock::from_vec(vec![0u8; 4096]);
        stlb_read(&mut reader, &mut collector, &mut mb, ByteOrder::Little, None).unwrap();

        assert_eq!(collector.begin_count, Some(2));
        assert_eq!(collector.triangles.len(), 2);
        assert_eq!(collector.triangles[1].attr_byte_count, 0xBEEF);
        assert!(collector.ended);
    }

    #[test]
    fn small_memblock_forces_multiple_batches() {
        let data = sample_binary();
        let mut reader = MemReader::new(&data);
        let mut collector = Collector::new();
        // One triangle per batch.
        let mut mb = Memblock::from_vec(vec![0u8; Triangle::WIRE_SIZE]);
        stlb_read(&mut reader, &mut collector, &mut mb, ByteOrder::Little, None).unwrap();
        assert_eq!(collector.triangles.len(), 2);
    }

    #[test]
    fn short_header_is_an_error() {
        let data = vec![0u8; 10];
        let mut reader = MemReader::new(&data);
        let mut collector = Collector::new();
        let mut mb = Memblock::from_vec(vec![0u8; 512]);
        let err = stlb_read(&mut reader, &mut collector, &mut mb, ByteOrder::Little, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StlBinaryBadHeader);
    }

    #[test]
    fn length_mismatch_is_detected_when_size_is_known() {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&5u32.to_le_bytes()); // claims 5 triangles
        let mut reader = MemReader::new(&data);
        let mut collector = Collector::new();
        let mut mb = Memblock::from_vec(vec![0u8; 512]);
        let err = stlb_read(&mut reader, &mut collector, &mut mb, ByteOrder::Little, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StreamLengthMismatch);
    }
}
