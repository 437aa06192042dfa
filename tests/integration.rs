//! End-to-end scenarios from the format specification (§8), driven through
//! `MemReader`/`MemReadWrite`, mirroring the teacher's own `tests/` style of
//! exercising the public entry points rather than internals.

use stl_zip_codec::locale::LocaleGuard;
use stl_zip_codec::memblock::Memblock;
use stl_zip_codec::stl::{
    self, stla_read, stla_write, stlb_read, stlb_write, Coord, Format, MeshCreator, Options,
    Triangle,
};
use stl_zip_codec::stream::{MemReadWrite, MemReader, Stream};
use stl_zip_codec::zip::{self, CompressionMethod};

struct RecordingMesh(Vec<Triangle>);

impl stl_zip_codec::stl::Mesh for RecordingMesh {
    fn triangle_count(&self) -> u32 {
        self.0.len() as u32
    }
    fn get_triangle(&self, id: u32) -> Triangle {
        self.0[id as usize]
    }
}

#[derive(Default)]
struct RecordingCreator {
    begin_binary: Option<u32>,
    begin_ascii_names: Vec<String>,
    triangles: Vec<(u32, Triangle)>,
    ended: u32,
}

impl MeshCreator for RecordingCreator {
    fn binary_begin_solid(&mut self, triangle_count: u32, _header: &stl_zip_codec::stl::BinaryHeader) {
        assert!(self.triangles.is_empty());
        self.begin_binary = Some(triangle_count);
    }
    fn ascii_begin_solid(&mut self, _size_hint: u64, name: &str) {
        self.begin_ascii_names.push(name.to_string());
    }
    fn add_triangle(&mut self, id: u32, t: &Triangle) {
        self.triangles.push((id, *t));
    }
    fn end_solid(&mut self) {
        self.ended += 1;
    }
}

#[test]
fn scenario_1_binary_round_trip_le() {
    let mesh = RecordingMesh(vec![
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
    ]);

    let mut stream = MemReadWrite::new();
    let mut mb = Memblock::from_vec(vec![0u8; 4096]);
    stlb_write(
        &mut stream,
        &mesh,
        &mut mb,
        stl_zip_codec::endian::ByteOrder::Little,
        None,
        None,
    )
    .unwrap();

    let bytes = stream.into_inner();
    assert_eq!(bytes.len(), 80 + 4 + 2 * 50);

    let mut reader = MemReader::new(&bytes);
    let mut collector = RecordingCreator::default();
    let mut mb = Memblock::from_vec(vec![0u8; 4096]);
    stlb_read(&mut reader, &mut collector, &mut mb, stl_zip_codec::endian::ByteOrder::Little, None).unwrap();

    assert_eq!(collector.begin_binary, Some(2));
    assert_eq!(collector.triangles.len(), 2);
    assert_eq!(collector.triangles[0].0, 0);
    assert_eq!(collector.triangles[1].0, 1);
    assert_eq!(collector.ended, 1);
}

#[test]
fn scenario_2_ascii_mixed_whitespace_and_case() {
    let _guard = LocaleGuard::force_c();
    let input = concat!(
        " SoLiD foo\n",
        " facet normal 1 0 0\n",
        "outer loop\n",
        "vertex 0 0 0\n",
        "vertex 1 0 0\n",
        "vertex 0 1 0\n",
        "endloop endfacet endsolid foo\n",
    );
    let mut reader = MemReader::new(input.as_bytes());
    let mut collector = RecordingCreator::default();
    stla_read(&mut reader, &mut collector, 64, None).unwrap();

    assert_eq!(collector.begin_ascii_names, vec!["foo"]);
    assert_eq!(collector.triangles.len(), 1);
    assert_eq!(collector.triangles[0].1.normal, Coord::new(1.0, 0.0, 0.0));
    assert_eq!(collector.triangles[0].1.attr_byte_count, 0);
}

#[test]
fn scenario_3_multi_solid_ascii_restarts_ids() {
    let _guard = LocaleGuard::force_c();
    let input = concat!(
        "solid a\n",
        "facet normal 0 0 1\nouter loop\n",
        "vertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\n",
        "endloop\nendfacet\n",
        "endsolid a\n",
        "solid b\n",
        "facet normal 0 0 1\nouter loop\n",
        "vertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\n",
        "endloop\nendfacet\n",
        "facet normal 0 1 0\nouter loop\n",
        "vertex 0 0 0\nvertex 1 0 0\nvertex 0 0 1\n",
        "endloop\nendfacet\n",
        "endsolid b\n",
    );
    let mut reader = MemReader::new(input.as_bytes());
    let mut collector = RecordingCreator::default();
    stla_read(&mut reader, &mut collector, 64, None).unwrap();

    assert_eq!(collector.begin_ascii_names, vec!["a", "b"]);
    assert_eq!(collector.ended, 2);
    let ids_in_second_solid: Vec<u32> = collector.triangles[1..].iter().map(|(id, _)| *id).collect();
    assert_eq!(ids_in_second_solid, vec![0, 1]);
}

#[test]
fn scenario_4_locale_rejection_before_touching_stream() {
    unsafe {
        let fr = std::ffi::CString::new("fr_FR.UTF-8").unwrap();
        let applied = !libc::setlocale(libc::LC_NUMERIC, fr.as_ptr()).is_null();
        if applied {
            let input = b"solid x\nendsolid x\n";
            let mut reader = MemReader::new(input);
            let mut collector = RecordingCreator::default();
            let err = stla_read(&mut reader, &mut collector, 64, None).unwrap_err();
            assert_eq!(err.kind(), stl_zip_codec::ErrorKind::BadLcNumeric);
            assert!(collector.begin_ascii_names.is_empty());
            let c = std::ffi::CString::new("C").unwrap();
            libc::setlocale(libc::LC_NUMERIC, c.as_ptr());
        }
    }
}

#[test]
fn scenario_5_fast_atof_accuracy() {
    for s in [
        "-0.0690462109446526",
        "3.402823466e+38",
        ".00234567",
        "1.175494351e-38",
    ] {
        let (got, consumed) = stl_zip_codec::ascii_num::fast_atof(s.as_bytes()).unwrap();
        assert_eq!(consumed, s.len());
        let want: f32 = s.parse().unwrap();
        assert!(stl_zip_codec::numeric::ulp_eq(got, want, 1));
    }
}

#[test]
fn scenario_6_zip64_single_file() {
    let payload = "On ne fait bien que ce qu'on fait soi-m\u{00EA}me";
    let mut stream = MemReadWrite::new();
    let mut mb = Memblock::from_vec(vec![0u8; 128]);
    let bytes_to_write = payload.as_bytes().to_vec();
    let mut offset = 0;
    zip::zip_write_single_file(
        &mut stream,
        "quote.txt",
        CompressionMethod::Store,
        &mut mb,
        true,
        |buf| {
            let remaining = &bytes_to_write[offset.min(bytes_to_write.len())..];
            let n = remaining.len().min(buf.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            offset += n;
            Ok(n)
        },
    )
    .unwrap();

    let bytes = stream.into_inner();
    let mut reader = MemReader::new(&bytes);
    assert_eq!(zip::zip_read_file_count(&mut reader).unwrap(), 1);

    let entry = zip::zip_read_entry(&mut reader, 0).unwrap();
    assert_eq!(entry.data, payload.as_bytes());
    assert_eq!(entry.uncompressed_size, payload.len() as u64);
}

#[test]
fn stl_facade_auto_detects_and_probes() {
    let _guard = LocaleGuard::force_c();
    let mesh = RecordingMesh(vec![Triangle::new(
        Coord::new(0.0, 0.0, 1.0),
        Coord::new(0.0, 0.0, 0.0),
        Coord::new(1.0, 0.0, 0.0),
        Coord::new(0.0, 1.0, 0.0),
        0,
    )]);

    let mut stream = MemReadWrite::new();
    let mut mb = Memblock::from_vec(vec![0u8; 4096]);
    let mut write_opts = Options::default();
    write_opts.solid_name = "part".to_string();
    write_opts.format = stl_zip_codec::stl::FormatChoice::Ascii;
    stl::stla_write(
        &mut stream,
        &mesh,
        &write_opts.solid_name,
        write_opts.float_format,
        write_opts.float_precision,
        mb.len(),
        None,
    )
    .unwrap();

    let bytes = stream.into_inner();
    let mut reader = MemReader::new(&bytes);
    assert_eq!(stl::detect_format(&mut reader).unwrap(), Format::Ascii);

    let info = stl::probe(&mut reader).unwrap();
    assert_eq!(info.solid_name.as_deref(), Some("part"));
    assert_eq!(reader.tell().unwrap(), 0);
}
