//! STL facade: format detection, non-mutating probing, and the public
//! `stl_read`/`stl_write`/`stl_read_file`/`stl_write_file` entry points
//! (§4.10, §6).

use crate::endian::ByteOrder;
use crate::error::{Error, ErrorKind};
use crate::memblock::{self, Memblock};
use crate::stl::ascii_reader::{self, stla_read};
use crate::stl::ascii_writer::{self, stla_write};
use crate::stl::binary_reader::stlb_read;
use crate::stl::binary_writer::stlb_write;
use crate::stl::types::{BinaryHeader, Mesh, MeshCreator};
use crate::stream::{StdStream, Stream};
use crate::stringstream::FloatFormat;
use crate::strutil;
use std::fs::File;
use std::path::Path;

const PROBE_HEADER_SIZE: u64 = 84;
const PEEK_BUFFER_SIZE: usize = 256;
const DEFAULT_MEMBLOCK_SIZE: usize = 64 * 1024;

/// The STL variant of a stream's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ascii,
    Binary,
    /// Could not be determined (e.g. empty or non-sizable stream that
    /// doesn't start with the ASCII `"solid"` keyword).
    Unknown,
}

/// Which format `stl_read`/`stl_write` should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChoice {
    Auto,
    Ascii,
    Binary,
}

fn read_at(stream: &mut dyn Stream, offset: u64, buf: &mut [u8]) -> Result<usize, Error> {
    stream.seek(offset)?;
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Determines whether `stream` holds ASCII or binary STL data, without
/// consuming it (the stream position is restored before returning).
///
/// Leading ASCII whitespace is skipped before checking for the `"solid"`
/// keyword, so an ASCII file indented or preceded by blank lines is still
/// recognized (§4.10).
///
/// Disambiguates the case where a binary file's 80-byte header happens to
/// start with the ASCII `"solid"` keyword by cross-checking
/// `triangle_count * 50 + 84` against the stream's total size (§4.10).
pub fn detect_format(stream: &mut dyn Stream) -> Result<Format, Error> {
    let start = stream.tell()?;

    let mut peek = [0u8; PEEK_BUFFER_SIZE];
    let filled = read_at(stream, start, &mut peek)?;
    stream.seek(start)?;

    if filled == 0 {
        return Ok(Format::Unknown);
    }

    let trimmed_start = peek[..filled]
        .iter()
        .position(|&b| !strutil::is_ascii_space(b))
        .unwrap_or(filled);
    if !strutil::ascii_starts_with_ci(&peek[trimmed_start..filled], b"solid") {
        return Ok(Format::Binary);
    }

    if let Some(size) = stream.size() {
        if size >= PROBE_HEADER_SIZE {
            let mut count_bytes = [0u8; 4];
            let n = read_at(stream, 80, &mut count_bytes)?;
            stream.seek(start)?;
            if n == 4 {
                let tri_count = u32::from_le_bytes(count_bytes);
                let expected = u64::from(tri_count) * 50 + PROBE_HEADER_SIZE;
                if expected == size {
                    return Ok(Format::Binary);
                }
            }
        }
        Ok(Format::Ascii)
    } else {
        // Non-sizable stream starting with "solid" but we cannot
        // cross-check the triangle count against a total size.
        Ok(Format::Ascii)
    }
}

/// A read-only summary of an STL stream's contents, gathered without
/// mutating caller-visible state (the stream position is restored).
#[derive(Debug, Clone)]
pub struct ProbeInfo {
    pub format: Format,
    pub triangle_count: Option<u32>,
    pub header: Option<BinaryHeader>,
    pub solid_name: Option<String>,
}

/// Inspects `stream` and reports its format plus whatever metadata that
/// format exposes up front, without reading triangle data.
pub fn probe(stream: &mut dyn Stream) -> Result<ProbeInfo, Error> {
    let start = stream.tell()?;
    let format = detect_format(stream)?;

    let info = match format {
        Format::Binary => {
            let mut header_bytes = [0u8; 80];
            let mut count_bytes = [0u8; 4];
            let got_header = read_at(stream, start, &mut header_bytes)? == 80;
            let got_count = read_at(stream, start + 80, &mut count_bytes)? == 4;
            stream.seek(start)?;
            ProbeInfo {
                format,
                triangle_count: got_count.then(|| u32::from_le_bytes(count_bytes)),
                header: got_header.then(|| BinaryHeader(header_bytes)),
                solid_name: None,
            }
        }
        Format::Ascii => {
            let name = ascii_reader::peek_solid_name(stream, PEEK_BUFFER_SIZE).ok();
            stream.seek(start)?;
            ProbeInfo {
                format,
                triangle_count: None,
                header: None,
                solid_name: name,
            }
        }
        Format::Unknown => ProbeInfo {
            format,
            triangle_count: None,
            header: None,
            solid_name: None,
        },
    };

    Ok(info)
}

/// The whole configuration surface for [`stl_read`]/[`stl_write`] (there is
/// no config file or environment layer; this struct is it).
pub struct Options {
    pub format: FormatChoice,
    pub byte_order: ByteOrder,
    pub float_format: FloatFormat,
    pub float_precision: u8,
    pub solid_name: String,
    /// Called as `(done, total)` after every triangle; returning `false`
    /// aborts the call with [`ErrorKind::TaskStopped`]. `total` is `0` for
    /// ASCII reads, which never declare a count up front.
    pub task_progress: Option<Box<dyn FnMut(u64, u64) -> bool>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            format: FormatChoice::Auto,
            byte_order: ByteOrder::Little,
            float_format: ascii_writer::DEFAULT_FLOAT_FORMAT,
            float_precision: ascii_writer::DEFAULT_FLOAT_PRECISION,
            solid_name: String::new(),
            task_progress: None,
        }
    }
}

fn progress_fn(options: &mut Options) -> Option<&mut dyn FnMut(u64, u64) -> bool> {
    options.task_progress.as_deref_mut()
}

/// Reads an STL file (ASCII or binary, per `options.format`) from `stream`
/// into `creator`, using `memblock` as scratch for binary batches (ASCII
/// reads allocate their own line buffer regardless, since the grammar has no
/// fixed record size).
pub fn stl_read(
    stream: &mut dyn Stream,
    creator: &mut dyn MeshCreator,
    memblock: &mut Memblock,
    options: &mut Options,
) -> Result<(), Error> {
    let format = match options.format {
        FormatChoice::Ascii => Format::Ascii,
        FormatChoice::Binary => Format::Binary,
        FormatChoice::Auto => detect_format(stream)?,
    };

    match format {
        Format::Ascii => stla_read(stream, creator, memblock.len(), progress_fn(options)),
        Format::Binary => stlb_read(stream, creator, memblock, options.byte_order, progress_fn(options)),
        Format::Unknown => Err(Error::new(ErrorKind::StlUnknownFormat)),
    }
}

/// Writes `mesh` to `stream` as STL, in the format named by
/// `options.format` (`Auto` writes binary, matching the reference writer's
/// default).
pub fn stl_write(
    stream: &mut dyn Stream,
    mesh: &dyn Mesh,
    memblock: &mut Memblock,
    options: &mut Options,
) -> Result<(), Error> {
    let format = match options.format {
        FormatChoice::Ascii => Format::Ascii,
        FormatChoice::Binary | FormatChoice::Auto => Format::Binary,
    };

    match format {
        Format::Ascii => {
            let name = options.solid_name.clone();
            let float_format = options.float_format;
            let float_precision = options.float_precision;
            let capacity = memblock.len();
            stla_write(stream, mesh, &name, float_format, float_precision, capacity, progress_fn(options))
        }
        Format::Binary => stlb_write(stream, mesh, memblock, options.byte_order, None, progress_fn(options)),
        Format::Unknown => unreachable!("stl_write never resolves to Unknown"),
    }
}

fn default_memblock() -> Memblock {
    memblock::default_memblock(DEFAULT_MEMBLOCK_SIZE)
}

/// Opens `path` and reads it as STL into `creator`, using the process
/// default memblock factory.
pub fn stl_read_file(
    path: impl AsRef<Path>,
    creator: &mut dyn MeshCreator,
    options: &mut Options,
) -> Result<(), Error> {
    let file = File::open(path.as_ref())?;
    let mut stream = StdStream::new(file)?;
    let mut memblock = default_memblock();
    stl_read(&mut stream, creator, &mut memblock, options)
}

/// Creates (or truncates) `path` and writes `mesh` to it as STL, using the
/// process default memblock factory.
pub fn stl_write_file(
    path: impl AsRef<Path>,
    mesh: &dyn Mesh,
    options: &mut Options,
) -> Result<(), Error> {
    let file = File::create(path.as_ref())?;
    let mut stream = StdStream::new(file)?;
    let mut memblock = default_memblock();
    stl_write(&mut stream, mesh, &mut memblock, options)
}
