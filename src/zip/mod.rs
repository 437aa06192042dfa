//! ZIP/Zip64 container codec: local/central file headers, end-of-central-
//! directory records (standard and Zip64), CRC32, and a minimal
//! central-directory-driven reader/writer (§4.11, §6).
//!
//! This crate never runs `deflate` itself (Non-goal, §1): the writer takes
//! already-encoded bytes from a caller-supplied source, and the reader hands
//! back whatever bytes are physically stored — decompression for
//! `CompressionMethod::Deflate` entries is the caller's job.

use crate::error::{Error, ErrorKind};
use crate::memblock::Memblock;
use crate::stream::Stream;
use bitflags::bitflags;
use crc::{Crc, CRC_32_ISO_HDLC};

const LFH_SIGNATURE: u32 = 0x0403_4b50;
const CDH_SIGNATURE: u32 = 0x0201_4b50;
const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const ZIP64_EOCD_SIGNATURE: u32 = 0x0606_4b50;
const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4b50;
const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;
const ZIP64_EXTRA_FIELD_ID: u16 = 0x0001;

const ZIP32_MAX: u64 = 0xFFFF_FFFF;
/// Version needed to extract, as a "zip specification version * 10" value.
const VERSION_STORE: u16 = 20;
const VERSION_ZIP64: u16 = 45;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Incremental CRC32 digest, mirroring the `crc` crate's
/// `digest()`/`update()`/`finalize()` idiom.
pub struct Crc32Digest(crc::Digest<'static, u32>);

impl Crc32Digest {
    #[must_use]
    pub fn new() -> Self {
        Self(CRC32.digest())
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    #[must_use]
    pub fn finalize(self) -> u32 {
        self.0.finalize()
    }
}

impl Default for Crc32Digest {
    fn default() -> Self {
        Self::new()
    }
}

bitflags! {
    /// ZIP general-purpose bit flags (only the bits this codec sets or
    /// inspects; unrecognized bits round-trip unchanged).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GeneralPurposeFlags: u16 {
        /// Bit 3: sizes and CRC-32 are deferred to a trailing data
        /// descriptor. Always set by [`zip_write_single_file`].
        const DATA_DESCRIPTOR = 1 << 3;
        /// Bit 11 (language encoding flag, "EFS"): file name and comment are
        /// UTF-8 rather than CP437.
        const UTF8_NAME = 1 << 11;
    }
}

/// The on-wire compression method identifier. This codec only ever writes
/// [`CompressionMethod::Store`] itself, but decodes whatever method byte a
/// read entry declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Store,
    Deflate,
    Other(u16),
}

impl CompressionMethod {
    fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::Store,
            8 => Self::Deflate,
            other => Self::Other(other),
        }
    }

    fn to_u16(self) -> u16 {
        match self {
            Self::Store => 0,
            Self::Deflate => 8,
            Self::Other(v) => v,
        }
    }
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

fn read_u16(stream: &mut dyn Stream) -> Result<u16, Error> {
    let mut b = [0u8; 2];
    read_exact(stream, &mut b)?;
    Ok(u16::from_le_bytes(b))
}

fn read_u32(stream: &mut dyn Stream) -> Result<u32, Error> {
    let mut b = [0u8; 4];
    read_exact(stream, &mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_u64(stream: &mut dyn Stream) -> Result<u64, Error> {
    let mut b = [0u8; 8];
    read_exact(stream, &mut b)?;
    Ok(u64::from_le_bytes(b))
}

fn read_vec(stream: &mut dyn Stream, len: usize) -> Result<Vec<u8>, Error> {
    let mut v = vec![0u8; len];
    read_exact(stream, &mut v)?;
    Ok(v)
}

/// Decodes bytes as CP437 (every byte maps to exactly one `char`), the legacy
/// ZIP filename encoding used whenever `GeneralPurposeFlags::UTF8_NAME` is
/// clear.
#[must_use]
pub fn decode_cp437(bytes: &[u8]) -> String {
    const HIGH: [char; 128] = [
        '\u{00C7}', '\u{00FC}', '\u{00E9}', '\u{00E2}', '\u{00E4}', '\u{00E0}', '\u{00E5}', '\u{00E7}',
        '\u{00EA}', '\u{00EB}', '\u{00E8}', '\u{00EF}', '\u{00EE}', '\u{00EC}', '\u{00C4}', '\u{00C5}',
        '\u{00C9}', '\u{00E6}', '\u{00C6}', '\u{00F4}', '\u{00F6}', '\u{00F2}', '\u{00FB}', '\u{00F9}',
        '\u{00FF}', '\u{00D6}', '\u{00DC}', '\u{00A2}', '\u{00A3}', '\u{00A5}', '\u{20A7}', '\u{0192}',
        '\u{00E1}', '\u{00ED}', '\u{00F3}', '\u{00FA}', '\u{00F1}', '\u{00D1}', '\u{00AA}', '\u{00BA}',
        '\u{00BF}', '\u{2310}', '\u{00AC}', '\u{00BD}', '\u{00BC}', '\u{00A1}', '\u{00AB}', '\u{00BB}',
        '\u{2591}', '\u{2592}', '\u{2593}', '\u{2502}', '\u{2524}', '\u{2561}', '\u{2562}', '\u{2556}',
        '\u{2555}', '\u{2563}', '\u{2551}', '\u{2557}', '\u{255D}', '\u{255C}', '\u{255B}', '\u{2510}',
        '\u{2514}', '\u{2534}', '\u{252C}', '\u{251C}', '\u{2500}', '\u{253C}', '\u{255E}', '\u{255F}',
        '\u{255A}', '\u{2554}', '\u{2569}', '\u{2566}', '\u{2560}', '\u{2550}', '\u{256C}', '\u{2567}',
        '\u{2568}', '\u{2564}', '\u{2565}', '\u{2559}', '\u{2558}', '\u{2552}', '\u{2553}', '\u{256B}',
        '\u{256A}', '\u{2518}', '\u{250C}', '\u{2588}', '\u{2584}', '\u{258C}', '\u{2590}', '\u{2580}',
        '\u{03B1}', '\u{00DF}', '\u{0393}', '\u{03C0}', '\u{03A3}', '\u{03C3}', '\u{00B5}', '\u{03C4}',
        '\u{03A6}', '\u{0398}', '\u{03A9}', '\u{03B4}', '\u{221E}', '\u{03C6}', '\u{03B5}', '\u{2229}',
        '\u{2261}', '\u{00B1}', '\u{2265}', '\u{2264}', '\u{2320}', '\u{2321}', '\u{00F7}', '\u{2248}',
        '\u{00B0}', '\u{2219}', '\u{00B7}', '\u{221A}', '\u{207F}', '\u{00B2}', '\u{25A0}', '\u{00A0}',
    ];
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b < 0x80 {
            out.push(b as char);
        } else {
            out.push(HIGH[(b - 0x80) as usize]);
        }
    }
    out
}

fn decode_name(bytes: &[u8], flags: GeneralPurposeFlags) -> String {
    if flags.contains(GeneralPurposeFlags::UTF8_NAME) {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        decode_cp437(bytes)
    }
}

/// The Zip64 extra field (id `0x0001`): 8-byte replacements for whichever
/// 32-bit size/offset fields in the enclosing header were set to
/// `0xFFFF_FFFF` to signal "see Zip64 extra field".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64ExtraField {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub local_header_offset: Option<u64>,
    pub disk_number_start: Option<u32>,
}

impl Zip64ExtraField {
    fn encode(self) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(v) = self.uncompressed_size {
            body.extend_from_slice(&v.to_le_bytes());
        }
        if let Some(v) = self.compressed_size {
            body.extend_from_slice(&v.to_le_bytes());
        }
        if let Some(v) = self.local_header_offset {
            body.extend_from_slice(&v.to_le_bytes());
        }
        if let Some(v) = self.disk_number_start {
            body.extend_from_slice(&v.to_le_bytes());
        }
        let mut out = Vec::with_capacity(4 + body.len());
        out.extend_from_slice(&ZIP64_EXTRA_FIELD_ID.to_le_bytes());
        out.extend_from_slice(&(body.len() as u16).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    /// Decodes the Zip64 extra field, given which of its members are
    /// present (only fields whose fixed-size counterpart read as
    /// `0xFFFF_FFFF` participate, in a fixed order: size, then compressed
    /// size, then local header offset, then disk number, per APPNOTE 4.5.3).
    fn decode(
        data: &[u8],
        need_uncompressed: bool,
        need_compressed: bool,
        need_offset: bool,
        need_disk: bool,
    ) -> Option<Self> {
        let mut pos = 0;
        let mut take_u64 = |want: bool| -> Option<u64> {
            if !want {
                return None;
            }
            let v = u64::from_le_bytes(data.get(pos..pos + 8)?.try_into().ok()?);
            pos += 8;
            Some(v)
        };
        let uncompressed_size = take_u64(need_uncompressed);
        let compressed_size = take_u64(need_compressed);
        let local_header_offset = take_u64(need_offset);
        let disk_number_start = if need_disk {
            let v = u32::from_le_bytes(data.get(pos..pos + 4)?.try_into().ok()?);
            pos += 4;
            Some(v)
        } else {
            None
        };
        let _ = pos;
        Some(Self {
            uncompressed_size,
            compressed_size,
            local_header_offset,
            disk_number_start,
        })
    }
}

/// Parsed fields common to both the local and central file headers.
#[derive(Debug, Clone)]
struct FileRecordCommon {
    version_needed: u16,
    flags: GeneralPurposeFlags,
    method: CompressionMethod,
    mod_time: u16,
    mod_date: u16,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    name: String,
}

/// A single decoded ZIP entry, as returned by [`zip_read_entry`].
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub method: CompressionMethod,
    pub crc32: u32,
    pub uncompressed_size: u64,
    /// The physically stored bytes: still compressed if `method` isn't
    /// `Store`. This codec never runs `deflate`.
    pub data: Vec<u8>,
}

/// Writes a single-file ZIP archive to `stream`: local file header (general
/// purpose flag bit 3 set — sizes/CRC deferred to the data descriptor),
/// entry bytes pulled through `memblock` from `data_source` until it returns
/// `0`, a trailing data descriptor, one central directory header, and an
/// end-of-central-directory record.
///
/// Zip64 records/sentinels are emitted whenever any size or offset would
/// overflow 32 bits, or when `force_zip64` is set (mirrors the entry data
/// model's caller-chosen `feature_version`, §3/§8 scenario 6 — a caller may
/// want Zip64 framing even for a small payload).
///
/// `data_source` must yield bytes already encoded per `method` — this
/// function never compresses; `method = Store` for raw passthrough.
pub fn zip_write_single_file(
    stream: &mut dyn Stream,
    file_name: &str,
    method: CompressionMethod,
    memblock: &mut Memblock,
    force_zip64: bool,
    mut data_source: impl FnMut(&mut [u8]) -> Result<usize, Error>,
) -> Result<(), Error> {
    if !memblock.is_valid() {
        return Err(Error::new(ErrorKind::InvalidMemblockSize));
    }

    let local_header_offset = stream.tell()?;
    let name_bytes = file_name.as_bytes();
    let flags = GeneralPurposeFlags::DATA_DESCRIPTOR | GeneralPurposeFlags::UTF8_NAME;

    let mut lfh = Vec::with_capacity(30 + name_bytes.len());
    lfh.extend_from_slice(&LFH_SIGNATURE.to_le_bytes());
    lfh.extend_from_slice(&(if force_zip64 { VERSION_ZIP64 } else { VERSION_STORE }).to_le_bytes());
    lfh.extend_from_slice(&flags.bits().to_le_bytes());
    lfh.extend_from_slice(&method.to_u16().to_le_bytes());
    lfh.extend_from_slice(&0u16.to_le_bytes()); // mod_time
    lfh.extend_from_slice(&0u16.to_le_bytes()); // mod_date
    lfh.extend_from_slice(&0u32.to_le_bytes()); // crc32 placeholder
    lfh.extend_from_slice(&0u32.to_le_bytes()); // compressed_size placeholder
    lfh.extend_from_slice(&0u32.to_le_bytes()); // uncompressed_size placeholder
    lfh.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
    lfh.extend_from_slice(&0u16.to_le_bytes()); // extra_len
    lfh.extend_from_slice(name_bytes);
    write_all(stream, &lfh)?;

    log::debug!("zip_write_single_file: entry {file_name:?} at offset {local_header_offset}");

    let mut digest = Crc32Digest::new();
    let mut compressed_size: u64 = 0;
    let scratch = memblock.as_mut_slice();
    loop {
        let n = data_source(scratch)?;
        if n == 0 {
            break;
        }
        digest.update(&scratch[..n]);
        write_all(stream, &scratch[..n])?;
        compressed_size += n as u64;
    }
    let crc32 = digest.finalize();
    // method = Store implies uncompressed_size == compressed_size, since the
    // writer never compresses on the caller's behalf.
    let uncompressed_size = compressed_size;

    let zip64_sizes = force_zip64 || compressed_size > ZIP32_MAX || uncompressed_size > ZIP32_MAX;

    let mut dd = Vec::new();
    dd.extend_from_slice(&DATA_DESCRIPTOR_SIGNATURE.to_le_bytes());
    dd.extend_from_slice(&crc32.to_le_bytes());
    if zip64_sizes {
        dd.extend_from_slice(&compressed_size.to_le_bytes());
        dd.extend_from_slice(&uncompressed_size.to_le_bytes());
    } else {
        dd.extend_from_slice(&(compressed_size as u32).to_le_bytes());
        dd.extend_from_slice(&(uncompressed_size as u32).to_le_bytes());
    }
    write_all(stream, &dd)?;

    let cdh_offset = stream.tell()?;
    let zip64_offset = force_zip64 || local_header_offset > ZIP32_MAX;
    let needs_zip64 = zip64_sizes || zip64_offset;

    let extra = if needs_zip64 {
        Zip64ExtraField {
            uncompressed_size: zip64_sizes.then_some(uncompressed_size),
            compressed_size: zip64_sizes.then_some(compressed_size),
            local_header_offset: zip64_offset.then_some(local_header_offset),
            disk_number_start: None,
        }
        .encode()
    } else {
        Vec::new()
    };

    let mut cdh = Vec::with_capacity(46 + name_bytes.len() + extra.len());
    cdh.extend_from_slice(&CDH_SIGNATURE.to_le_bytes());
    cdh.extend_from_slice(&VERSION_STORE.to_le_bytes()); // version_made_by
    cdh.extend_from_slice(&(if needs_zip64 { VERSION_ZIP64 } else { VERSION_STORE }).to_le_bytes());
    cdh.extend_from_slice(&flags.bits().to_le_bytes());
    cdh.extend_from_slice(&method.to_u16().to_le_bytes());
    cdh.extend_from_slice(&0u16.to_le_bytes()); // mod_time
    cdh.extend_from_slice(&0u16.to_le_bytes()); // mod_date
    cdh.extend_from_slice(&crc32.to_le_bytes());
    cdh.extend_from_slice(&(if zip64_sizes { u32::MAX } else { compressed_size as u32 }).to_le_bytes());
    cdh.extend_from_slice(&(if zip64_sizes { u32::MAX } else { uncompressed_size as u32 }).to_le_bytes());
    cdh.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
    cdh.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    cdh.extend_from_slice(&0u16.to_le_bytes()); // comment_len
    cdh.extend_from_slice(&0u16.to_le_bytes()); // disk_number_start
    cdh.extend_from_slice(&0u16.to_le_bytes()); // internal_attrs
    cdh.extend_from_slice(&0u32.to_le_bytes()); // external_attrs
    cdh.extend_from_slice(&(if zip64_offset { u32::MAX } else { local_header_offset as u32 }).to_le_bytes());
    cdh.extend_from_slice(name_bytes);
    cdh.extend_from_slice(&extra);
    write_all(stream, &cdh)?;

    let cd_size = stream.tell()? - cdh_offset;
    let eocd_pos = stream.tell()?;

    let needs_zip64_eocd = force_zip64 || needs_zip64 || cd_size > ZIP32_MAX || cdh_offset > ZIP32_MAX;
    if needs_zip64_eocd {
        let mut rec = Vec::with_capacity(56);
        rec.extend_from_slice(&ZIP64_EOCD_SIGNATURE.to_le_bytes());
        rec.extend_from_slice(&44u64.to_le_bytes()); // size of remaining record
        rec.extend_from_slice(&VERSION_ZIP64.to_le_bytes()); // version_made_by
        rec.extend_from_slice(&VERSION_ZIP64.to_le_bytes()); // version_needed
        rec.extend_from_slice(&0u32.to_le_bytes()); // disk_number
        rec.extend_from_slice(&0u32.to_le_bytes()); // cd_start_disk
        rec.extend_from_slice(&1u64.to_le_bytes()); // entries_this_disk
        rec.extend_from_slice(&1u64.to_le_bytes()); // entries_total
        rec.extend_from_slice(&cd_size.to_le_bytes());
        rec.extend_from_slice(&cdh_offset.to_le_bytes());
        write_all(stream, &rec)?;

        let mut locator = Vec::with_capacity(20);
        locator.extend_from_slice(&ZIP64_LOCATOR_SIGNATURE.to_le_bytes());
        locator.extend_from_slice(&0u32.to_le_bytes()); // disk with zip64 eocd
        locator.extend_from_slice(&eocd_pos.to_le_bytes());
        locator.extend_from_slice(&1u32.to_le_bytes()); // total disks
        write_all(stream, &locator)?;
    }

    let mut eocd = Vec::with_capacity(22);
    eocd.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
    eocd.extend_from_slice(&0u16.to_le_bytes()); // disk_number
    eocd.extend_from_slice(&0u16.to_le_bytes()); // cd_start_disk
    // The Zip64 EOCD record carries the real 64-bit counts; the legacy EOCD
    // degrades to the 0xFFFF/0xFFFFFFFF sentinels once it's present.
    if needs_zip64_eocd {
        eocd.extend_from_slice(&0xFFFFu16.to_le_bytes());
        eocd.extend_from_slice(&0xFFFFu16.to_le_bytes());
        eocd.extend_from_slice(&u32::MAX.to_le_bytes());
        eocd.extend_from_slice(&u32::MAX.to_le_bytes());
    } else {
        eocd.extend_from_slice(&1u16.to_le_bytes()); // entries_this_disk
        eocd.extend_from_slice(&1u16.to_le_bytes()); // entries_total
        eocd.extend_from_slice(&(cd_size as u32).to_le_bytes());
        eocd.extend_from_slice(&(cdh_offset as u32).to_le_bytes());
    }
    eocd.extend_from_slice(&0u16.to_le_bytes()); // comment_len
    write_all(stream, &eocd)?;

    Ok(())
}

struct LocatedEocd {
    cd_offset: u64,
    cd_size: u64,
    entry_count: u64,
}

/// Scans backward from the end of `stream` for the EOCD signature (the
/// trailing comment can push it back by up to 64 KiB + 22 bytes), then
/// follows the Zip64 locator if present.
fn locate_eocd(stream: &mut dyn Stream) -> Result<LocatedEocd, Error> {
    let size = stream.size().ok_or_else(|| Error::new(ErrorKind::ZipBadSignature))?;
    if size < 22 {
        return Err(Error::new(ErrorKind::ZipBadSignature));
    }

    let search_window = 22u64 + 0xFFFF;
    let start = size.saturating_sub(search_window);
    let mut buf = read_region(stream, start, (size - start) as usize)?;

    let mut found = None;
    // Search backward for the 4-byte signature, byte by byte.
    let sig = EOCD_SIGNATURE.to_le_bytes();
    let mut i = buf.len().saturating_sub(4);
    loop {
        if buf[i..i + 4] == sig {
            found = Some(start + i as u64);
            break;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }
    let eocd_offset = found.ok_or_else(|| Error::new(ErrorKind::ZipBadSignature))?;

    stream.seek(eocd_offset)?;
    let _sig = read_u32(stream)?;
    let _disk_number = read_u16(stream)?;
    let _cd_start_disk = read_u16(stream)?;
    let _entries_this_disk = read_u16(stream)?;
    let entries_total = read_u16(stream)?;
    let cd_size32 = read_u32(stream)?;
    let cd_offset32 = read_u32(stream)?;
    buf.clear();

    // A Zip64 locator sits exactly 20 bytes before the EOCD when present.
    if eocd_offset >= 20 {
        stream.seek(eocd_offset - 20)?;
        if read_u32(stream)? == ZIP64_LOCATOR_SIGNATURE {
            let _disk_with_zip64_eocd = read_u32(stream)?;
            let zip64_eocd_offset = read_u64(stream)?;
            let _total_disks = read_u32(stream)?;

            stream.seek(zip64_eocd_offset)?;
            if read_u32(stream)? != ZIP64_EOCD_SIGNATURE {
                return Err(Error::new(ErrorKind::ZipBadSignature));
            }
            let _record_size = read_u64(stream)?;
            let _version_made_by = read_u16(stream)?;
            let _version_needed = read_u16(stream)?;
            let _disk_number = read_u32(stream)?;
            let _cd_start_disk = read_u32(stream)?;
            let _entries_this_disk = read_u64(stream)?;
            let entries_total = read_u64(stream)?;
            let cd_size = read_u64(stream)?;
            let cd_offset = read_u64(stream)?;
            return Ok(LocatedEocd {
                cd_offset,
                cd_size,
                entry_count: entries_total,
            });
        }
    }

    Ok(LocatedEocd {
        cd_offset: u64::from(cd_offset32),
        cd_size: u64::from(cd_size32),
        entry_count: u64::from(entries_total),
    })
}

fn read_region(stream: &mut dyn Stream, offset: u64, len: usize) -> Result<Vec<u8>, Error> {
    stream.seek(offset)?;
    read_vec(stream, len)
}

/// Returns the total number of entries in the ZIP archive at `stream`, per
/// its end-of-central-directory record (promoted to Zip64 automatically).
pub fn zip_read_file_count(stream: &mut dyn Stream) -> Result<u64, Error> {
    Ok(locate_eocd(stream)?.entry_count)
}

fn parse_central_header(stream: &mut dyn Stream) -> Result<(FileRecordCommon, u64), Error> {
    if read_u32(stream)? != CDH_SIGNATURE {
        return Err(Error::new(ErrorKind::ZipBadSignature));
    }
    let _version_made_by = read_u16(stream)?;
    let version_needed = read_u16(stream)?;
    let flags = GeneralPurposeFlags::from_bits_truncate(read_u16(stream)?);
    let method = CompressionMethod::from_u16(read_u16(stream)?);
    let mod_time = read_u16(stream)?;
    let mod_date = read_u16(stream)?;
    let crc32 = read_u32(stream)?;
    let compressed_size32 = read_u32(stream)?;
    let uncompressed_size32 = read_u32(stream)?;
    let name_len = read_u16(stream)? as usize;
    let extra_len = read_u16(stream)? as usize;
    let comment_len = read_u16(stream)? as usize;
    let _disk_number_start = read_u16(stream)?;
    let _internal_attrs = read_u16(stream)?;
    let _external_attrs = read_u32(stream)?;
    let local_header_offset32 = read_u32(stream)?;

    let name_bytes = read_vec(stream, name_len)?;
    let extra_bytes = read_vec(stream, extra_len)?;
    let _comment = read_vec(stream, comment_len)?;

    let needs_size = compressed_size32 == u32::MAX || uncompressed_size32 == u32::MAX;
    let needs_offset = local_header_offset32 == u32::MAX;
    let zip64 = parse_zip64_extra(
        &extra_bytes,
        uncompressed_size32 == u32::MAX,
        compressed_size32 == u32::MAX,
        needs_offset,
    )?;

    let uncompressed_size = zip64
        .as_ref()
        .and_then(|z| z.uncompressed_size)
        .unwrap_or(u64::from(uncompressed_size32));
    let compressed_size = zip64
        .as_ref()
        .and_then(|z| z.compressed_size)
        .unwrap_or(u64::from(compressed_size32));
    let local_header_offset = zip64
        .as_ref()
        .and_then(|z| z.local_header_offset)
        .unwrap_or(u64::from(local_header_offset32));

    if needs_size && zip64.is_none() {
        return Err(Error::new(ErrorKind::ZipInconsistentSize));
    }

    let name = decode_name(&name_bytes, flags);
    Ok((
        FileRecordCommon {
            version_needed,
            flags,
            method,
            mod_time,
            mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            name,
        },
        local_header_offset,
    ))
}

fn parse_zip64_extra(
    extra: &[u8],
    need_uncompressed: bool,
    need_compressed: bool,
    need_offset: bool,
) -> Result<Option<Zip64ExtraField>, Error> {
    let mut pos = 0;
    while pos + 4 <= extra.len() {
        let id = u16::from_le_bytes([extra[pos], extra[pos + 1]]);
        let size = u16::from_le_bytes([extra[pos + 2], extra[pos + 3]]) as usize;
        let body_start = pos + 4;
        let body_end = body_start + size;
        if body_end > extra.len() {
            return Err(Error::new(ErrorKind::ZipInconsistentSize));
        }
        if id == ZIP64_EXTRA_FIELD_ID {
            let field = Zip64ExtraField::decode(
                &extra[body_start..body_end],
                need_uncompressed,
                need_compressed,
                need_offset,
                false,
            )
            .ok_or_else(|| Error::new(ErrorKind::ZipInconsistentSize))?;
            return Ok(Some(field));
        }
        pos = body_end;
    }
    Ok(None)
}

/// Reads the `index`-th entry (0-based, in central-directory order) from
/// the ZIP archive at `stream`, cross-checking the local file header against
/// the central directory header, CRC32-verifying the stored bytes.
pub fn zip_read_entry(stream: &mut dyn Stream, index: u64) -> Result<ZipEntry, Error> {
    let located = locate_eocd(stream)?;
    if index >= located.entry_count {
        return Err(Error::new(ErrorKind::ZipInconsistentSize));
    }

    stream.seek(located.cd_offset)?;
    let mut common = None;
    let mut local_offset = 0u64;
    for i in 0..=index {
        let (c, off) = parse_central_header(stream)?;
        if i == index {
            common = Some(c);
            local_offset = off;
        }
    }
    let central = common.expect("loop ran at least once since index < entry_count");

    stream.seek(local_offset)?;
    if read_u32(stream)? != LFH_SIGNATURE {
        return Err(Error::new(ErrorKind::ZipBadSignature));
    }
    let _version_needed = read_u16(stream)?;
    let local_flags = GeneralPurposeFlags::from_bits_truncate(read_u16(stream)?);
    let _method = read_u16(stream)?;
    let _mod_time = read_u16(stream)?;
    let _mod_date = read_u16(stream)?;
    let _crc32 = read_u32(stream)?;
    let _compressed_size = read_u32(stream)?;
    let _uncompressed_size = read_u32(stream)?;
    let name_len = read_u16(stream)? as usize;
    let extra_len = read_u16(stream)? as usize;
    let _name = read_vec(stream, name_len)?;
    let _extra = read_vec(stream, extra_len)?;

    if local_flags.contains(GeneralPurposeFlags::DATA_DESCRIPTOR) {
        log::debug!("zip_read_entry: {:?} uses a deferred data descriptor", central.name);
    }

    let data = read_vec(stream, central.compressed_size as usize)
        .map_err(|_| Error::new(ErrorKind::ZipInconsistentSize))?;

    let mut digest = Crc32Digest::new();
    digest.update(&data);
    if digest.finalize() != central.crc32 {
        return Err(Error::new(ErrorKind::ZipInconsistentSize));
    }

    log::debug!(
        "zip_read_entry: {:?} method={:?} version_needed={} mod={:04x}:{:04x}",
        central.name, central.method, central.version_needed, central.mod_date, central.mod_time
    );

    Ok(ZipEntry {
        name: central.name,
        method: central.method,
        crc32: central.crc32,
        uncompressed_size: central.uncompressed_size,
        data,
    })
}
