//! STL ASCII reader: a hand-written state-machine parser over the token
//! cursor, with multi-solid support (§4.8).
//!
//! ```text
//! S0 expect "solid"               -> S1
//! S1 optional name to EOL         -> S2
//! S2 expect "facet"|"endsolid"    -> S3 or accept-solid
//! S3 expect "normal" F F F        -> S4
//! S4 expect "outer" "loop"        -> S5
//! S5 expect "vertex" F F F  x3    -> S6
//! S6 expect "endloop" "endfacet"  -> S2
//! ```

use crate::error::{Error, ErrorKind};
use crate::locale;
use crate::stl::types::{Coord, MeshCreator, Triangle};
use crate::stream::Stream;
use crate::stringstream::{Stringstream, WordBuffer};

const WORD_CAPACITY: usize = 256;

fn keyword_error(ss: &Stringstream<'_>) -> Error {
    Error::at_line(ErrorKind::StlAsciiInvalidKeyword, ss.line())
}

fn parse_error(ss: &Stringstream<'_>) -> Error {
    Error::at_line(ErrorKind::StlAsciiParseError, ss.line())
}

fn eat_word<'a>(ss: &mut Stringstream<'_>, buf: &'a mut [u8; WORD_CAPACITY]) -> Result<WordBuffer<'a>, Error> {
    let mut word = WordBuffer::new(buf);
    ss.eat_word(&mut word)?;
    Ok(word)
}

fn expect_keyword(ss: &mut Stringstream<'_>, expected: &str) -> Result<(), Error> {
    let mut buf = [0u8; WORD_CAPACITY];
    let word = eat_word(ss, &mut buf)?;
    if word.as_bytes().eq_ignore_ascii_case(expected.as_bytes()) {
        Ok(())
    } else {
        Err(keyword_error(ss))
    }
}

/// Reads the rest of the current line (from the current position up to and
/// including the next `\n`, or end-of-stream), trimmed of surrounding ASCII
/// whitespace. Resolves the "ASCII solid name" open question: rest of line,
/// trimmed.
fn read_line_trimmed(ss: &mut Stringstream<'_>) -> String {
    let mut raw = Vec::new();
    while let Some(b) = ss.current_char() {
        if b == b'\n' {
            ss.next_char();
            break;
        }
        raw.push(b);
        ss.next_char();
    }
    let text = String::from_utf8_lossy(&raw);
    crate::strutil::trim_trailing_ascii_whitespace(text.trim_start_matches([' ', '\t', '\r']))
        .to_string()
}

fn parse_coord(ss: &mut Stringstream<'_>) -> Result<Coord, Error> {
    let x = parse_float(ss)?;
    let y = parse_float(ss)?;
    let z = parse_float(ss)?;
    Ok(Coord::new(x, y, z))
}

fn parse_float(ss: &mut Stringstream<'_>) -> Result<f32, Error> {
    ss.skip_ascii_spaces();
    ss.fast_atof().ok_or_else(|| parse_error(ss))
}

fn parse_facet(ss: &mut Stringstream<'_>) -> Result<Triangle, Error> {
    expect_keyword(ss, "normal")?;
    let normal = parse_coord(ss)?;
    expect_keyword(ss, "outer")?;
    expect_keyword(ss, "loop")?;
    expect_keyword(ss, "vertex")?;
    let v1 = parse_coord(ss)?;
    expect_keyword(ss, "vertex")?;
    let v2 = parse_coord(ss)?;
    expect_keyword(ss, "vertex")?;
    let v3 = parse_coord(ss)?;
    expect_keyword(ss, "endloop")?;
    expect_keyword(ss, "endfacet")?;
    Ok(Triangle::new(normal, v1, v2, v3, 0))
}

/// Reads an STL ASCII file from `stream` into `creator`, with `stream_size_hint`
/// passed through to `ascii_begin_solid` for allocation hints.
///
/// `progress`, if given, is called as `(triangles_done, 0)` after every
/// parsed triangle (total is always `0`: the ASCII grammar never declares a
/// triangle count up front); returning `false` aborts with
/// [`ErrorKind::TaskStopped`].
pub fn stla_read(
    stream: &mut dyn Stream,
    creator: &mut dyn MeshCreator,
    buffer_capacity: usize,
    mut progress: Option<&mut dyn FnMut(u64, u64) -> bool>,
) -> Result<(), Error> {
    locale::check_lc_numeric()?;

    let size_hint = stream.size().unwrap_or(0);
    let mut ss = Stringstream::new(stream, buffer_capacity.max(64));

    expect_keyword(&mut ss, "solid")?;
    let mut name = read_line_trimmed(&mut ss);
    log::debug!("stla_read: begin solid {name:?}");
    creator.ascii_begin_solid(size_hint, &name);

    let mut tri_id = 0u32;

    loop {
        let mut buf = [0u8; WORD_CAPACITY];
        let word = eat_word(&mut ss, &mut buf)?;
        if word.as_bytes().eq_ignore_ascii_case(b"facet") {
            let triangle = parse_facet(&mut ss)?;
            creator.add_triangle(tri_id, &triangle);
            tri_id += 1;
            if let Some(progress) = progress.as_mut() {
                if !progress(u64::from(tri_id), 0) {
                    return Err(Error::at_line(ErrorKind::TaskStopped, ss.line()));
                }
            }
        } else if word.as_bytes().eq_ignore_ascii_case(b"endsolid") {
            let _trailing_name = read_line_trimmed(&mut ss);
            log::debug!("stla_read: end solid after {tri_id} triangles");
            creator.end_solid();

            let mut peek_buf = [0u8; WORD_CAPACITY];
            let save_pos_word = eat_word(&mut ss, &mut peek_buf)?;
            if save_pos_word.as_bytes().eq_ignore_ascii_case(b"solid") {
                name = read_line_trimmed(&mut ss);
                log::debug!("stla_read: begin solid {name:?}");
                creator.ascii_begin_solid(size_hint, &name);
                tri_id = 0;
            } else {
                break;
            }
        } else {
            return Err(keyword_error(&ss));
        }
    }

    Ok(())
}

/// Reads just the `solid <name>` preamble, for non-mutating format probing.
/// Callers are responsible for restoring the stream position afterwards
/// (the [`Stringstream`] buffers ahead of the logical read position).
pub(crate) fn peek_solid_name(stream: &mut dyn Stream, buffer_capacity: usize) -> Result<String, Error> {
    let mut ss = Stringstream::new(stream, buffer_capacity.max(64));
    expect_keyword(&mut ss, "solid")?;
    Ok(read_line_trimmed(&mut ss))
}
