//! STL ASCII writer: canonical one-facet-per-stanza output, lower-case
//! keywords (§4.9).

use crate::error::Error;
use crate::locale;
use crate::stl::types::Mesh;
use crate::stream::Stream;
use crate::stringstream::{FloatFormat, Ostringstream};

/// Default float format for ASCII STL output: scientific notation at
/// 9 significant digits, matching `%.9e` in the reference C writer.
pub const DEFAULT_FLOAT_FORMAT: FloatFormat = FloatFormat::Scientific;
pub const DEFAULT_FLOAT_PRECISION: u8 = 9;

fn write_float_triplet(
    out: &mut Ostringstream<'_>,
    x: f32,
    y: f32,
    z: f32,
    format: FloatFormat,
    precision: u8,
) -> Result<(), Error> {
    out.write_f32(x, format, precision)?;
    out.write_char(b' ')?;
    out.write_f32(y, format, precision)?;
    out.write_char(b' ')?;
    out.write_f32(z, format, precision)?;
    Ok(())
}

/// Writes `mesh` to `stream` as STL ASCII text, using `solid_name` verbatim
/// (empty string if the caller has none) and `float_format`/`float_precision`
/// for every coordinate.
///
/// `progress`, if given, is called as `(triangles_done, triangles_total)`
/// after every written triangle; returning `false` aborts the write with
/// [`crate::error::ErrorKind::TaskStopped`].
pub fn stla_write(
    stream: &mut dyn Stream,
    mesh: &dyn Mesh,
    solid_name: &str,
    float_format: FloatFormat,
    float_precision: u8,
    buffer_capacity: usize,
    mut progress: Option<&mut dyn FnMut(u64, u64) -> bool>,
) -> Result<(), Error> {
    locale::check_lc_numeric()?;

    let mut out = Ostringstream::new(stream, buffer_capacity.max(64));

    out.write_str(b"solid ")?;
    out.write_str(solid_name.as_bytes())?;
    out.write_char(b'\n')?;

    let tri_count = mesh.triangle_count();
    log::debug!("stla_write: tri_count={tri_count}");

    for tri_id in 0..tri_count {
        let t = mesh.get_triangle(tri_id);

        out.write_str(b"facet normal ")?;
        write_float_triplet(&mut out, t.normal.x, t.normal.y, t.normal.z, float_format, float_precision)?;
        out.write_char(b'\n')?;

        out.write_str(b" outer loop\n")?;
        for v in [t.v1, t.v2, t.v3] {
            out.write_str(b"  vertex ")?;
            write_float_triplet(&mut out, v.x, v.y, v.z, float_format, float_precision)?;
            out.write_char(b'\n')?;
        }
        out.write_str(b" endloop\n")?;
        out.write_str(b"endfacet\n")?;

        if let Some(progress) = progress.as_mut() {
            if !progress(u64::from(tri_id) + 1, u64::from(tri_count)) {
                return Err(Error::new(crate::error::ErrorKind::TaskStopped));
            }
        }
    }

    out.write_str(b"endsolid ")?;
    out.write_str(solid_name.as_bytes())?;
    out.write_char(b'\n')?;

    out.flush()
}
