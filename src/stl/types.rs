//! STL common types: coordinates, triangles, the binary header, and the
//! mesh/mesh-creator capability interfaces.

/// A 3D coordinate: three IEEE-754 binary32 floats, 12 bytes, no padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Coord {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    fn sub(self, other: Coord) -> Coord {
        Coord::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    fn cross(self, other: Coord) -> Coord {
        Coord::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

/// A triangle facet: normal + 3 vertices + a 16-bit attribute byte count.
/// Binary on-wire size is 50 bytes regardless of in-memory padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub normal: Coord,
    pub v1: Coord,
    pub v2: Coord,
    pub v3: Coord,
    pub attr_byte_count: u16,
}

impl Triangle {
    #[must_use]
    pub const fn new(normal: Coord, v1: Coord, v2: Coord, v3: Coord, attr_byte_count: u16) -> Self {
        Self {
            normal,
            v1,
            v2,
            v3,
            attr_byte_count,
        }
    }

    /// The on-wire size of one binary triangle record: 48 bytes of
    /// coordinates plus a 16-bit attribute byte count.
    pub const WIRE_SIZE: usize = 50;

    /// Computes the facet normal from the vertex winding order via a plain
    /// cross product; not normalized. This is the one geometric helper the
    /// codec provides beyond raw I/O — no other normal recomputation,
    /// topology, or tessellation is in scope.
    #[must_use]
    pub fn compute_normal(&self) -> Coord {
        self.v2.sub(self.v1).cross(self.v3.sub(self.v1))
    }
}

/// Exactly 80 bytes of opaque header data, not assumed to be nul-terminated
/// text.
#[derive(Clone, Copy, PartialEq)]
pub struct BinaryHeader(pub [u8; 80]);

impl BinaryHeader {
    #[must_use]
    pub const fn zeroed() -> Self {
        Self([0u8; 80])
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 80] {
        &self.0
    }
}

impl Default for BinaryHeader {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl core::fmt::Debug for BinaryHeader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "BinaryHeader(")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// Read-side producer: supplies triangles to the binary writer.
pub trait Mesh {
    fn triangle_count(&self) -> u32;
    fn get_triangle(&self, id: u32) -> Triangle;
}

/// Write-side consumer: receives triangles from the reader. Every method has
/// a no-op default body, expressing "any callback may be null" from the
/// C API this crate generalizes.
pub trait MeshCreator {
    fn ascii_begin_solid(&mut self, _stream_size_hint: u64, _name: &str) {}
    fn binary_begin_solid(&mut self, _triangle_count: u32, _header: &BinaryHeader) {}
    fn add_triangle(&mut self, _id: u32, _triangle: &Triangle) {}
    fn end_solid(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_normal_of_xy_plane_triangle_points_up() {
        let t = Triangle::new(
            Coord::zero(),
            Coord::new(0.0, 0.0, 0.0),
            Coord::new(1.0, 0.0, 0.0),
            Coord::new(0.0, 1.0, 0.0),
            0,
        );
        let n = t.compute_normal();
        assert_eq!(n, Coord::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn binary_header_debug_is_hex_not_text() {
        let h = BinaryHeader::zeroed();
        assert_eq!(format!("{h:?}"), format!("BinaryHeader({})", "00".repeat(80)));
    }
}
