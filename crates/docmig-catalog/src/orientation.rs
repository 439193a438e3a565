//! Orientation math for heading/pitch re-encoding
//!
//! Rotations arrive as `"x,y,z,w"` quaternion literals. They are converted to
//! heading (rotation about +Y) and pitch (rotation about the heading-local
//! X axis) of the forward axis `(0,0,1)`, and written back as `"h,p,0,0"`.

use std::fmt::{self, Display, Formatter};

/// Magnitude below which a rotation cannot be normalized
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// Four-component rotation, not necessarily normalized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// Vector part, X
    pub x: f64,
    /// Vector part, Y
    pub y: f64,
    /// Vector part, Z
    pub z: f64,
    /// Scalar part
    pub w: f64,
}

impl Quaternion {
    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create from components
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Euclidean length of the 4-vector
    #[inline]
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Unit quaternion, or `None` when the magnitude is below
    /// [`DEGENERATE_EPSILON`]
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let m = self.magnitude();
        if !m.is_finite() || m < DEGENERATE_EPSILON {
            return None;
        }
        Some(Self::new(self.x / m, self.y / m, self.z / m, self.w / m))
    }

    /// Rotate a vector by this (unit) quaternion
    #[must_use]
    pub fn rotate(&self, v: [f64; 3]) -> [f64; 3] {
        let u = [self.x, self.y, self.z];
        let uv = cross(u, v);
        let uuv = cross(u, uv);
        [
            v[0] + 2.0 * (self.w * uv[0] + uuv[0]),
            v[1] + 2.0 * (self.w * uv[1] + uuv[1]),
            v[2] + 2.0 * (self.w * uv[2] + uuv[2]),
        ]
    }

    /// Heading and pitch of the rotated forward axis
    ///
    /// Returns `None` for a degenerate rotation.
    #[must_use]
    pub fn heading_pitch(&self) -> Option<HeadingPitch> {
        let q = self.normalized()?;
        let f = q.rotate([0.0, 0.0, 1.0]);

        let heading = f[0].atan2(f[2]);
        let (sin_h, cos_h) = heading.sin_cos();
        // undo heading: rotate by -heading about Y
        let fy = f[1];
        let fz = f[0] * sin_h + f[2] * cos_h;
        let pitch = (-fy).atan2(fz);

        Some(HeadingPitch::new(heading, pitch))
    }
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Heading and pitch in radians, rounded to 4 decimal places
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadingPitch {
    heading: f64,
    pitch: f64,
}

impl HeadingPitch {
    /// Create from radians; both values are rounded
    #[must_use]
    pub fn new(heading: f64, pitch: f64) -> Self {
        Self {
            heading: round4(heading),
            pitch: round4(pitch),
        }
    }

    /// Heading in radians
    #[inline]
    #[must_use]
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Pitch in radians
    #[inline]
    #[must_use]
    pub fn pitch(&self) -> f64 {
        self.pitch
    }
}

impl Display for HeadingPitch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4},0,0", self.heading, self.pitch)
    }
}

fn round4(v: f64) -> f64 {
    let r = (v * 10_000.0).round() / 10_000.0;
    // no "-0.0000" in output
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Parse a `"x,y,z,w"` literal
///
/// # Errors
/// Returns a description of the problem if the literal does not hold
/// exactly four finite numbers
pub fn parse_quaternion(literal: &str) -> Result<Quaternion, String> {
    let parts: Vec<&str> = literal.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected 4 components, found {}", parts.len()));
    }
    let mut c = [0.0f64; 4];
    for (slot, part) in c.iter_mut().zip(&parts) {
        let v: f64 = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number"))?;
        if !v.is_finite() {
            return Err(format!("'{part}' is not finite"));
        }
        *slot = v;
    }
    Ok(Quaternion::new(c[0], c[1], c[2], c[3]))
}
