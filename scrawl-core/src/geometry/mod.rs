//! # Geometry
//!
//! The stroke pipeline: raw `(x, y, pressure)` samples become a smoothed outline polygon
//! ([`outline`]), which in turn becomes a closed, quadratic-smoothed fill path ([`path`]).
//! Everything here is a pure function of its inputs.

pub mod outline;
pub mod path;

pub use outline::{build_outline, OutlineOptions};
pub use path::outline_to_path;

/// Offset applied to a degenerate terminal sample so a click renders as a dot.
pub const DOT_EPSILON: f32 = 0.001;

/// A 2D position, logical pixels. For stroke points this is relative to the owning element's origin.
#[derive(Copy, Clone, PartialEq, Default, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
#[repr(C)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}
impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
    #[must_use]
    pub fn mul(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k)
    }
    #[must_use]
    pub fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
    /// Perpendicular, rotated a quarter turn.
    #[must_use]
    pub fn perpendicular(self) -> Self {
        Self::new(self.y, -self.x)
    }
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.sub(other).length()
    }
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        let d = self.sub(other);
        d.dot(d)
    }
    /// Unit vector in the same direction. The zero vector stays zero rather than NaN.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            self.mul(1.0 / len)
        }
    }
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self.add(other.sub(self).mul(t))
    }
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
    /// Rotate about `center` by `radians`.
    #[must_use]
    pub fn rotate_about(self, center: Self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        let p = self.sub(center);
        Self::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos).add(center)
    }
    /// Move `distance` along `direction`.
    #[must_use]
    pub fn project(self, direction: Self, distance: f32) -> Self {
        self.add(direction.mul(distance))
    }
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}
impl From<Point> for [f32; 2] {
    fn from(value: Point) -> Self {
        [value.x, value.y]
    }
}

#[cfg(test)]
mod test {
    use super::Point;

    #[test]
    fn rotate_quarter() {
        let p = Point::new(1.0, 0.0).rotate_about(Point::ZERO, std::f32::consts::FRAC_PI_2);
        assert!((p.x).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }
    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Point::ZERO.normalized(), Point::ZERO);
        let n = Point::new(3.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}
