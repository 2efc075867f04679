use glam::{Vec2, Vec3};

use crate::BARYCENTRIC_EPSILON;

/// Solves the barycentric weights of `p` against the 2D triangle
/// `(p1, p2, p3)` using the closed-form 2x2 determinant.
///
/// Returns `None` for degenerate (zero-area) triangles. The weights are not
/// clamped: a negative component means `p` lies outside of the triangle.
pub fn barycentric(p1: Vec2, p2: Vec2, p3: Vec2, p: Vec2) -> Option<Vec3> {
    let denom = -p1.x * p3.y - p2.x * p1.y + p2.x * p3.y + p1.y * p3.x
        + p2.y * p1.x
        - p2.y * p3.x;

    if denom.abs() < BARYCENTRIC_EPSILON {
        return None;
    }

    let x = (p2.x * p3.y - p2.y * p3.x - p.x * p3.y + p3.x * p.y - p2.x * p.y
        + p2.y * p.x)
        / denom;

    let y = -(-p1.x * p.y + p1.x * p3.y + p1.y * p.x - p.x * p3.y
        + p3.x * p.y
        - p1.y * p3.x)
        / denom;

    Some(Vec3::new(x, y, 1.0 - x - y))
}

/// Returns whether all of the weights are non-negative.
pub fn is_inside(weights: Vec3) -> bool {
    weights.x >= 0.0 && weights.y >= 0.0 && weights.z >= 0.0
}

/// Interpolates three per-vertex attributes with given weights.
pub fn interpolate<T>(weights: Vec3, [a, b, c]: [T; 3]) -> T
where
    T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
{
    a * weights.x + b * weights.y + c * weights.z
}

/// Maps a world-space point lying in the plane of triangle `(p1, p2, p3)`
/// into the UV space spanned by `(t1, t2, t3)`.
///
/// Weights are area ratios of the three sub-triangles around `p`, so they
/// are always positive; points outside of the triangle therefore fold back
/// into it instead of extrapolating.
pub fn world_to_uv(
    [p1, p2, p3]: [Vec3; 3],
    p: Vec3,
    [t1, t2, t3]: [Vec2; 3],
) -> Vec2 {
    let f1 = p1 - p;
    let f2 = p2 - p;
    let f3 = p3 - p;

    let area = (p1 - p2).cross(p1 - p3).length();

    if area < BARYCENTRIC_EPSILON {
        return t1;
    }

    let a1 = f2.cross(f3).length() / area;
    let a2 = f3.cross(f1).length() / area;
    let a3 = f1.cross(f2).length() / area;

    t1 * a1 + t2 * a2 + t3 * a3
}
