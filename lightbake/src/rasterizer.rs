use glam::{vec2, Vec3};
use lightbake_math::{
    barycentric, interpolate, is_inside, texel_center, texel_coordinate,
    TexelBuffer, TexelColor,
};

use crate::Vertex;

/// Visits every texel of `buffer` covered by the triangle's light-map UVs and
/// stores whatever `shade` returns for it.
///
/// `shade` gets called with the interpolated world-space position and normal
/// of the texel's center; its result is stored clamped and marked as
/// resolved. Resolved texels are never shaded again, so where triangles
/// overlap in UV space the first one wins.
///
/// Returns the number of texels shaded.
pub fn rasterize<F>(
    [v0, v1, v2]: &[Vertex; 3],
    buffer: &mut TexelBuffer,
    mut shade: F,
) -> usize
where
    F: FnMut(Vec3, Vec3) -> TexelColor,
{
    let size = buffer.size();

    if size == 0 {
        return 0;
    }

    // Degenerate triangles don't cover anything
    if barycentric(v0.uv1, v1.uv1, v2.uv1, v0.uv1).is_none() {
        return 0;
    }

    let uv_min = v0.uv1.min(v1.uv1).min(v2.uv1);
    let uv_max = v0.uv1.max(v1.uv1).max(v2.uv1);

    let min_i = texel_coordinate(uv_min.x, size);
    let min_j = texel_coordinate(uv_min.y, size);
    let max_i = texel_coordinate(uv_max.x, size);
    let max_j = texel_coordinate(uv_max.y, size);

    let mut shaded = 0;

    for i in min_i..=max_i {
        for j in min_j..=max_j {
            let uv = vec2(texel_center(i, size), texel_center(j, size));

            let Some(weights) = barycentric(v0.uv1, v1.uv1, v2.uv1, uv) else {
                continue;
            };

            if !is_inside(weights) {
                continue;
            }

            let texel = &mut buffer[(i as u32, j as u32)];

            if texel.is_resolved() {
                continue;
            }

            let position =
                interpolate(weights, [v0.position, v1.position, v2.position]);

            let normal = interpolate(weights, [v0.normal, v1.normal, v2.normal])
                .normalize_or_zero();

            *texel = shade(position, normal).with_alpha(1.0).clamped();
            shaded += 1;
        }
    }

    shaded
}
