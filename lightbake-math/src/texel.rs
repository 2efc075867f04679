use glam::{vec2, Vec2};

/// Converts a texture coordinate into an integer texel index, clamped into
/// `0..size`.
pub fn texel_coordinate(coord: f32, size: u32) -> i32 {
    let size = size as i32;

    // `as` saturates on overflow and maps NaN to zero
    let texel = (coord * size as f32) as i32;

    texel.clamp(0, (size - 1).max(0))
}

/// Returns the texture coordinate of given texel's center.
pub fn texel_center(texel: i32, size: u32) -> f32 {
    (texel as f32 + 0.5) / (size as f32)
}

/// Converts a secondary (light-map) UV into the texel convention used by the
/// light-map buffers: rotated by 90 degrees around `(0.5, 0.5)` and flipped
/// vertically.
///
/// Both steps combined boil down to swapping the axes, which is done directly
/// so that UVs on texel centers stay exact.
pub fn lightmap_uv(uv: Vec2) -> Vec2 {
    vec2(uv.y, uv.x)
}
