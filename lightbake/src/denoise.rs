use std::f32::consts::PI;

use image::{Rgb, RgbImage};
use lightbake_math::{TexelBuffer, TexelColor};

/// Blur radius used by `post_process()`.
const BLUR_RADIUS: f32 = 2.0;

/// Texel resolution covered by a single blur pass.
const BLUR_PASS_SIZE: u32 = 64;

/// Gaussian-blurs the buffer in place.
///
/// Coordinates beyond the buffer's edges are clamped. Each result is
/// quantized to 8 bits and marked as resolved, so even a flat buffer only
/// keeps its values up to `1 / 255`.
pub fn blur(buffer: &mut TexelBuffer, radius: f32) {
    let size = buffer.size() as i32;

    if size == 0 || radius <= 0.0 {
        return;
    }

    let src: Vec<_> = buffer.iter().map(|&texel| texel * 255.0).collect();
    let reach = (radius * 2.57).ceil() as i32;
    let two_r2 = 2.0 * radius * radius;

    for i in 0..size {
        for j in 0..size {
            let mut sum = TexelColor::ZERO;
            let mut weights = 0.0;

            for ii in (i - reach)..=(i + reach) {
                for jj in (j - reach)..=(j + reach) {
                    let x = ii.clamp(0, size - 1);
                    let y = jj.clamp(0, size - 1);
                    let dsq = ((ii - i).pow(2) + (jj - j).pow(2)) as f32;
                    let weight = (-dsq / two_r2).exp() / (PI * two_r2);

                    sum += src[(x * size + y) as usize] * weight;
                    weights += weight;
                }
            }

            let avg = sum / weights;

            buffer[(i as u32, j as u32)] = TexelColor::new(
                avg.r.round() / 255.0,
                avg.g.round() / 255.0,
                avg.b.round() / 255.0,
                1.0,
            );
        }
    }
}

/// Smooths out the indirect buffer, keeping it confined to texels the direct
/// pass has resolved.
///
/// Buffers smaller than 64x64 are left as they are; bigger ones get one pass
/// per each 64 texels of resolution.
pub fn post_process(direct: &TexelBuffer, indirect: &mut TexelBuffer) {
    let passes = indirect.size() / BLUR_PASS_SIZE;

    for _ in 0..passes {
        blur(indirect, BLUR_RADIUS);

        for (texel, mask) in indirect.iter_mut().zip(direct.iter()) {
            *texel *= mask.a;
        }
    }
}

/// Blends direct and indirect lighting into the final light-map.
///
/// Texel `(i, j)` lands at pixel `(j, size - 1 - i)`, i.e. the image is stored
/// top-down while the buffers are bottom-up.
pub fn compose(direct: &TexelBuffer, indirect: &TexelBuffer) -> RgbImage {
    let size = direct.size();

    RgbImage::from_fn(size, size, |x, y| {
        let i = size - 1 - y;
        let j = x;
        let color = (direct[(i, j)] + indirect[(i, j)]).clamped();

        Rgb([
            (color.r * 255.0) as u8,
            (color.g * 255.0) as u8,
            (color.b * 255.0) as u8,
        ])
    })
}

/// Texel offsets to look at when searching for the nearest resolved
/// neighbour, closest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborSearchPattern {
    offsets: Vec<(i32, i32)>,
}

impl NeighborSearchPattern {
    pub fn new(radius: i32) -> Self {
        let mut offsets: Vec<_> = (-radius..=radius)
            .flat_map(|di| (-radius..=radius).map(move |dj| (di, dj)))
            .filter(|&offset| offset != (0, 0))
            .collect();

        offsets.sort_by_key(|(di, dj)| di * di + dj * dj);

        Self { offsets }
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.offsets.iter().copied()
    }
}

impl Default for NeighborSearchPattern {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Fills unresolved texels with their nearest resolved neighbour, so that
/// bilinear filtering doesn't pull black into the edges of UV islands.
///
/// Works in place: texels filled earlier can be picked up by later ones.
pub fn dilate(buffer: &mut TexelBuffer, pattern: &NeighborSearchPattern) {
    let size = buffer.size() as i32;

    for i in 0..size {
        for j in 0..size {
            if buffer[(i as u32, j as u32)].a != 0.0 {
                continue;
            }

            let neighbour = pattern.iter().find_map(|(di, dj)| {
                buffer
                    .get(i + di, j + dj)
                    .filter(|texel| texel.is_resolved())
                    .copied()
            });

            if let Some(neighbour) = neighbour {
                buffer[(i as u32, j as u32)] = neighbour.with_alpha(1.0);
            }
        }
    }
}
