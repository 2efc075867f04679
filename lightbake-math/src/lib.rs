//! Numeric building blocks shared by the baker: texel colors and buffers,
//! barycentric helpers and light-map UV conventions.

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]

mod barycentric;
mod bounding_box;
mod texel;
mod texel_buffer;
mod texel_color;
mod utils;

pub use self::barycentric::*;
pub use self::bounding_box::*;
pub use self::texel::*;
pub use self::texel_buffer::*;
pub use self::texel_color::*;
pub use self::utils::*;

/// Below this determinant magnitude a UV triangle is considered degenerate.
pub const BARYCENTRIC_EPSILON: f32 = 1e-6;
