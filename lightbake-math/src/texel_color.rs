use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign,
};

use glam::{Vec3, Vec4};

/// Color of a single light-map texel.
///
/// The alpha channel is not transparency: it marks whether the texel has been
/// shaded (`1.0`) or is still untouched (`0.0`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TexelColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl TexelColor {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// White with alpha zero; the neutral multiplier for light energy.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Builds a color from RGB, leaving the "written" marker unset.
    pub fn rgb(rgb: Vec3) -> Self {
        Self::new(rgb.x, rgb.y, rgb.z, 0.0)
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.a == 1.0
    }

    pub fn clamp(&mut self) {
        *self = self.clamped();
    }

    pub fn clamped(self) -> Self {
        Vec4::from(self).clamp(Vec4::ZERO, Vec4::ONE).into()
    }
}

impl From<Vec4> for TexelColor {
    fn from(value: Vec4) -> Self {
        Self::new(value.x, value.y, value.z, value.w)
    }
}

impl From<TexelColor> for Vec4 {
    fn from(value: TexelColor) -> Self {
        Vec4::new(value.r, value.g, value.b, value.a)
    }
}

impl Add for TexelColor {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        (Vec4::from(self) + Vec4::from(rhs)).into()
    }
}

impl AddAssign for TexelColor {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl AddAssign<f32> for TexelColor {
    fn add_assign(&mut self, rhs: f32) {
        *self = *self + Self::splat(rhs);
    }
}

impl Sub for TexelColor {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        (Vec4::from(self) - Vec4::from(rhs)).into()
    }
}

impl SubAssign for TexelColor {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul for TexelColor {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        (Vec4::from(self) * Vec4::from(rhs)).into()
    }
}

impl Mul<f32> for TexelColor {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        (Vec4::from(self) * rhs).into()
    }
}

impl MulAssign for TexelColor {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl MulAssign<f32> for TexelColor {
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl Div for TexelColor {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        (Vec4::from(self) / Vec4::from(rhs)).into()
    }
}

impl Div<f32> for TexelColor {
    type Output = Self;

    fn div(self, rhs: f32) -> Self::Output {
        (Vec4::from(self) / rhs).into()
    }
}

impl DivAssign for TexelColor {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl DivAssign<f32> for TexelColor {
    fn div_assign(&mut self, rhs: f32) {
        *self = *self / rhs;
    }
}
