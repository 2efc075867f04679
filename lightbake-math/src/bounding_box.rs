use std::ops::{Add, AddAssign};

use glam::{vec3, Affine3A, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().collect()
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn extent(&self) -> Vec3 {
        self.max() - self.min()
    }

    /// Half of the surface area; used as the SAH cost metric.
    pub fn half_area(&self) -> f32 {
        if !self.is_set() {
            return f32::MAX;
        }

        let extent = self.extent();

        extent.x * extent.y + extent.y * extent.z + extent.z * extent.x
    }

    pub fn is_set(&self) -> bool {
        self.min.x != Self::default().min.x
    }

    pub fn with_transform(&self, transform: Affine3A) -> Self {
        if !self.is_set() {
            return *self;
        }

        (0..8)
            .map(|i| {
                let point = vec3(
                    if i & 1 > 0 { self.max.x } else { self.min.x },
                    if i & 2 > 0 { self.max.y } else { self.min.y },
                    if i & 4 > 0 { self.max.z } else { self.min.z },
                );

                transform.transform_point3(point)
            })
            .collect()
    }

    /// Checks whether a sphere touches this box (Arvo's algorithm).
    ///
    /// An unset box never intersects anything.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        if !self.is_set() {
            return false;
        }

        let closest = center.clamp(self.min, self.max);

        (center - closest).length_squared() <= radius * radius
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(Vec3::MAX, Vec3::MIN)
    }
}

impl Add<Vec3> for BoundingBox {
    type Output = Self;

    fn add(mut self, rhs: Vec3) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign<Vec3> for BoundingBox {
    fn add_assign(&mut self, rhs: Vec3) {
        self.min = self.min.min(rhs);
        self.max = self.max.max(rhs);
    }
}

impl Add<Self> for BoundingBox {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign<Self> for BoundingBox {
    fn add_assign(&mut self, rhs: Self) {
        if rhs.is_set() {
            *self += rhs.min;
            *self += rhs.max;
        }
    }
}

impl FromIterator<Vec3> for BoundingBox {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Vec3>,
    {
        let mut this = Self::default();

        for item in iter {
            this += item;
        }

        this
    }
}
