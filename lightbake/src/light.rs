use glam::Vec3;
use lightbake_math::BoundingBox;

#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadows: bool,
    pub enabled: bool,
    pub mode: LightMode,
    pub kind: LightKind,
}

impl Light {
    pub fn new(kind: LightKind) -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            cast_shadows: true,
            enabled: true,
            mode: LightMode::Baked,
            kind,
        }
    }

    /// Creates a sun-like light shining along `direction`.
    pub fn directional(direction: Vec3) -> Self {
        Self::new(LightKind::Directional { direction })
    }

    pub fn point(position: Vec3, radius: f32) -> Self {
        Self::new(LightKind::Point { position, radius })
    }

    /// Creates a spot light; cone angles are given in degrees.
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        radius: f32,
        inner_angle: f32,
        outer_angle: f32,
    ) -> Self {
        Self::new(LightKind::Spot {
            position,
            direction,
            radius,
            inner_angle,
            outer_angle,
        })
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_cast_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_mode(mut self, mode: LightMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns whether this light contributes anything to a surface with
    /// given world bounds.
    ///
    /// Disabled and realtime-only lights never do; point and spot lights
    /// additionally have to reach the bounds with their radius.
    pub fn affects(&self, bounds: &BoundingBox) -> bool {
        if !self.enabled || self.mode == LightMode::Realtime {
            return false;
        }

        match self.kind {
            LightKind::Directional { .. } => true,

            LightKind::Point { position, radius }
            | LightKind::Spot {
                position, radius, ..
            } => bounds.intersects_sphere(position, radius),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LightMode {
    Realtime,
    Mixed,
    #[default]
    Baked,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Directional {
        direction: Vec3,
    },

    Point {
        position: Vec3,
        radius: f32,
    },

    Spot {
        position: Vec3,
        direction: Vec3,
        radius: f32,
        inner_angle: f32,
        outer_angle: f32,
    },
}
