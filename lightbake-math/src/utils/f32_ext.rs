pub trait F32Ext
where
    Self: Sized,
{
    fn sqr(self) -> Self;
    fn saturate(self) -> Self;

    /// Hermite interpolation between `edge0` and `edge1`; `edge0` may be
    /// larger than `edge1`, which yields a falling curve.
    fn smoothstep(self, edge0: Self, edge1: Self) -> Self;
}

impl F32Ext for f32 {
    fn sqr(self) -> Self {
        self * self
    }

    fn saturate(self) -> Self {
        self.clamp(0.0, 1.0)
    }

    fn smoothstep(self, edge0: Self, edge1: Self) -> Self {
        let t = ((self - edge0) / (edge1 - edge0)).saturate();

        t * t * (3.0 - 2.0 * t)
    }
}
