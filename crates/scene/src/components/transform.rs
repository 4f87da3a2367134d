use foundation::math::{Mat4, Quat, Vec3};

/// Local translation, rotation and scale, applied as `T * R * S`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_trs(self.position, self.rotation, self.scale)
    }

    /// Map a point from the parent space into this transform's local space.
    pub fn inverse_point(&self, p: Vec3) -> Vec3 {
        self.inverse_vector(p - self.position)
    }

    /// Map a direction from the parent space into local space (not normalized).
    pub fn inverse_vector(&self, v: Vec3) -> Vec3 {
        let r = self.rotation.conjugate().rotate(v);
        Vec3::new(
            safe_div(r.x, self.scale.x),
            safe_div(r.y, self.scale.y),
            safe_div(r.z, self.scale.z),
        )
    }
}

fn safe_div(v: f64, s: f64) -> f64 {
    if s.abs() < 1e-12 { 0.0 } else { v / s }
}
