use super::Vec3;

/// Unit quaternion `[x, y, z, w]` representing a rotation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle_rad` around a unit `axis`.
    pub fn from_axis_angle(axis: Vec3, angle_rad: f64) -> Self {
        let half = angle_rad * 0.5;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    pub fn from_rotation_y(angle_rad: f64) -> Self {
        Self::from_axis_angle(Vec3::Y, angle_rad)
    }

    /// Intrinsic X-then-Y-then-Z Euler rotation (matrix `Rx * Ry * Rz`).
    pub fn from_euler_xyz(x_rad: f64, y_rad: f64, z_rad: f64) -> Self {
        let (s1, c1) = (x_rad * 0.5).sin_cos();
        let (s2, c2) = (y_rad * 0.5).sin_cos();
        let (s3, c3) = (z_rad * 0.5).sin_cos();

        Self::new(
            s1 * c2 * c3 + c1 * s2 * s3,
            c1 * s2 * c3 - s1 * c2 * s3,
            c1 * c2 * s3 + s1 * s2 * c3,
            c1 * c2 * c3 - s1 * s2 * s3,
        )
    }

    /// Rotation whose local +Z axis points along `forward`.
    ///
    /// When `forward` is parallel to `up` the forward vector is nudged
    /// slightly so a basis can still be formed.
    pub fn look_along(forward: Vec3, up: Vec3) -> Self {
        let Some(mut z) = forward.try_normalize() else {
            return Self::IDENTITY;
        };

        let mut x = up.cross(z);
        if x.dot(x) < 1e-12 {
            if (up.z.abs() - 1.0).abs() < 1e-9 {
                z.x += 1e-4;
            } else {
                z.z += 1e-4;
            }
            z = z.normalize_or_zero();
            x = up.cross(z);
        }
        let x = x.normalize_or_zero();
        let y = z.cross(x);
        Self::from_basis(x, y, z)
    }

    /// Rotation from an orthonormal basis (the columns of a rotation matrix).
    pub fn from_basis(x: Vec3, y: Vec3, z: Vec3) -> Self {
        let (m00, m01, m02) = (x.x, y.x, z.x);
        let (m10, m11, m12) = (x.y, y.y, z.y);
        let (m20, m21, m22) = (x.z, y.z, z.z);

        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self::new((m21 - m12) * s, (m02 - m20) * s, (m10 - m01) * s, 0.25 / s)
        } else if m00 > m11 && m00 > m22 {
            let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }

    /// Quaternion product `self * other` (apply `other` first).
    pub fn mul(self, other: Quat) -> Quat {
        let (a, b) = (self, other);
        Quat::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }

    pub fn normalize(self) -> Quat {
        let n = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if n > 1e-10 {
            Quat::new(self.x / n, self.y / n, self.z / n, self.w / n)
        } else {
            Quat::IDENTITY
        }
    }

    /// Inverse for unit quaternions.
    pub fn conjugate(self) -> Quat {
        Quat::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let t = qv.cross(v).scale(2.0);
        v + t.scale(self.w) + qv.cross(t)
    }
}

#[cfg(test)]
mod tests {
    use super::Quat;
    use crate::math::Vec3;

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        let d = (a - b).length();
        assert!(d <= eps, "expected {a:?} ~= {b:?} (diff {d})");
    }

    #[test]
    fn identity_leaves_vectors_alone() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_vec_close(Quat::IDENTITY.rotate(v), v, 1e-12);
    }

    #[test]
    fn rotation_y_quarter_turn_maps_z_to_x() {
        let q = Quat::from_rotation_y(std::f64::consts::FRAC_PI_2);
        assert_vec_close(q.rotate(Vec3::Z), Vec3::new(1.0, 0.0, 0.0), 1e-12);
    }

    #[test]
    fn euler_xyz_applies_z_then_y_then_x() {
        let (x, y, z) = (0.3, -0.7, 1.1);
        let composed = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), x)
            .mul(Quat::from_axis_angle(Vec3::Y, y))
            .mul(Quat::from_axis_angle(Vec3::Z, z));
        let v = Vec3::new(0.2, 0.5, -0.9);
        assert_vec_close(Quat::from_euler_xyz(x, y, z).rotate(v), composed.rotate(v), 1e-12);
    }

    #[test]
    fn look_along_points_local_z_at_target() {
        let forward = Vec3::new(-3.0, 1.0, 2.0);
        let q = Quat::look_along(forward, Vec3::Y);
        let expected = forward.normalize_or_zero();
        assert_vec_close(q.rotate(Vec3::Z), expected, 1e-9);
    }

    #[test]
    fn look_along_handles_forward_parallel_to_up() {
        let q = Quat::look_along(Vec3::new(0.0, -1.0, 0.0), Vec3::Y);
        let z = q.rotate(Vec3::Z);
        assert!(z.y < -0.999);
        assert!(z.is_finite());
    }
}
