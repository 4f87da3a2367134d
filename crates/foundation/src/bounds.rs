use crate::math::Vec3;

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb3 { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Aabb3::new(center - half, center + half)
    }

    /// Slab test; returns the entry parameter `t` along `origin + t * dir`
    /// (clamped to `t_min` when the origin is inside the box).
    ///
    /// `dir` does not need to be normalized; `t` is in units of `dir`.
    pub fn ray_hit_t(&self, origin: Vec3, dir: Vec3, mut t_min: f64, mut t_max: f64) -> Option<f64> {
        let o = origin.as_array();
        let d = dir.as_array();
        let lo = self.min.as_array();
        let hi = self.max.as_array();

        for axis in 0..3 {
            if d[axis].abs() < 1e-12 {
                if o[axis] < lo[axis] || o[axis] > hi[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d[axis];
            let mut t1 = (lo[axis] - o[axis]) * inv;
            let mut t2 = (hi[axis] - o[axis]) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }

            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_max < t_min {
                return None;
            }
        }

        Some(t_min)
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb3;
    use crate::math::Vec3;

    fn unit_box() -> Aabb3 {
        Aabb3::from_center_half_extents(Vec3::new(5.0, 0.0, 0.0), Vec3::ONE)
    }

    #[test]
    fn ray_enters_box_at_near_face() {
        let t = unit_box()
            .ray_hit_t(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 0.0, f64::INFINITY)
            .expect("hit");
        assert!((t - 4.0).abs() < 1e-12);
    }

    #[test]
    fn ray_pointing_away_misses() {
        let hit = unit_box().ray_hit_t(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0), 0.0, f64::INFINITY);
        assert!(hit.is_none());
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let hit = unit_box().ray_hit_t(
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            0.0,
            f64::INFINITY,
        );
        assert!(hit.is_none());
    }
}
