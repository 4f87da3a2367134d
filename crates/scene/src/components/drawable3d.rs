use foundation::math::Vec3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PointCloudId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape3D {
    /// UV sphere centered at the local origin.
    Sphere { radius: f64, segments: u32 },
    /// Box of `size`, centered at `offset` in local space.
    Box { size: Vec3, offset: Vec3 },
    /// Unlit points stored in the world's point-cloud table.
    Points { cloud: PointCloudId },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drawable3D {
    pub shape: Shape3D,
}

impl Drawable3D {
    pub fn sphere(radius: f64, segments: u32) -> Self {
        Self {
            shape: Shape3D::Sphere { radius, segments },
        }
    }

    pub fn cuboid(size: Vec3, offset: Vec3) -> Self {
        Self {
            shape: Shape3D::Box { size, offset },
        }
    }

    pub fn points(cloud: PointCloudId) -> Self {
        Self {
            shape: Shape3D::Points { cloud },
        }
    }
}
