use foundation::math::{Mat4, Vec2, Vec3};
use scene::picking::Ray;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y_rad: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera3D {
    pub fn look_at(position: Vec3, target: Vec3, fov_y_rad: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target,
            fov_y_rad,
            aspect: 1.0,
            near,
            far,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_z0(self.fov_y_rad, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection().mul(&self.view())
    }

    /// World-space ray from the eye through `ndc` (`[-1, 1]` on both axes, +Y up).
    pub fn ray_through_ndc(&self, ndc: Vec2) -> Ray {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);

        let tan_half = (0.5 * self.fov_y_rad).tan();
        let dir = forward
            + right.scale(ndc.x * tan_half * self.aspect)
            + up.scale(ndc.y * tan_half);
        Ray::new(self.position, dir.normalize_or_zero())
    }
}

/// Drawing-surface size plus the camera whose aspect follows it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub camera: Camera3D,
}

impl Viewport {
    pub fn new(width: u32, height: u32, camera: Camera3D) -> Self {
        let mut viewport = Self {
            width: width.max(1),
            height: height.max(1),
            camera,
        };
        viewport.camera.aspect = viewport.aspect();
        viewport
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Store a new surface size and refresh the camera aspect.
    ///
    /// Returns `false` (and changes nothing) when the size is unchanged or
    /// degenerate.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width == self.width && height == self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        self.camera.aspect = self.aspect();
        true
    }
}
