use super::Vec3;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat_deg: f64,
    pub lng_deg: f64,
}

impl LatLng {
    pub fn new(lat_deg: f64, lng_deg: f64) -> Self {
        Self { lat_deg, lng_deg }
    }

    /// Accepts only finite coordinates; anything else yields `None`.
    pub fn try_new(lat_deg: f64, lng_deg: f64) -> Option<Self> {
        (lat_deg.is_finite() && lng_deg.is_finite()).then(|| Self::new(lat_deg, lng_deg))
    }

    pub fn to_sphere(self, radius: f64) -> Vec3 {
        lat_lng_to_sphere(self.lat_deg, self.lng_deg, radius)
    }
}

/// Point on a sphere of `radius` centered at the origin.
///
/// Y is up, the prime meridian at the equator faces +Z and 90°E faces +X.
pub fn lat_lng_to_sphere(lat_deg: f64, lng_deg: f64, radius: f64) -> Vec3 {
    let lat = lat_deg.to_radians();
    let lng = lng_deg.to_radians();

    let cos_lat = lat.cos();
    Vec3::new(
        radius * cos_lat * lng.sin(),
        radius * lat.sin(),
        radius * cos_lat * lng.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::{LatLng, lat_lng_to_sphere};
    use crate::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn equator_prime_meridian_faces_positive_z() {
        let p = lat_lng_to_sphere(0.0, 0.0, 5.0);
        assert_eq!(p, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn equator_90e_faces_positive_x() {
        let p = lat_lng_to_sphere(0.0, 90.0, 5.0);
        assert_close(p.x, 5.0, 1e-12);
        assert_close(p.y, 0.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn north_pole_is_up() {
        let p = lat_lng_to_sphere(90.0, 42.0, 2.0);
        assert_close(p.y, 2.0, 1e-12);
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn projected_points_lie_on_the_sphere() {
        let radius = 5.0;
        let mut lat = -90.0;
        while lat <= 90.0 {
            let mut lng = -180.0;
            while lng <= 180.0 {
                let p = lat_lng_to_sphere(lat, lng, radius);
                assert_close(p.length(), radius, 1e-9);
                lng += 7.5;
            }
            lat += 7.5;
        }
    }

    #[test]
    fn projection_is_deterministic() {
        let a = lat_lng_to_sphere(23.6345, -102.5528, 5.0);
        let b = lat_lng_to_sphere(23.6345, -102.5528, 5.0);
        assert_eq!(a, b);
    }

    #[test]
    fn try_new_rejects_non_finite() {
        assert!(LatLng::try_new(f64::NAN, 0.0).is_none());
        assert!(LatLng::try_new(0.0, f64::INFINITY).is_none());
        assert!(LatLng::try_new(10.0, 20.0).is_some());
    }
}
