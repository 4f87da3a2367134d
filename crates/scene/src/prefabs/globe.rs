use std::f64::consts::FRAC_PI_2;

use foundation::math::{LatLng, Quat, Vec3};
use formats::{CountryRecord, format_population};
use rand::Rng;
use runtime::tween::{Ease, Repeat, Tween};
use serde::{Deserialize, Serialize};

use crate::World;
use crate::components::{Bar, Drawable3D, Material, Transform, parse_hex_color};
use crate::entity::EntityId;

/// Fallback when `bar_color` is not a valid `#rrggbb` string.
const DEFAULT_BAR_COLOR: [f32; 3] = [59.0 / 255.0, 247.0 / 255.0, 1.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeSettings {
    pub radius: f64,
    pub segments: u32,
    pub atmosphere_scale: f64,
    pub star_count: u32,
    pub star_spread: f64,
    pub bar_color: String,
    pub bar_opacity: f32,
    pub bar_hover_opacity: f32,
    pub pulse_peak: f64,
    pub pulse_duration_s: f64,
    pub pulse_max_delay_s: f64,
    pub thousands_separator: String,
    pub rng_seed: u64,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            radius: 5.0,
            segments: 50,
            atmosphere_scale: 1.1,
            star_count: 10_000,
            star_spread: 2000.0,
            bar_color: "#3BF7FF".to_string(),
            bar_opacity: 0.4,
            bar_hover_opacity: 1.0,
            pulse_peak: 1.4,
            pulse_duration_s: 2.0,
            pulse_max_delay_s: 1.0,
            thousands_separator: ",".to_string(),
            rng_seed: 0x6c6f_6265,
        }
    }
}

/// Placement and extent of a population bar, before any pulse scaling.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BarGeometry {
    pub position: Vec3,
    pub rotation: Quat,
    /// Box extents: footprint in local X/Y, depth along local Z.
    pub size: Vec3,
    /// Box center in local space; pushes the bar outward from the surface.
    pub offset: Vec3,
}

/// Geometry for a bar of `population` at `lat_lng` on a sphere of `radius`.
///
/// `depth_jitter` is a uniform sample in `[0, 1)`; it sets a minimum depth so
/// small countries remain visible.
pub fn bar_geometry(lat_lng: LatLng, population: u64, radius: f64, depth_jitter: f64) -> BarGeometry {
    let scale = population as f64 / 1_000_000_000.0;
    let footprint = (0.2 * scale).max(0.1);
    let z_scale = 0.8 * scale;
    let depth = z_scale.max(0.4 * depth_jitter);

    let position = lat_lng.to_sphere(radius);
    let toward_center = (Vec3::ZERO - position).normalize_or_zero();

    BarGeometry {
        position,
        rotation: Quat::look_along(toward_center, Vec3::Y),
        size: Vec3::new(footprint, footprint, depth),
        offset: Vec3::new(0.0, 0.0, -z_scale / 2.0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarAnimation {
    pub entity: EntityId,
    pub pulse: Tween<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobeScene {
    /// Rotated by the drag controller; parents the sphere and the bars.
    pub group: EntityId,
    pub sphere: EntityId,
    pub atmosphere: EntityId,
    pub stars: EntityId,
    pub bars: Vec<BarAnimation>,
}

impl GlobeScene {
    pub fn set_group_rotation(&self, world: &mut World, x_rad: f64, y_rad: f64) {
        if let Some(t) = world.transform_mut(self.group) {
            t.rotation = Quat::from_euler_xyz(x_rad, y_rad, 0.0);
        }
    }

    /// Advance every bar's pulse and write it into the bar's Z scale.
    pub fn animate_bars(&mut self, world: &mut World, dt_s: f64) {
        for bar in &mut self.bars {
            let z = bar.pulse.advance(dt_s);
            if let Some(t) = world.transform_mut(bar.entity) {
                t.scale = Vec3::new(1.0, 1.0, z);
            }
        }
    }
}

pub fn spawn_population_globe<R: Rng + ?Sized>(
    world: &mut World,
    countries: &[CountryRecord],
    settings: &GlobeSettings,
    rng: &mut R,
) -> GlobeScene {
    let group = world.spawn();
    world.set_transform(group, Transform::identity());

    let sphere = world.spawn();
    world.set_transform(
        sphere,
        Transform::identity().with_rotation(Quat::from_rotation_y(-FRAC_PI_2)),
    );
    world.set_drawable_3d(sphere, Drawable3D::sphere(settings.radius, settings.segments));
    world.set_material(sphere, Material::globe());
    world.set_parent(sphere, group);

    let atmosphere = world.spawn();
    world.set_transform(
        atmosphere,
        Transform::identity().with_scale(Vec3::splat(settings.atmosphere_scale)),
    );
    world.set_drawable_3d(atmosphere, Drawable3D::sphere(settings.radius, settings.segments));
    world.set_material(atmosphere, Material::atmosphere());

    let stars = world.spawn();
    let cloud = world.add_point_cloud(starfield(settings, rng));
    world.set_transform(stars, Transform::identity());
    world.set_drawable_3d(stars, Drawable3D::points(cloud));

    let color = parse_hex_color(&settings.bar_color).unwrap_or_else(|| {
        tracing::warn!(color = %settings.bar_color, "invalid bar color; using default");
        DEFAULT_BAR_COLOR
    });

    let mut bars = Vec::with_capacity(countries.len());
    for country in countries {
        let Some(lat_lng) = country.lat_lng() else {
            tracing::debug!(country = %country.name, "no coordinates; skipping bar");
            continue;
        };

        let geometry = bar_geometry(lat_lng, country.population, settings.radius, rng.random::<f64>());
        let entity = world.spawn();
        world.set_transform(
            entity,
            Transform::translate(geometry.position).with_rotation(geometry.rotation),
        );
        world.set_drawable_3d(entity, Drawable3D::cuboid(geometry.size, geometry.offset));
        world.set_material(entity, Material::solid(color).with_opacity(settings.bar_opacity));
        world.set_bar(
            entity,
            Bar {
                country: country.name.clone(),
                population_text: format_population(country.population, &settings.thousands_separator),
            },
        );
        world.set_parent(entity, group);

        let pulse = Tween::new(1.0, settings.pulse_peak, settings.pulse_duration_s)
            .with_ease(Ease::Linear)
            .with_repeat(Repeat::Forever { yoyo: true })
            .with_delay(rng.random::<f64>() * settings.pulse_max_delay_s);
        bars.push(BarAnimation { entity, pulse });
    }

    tracing::info!(
        countries = countries.len(),
        bars = bars.len(),
        stars = settings.star_count,
        "population globe spawned"
    );

    GlobeScene {
        group,
        sphere,
        atmosphere,
        stars,
        bars,
    }
}

fn starfield<R: Rng + ?Sized>(settings: &GlobeSettings, rng: &mut R) -> Vec<Vec3> {
    let spread = settings.star_spread;
    (0..settings.star_count)
        .map(|_| {
            let x = (rng.random::<f64>() - 0.5) * spread;
            let y = (rng.random::<f64>() - 0.5) * spread;
            let z = -rng.random::<f64>() * spread;
            Vec3::new(x, y, z)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{GlobeSettings, bar_geometry, spawn_population_globe};
    use crate::World;
    use crate::components::{Shape3D, Side};
    use crate::picking::{Ray, pick_bars, ray_hits_entity};
    use formats::CountryRecord;
    use foundation::math::{LatLng, Vec3};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "expected {a} ~= {b} (eps {eps})");
    }

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        let d = (a - b).length();
        assert!(d <= eps, "expected {a:?} ~= {b:?} (diff {d})");
    }

    fn country(name: &str, population: u64, latlng: Option<[f64; 2]>) -> CountryRecord {
        CountryRecord {
            name: name.to_string(),
            population,
            latlng,
        }
    }

    fn small_settings() -> GlobeSettings {
        GlobeSettings {
            star_count: 64,
            ..GlobeSettings::default()
        }
    }

    #[test]
    fn testland_bar_sits_on_the_front_of_the_sphere() {
        let geometry = bar_geometry(LatLng::new(0.0, 0.0), 1_000_000_000, 5.0, 0.0);
        assert_vec_close(geometry.position, Vec3::new(0.0, 0.0, 5.0), 1e-12);
        assert_vec_close(geometry.size, Vec3::new(0.2, 0.2, 0.8), 1e-12);
        assert_vec_close(geometry.offset, Vec3::new(0.0, 0.0, -0.4), 1e-12);

        // Local +Z faces the center, so the offset box extends outward.
        let outer = geometry.position + geometry.rotation.rotate(geometry.offset);
        assert_vec_close(outer, Vec3::new(0.0, 0.0, 5.4), 1e-9);
    }

    #[test]
    fn small_population_keeps_minimum_footprint_and_jittered_depth() {
        let geometry = bar_geometry(LatLng::new(10.0, 20.0), 1_000_000, 5.0, 0.5);
        assert_close(geometry.size.x, 0.1, 1e-12);
        assert_close(geometry.size.z, 0.2, 1e-12);
        assert_close(geometry.position.length(), 5.0, 1e-12);
    }

    #[test]
    fn countries_without_coordinates_get_no_bar() {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let countries = vec![
            country("Testland", 1_000_000_000, Some([0.0, 0.0])),
            country("Nowhere", 12, None),
            country("Broken", 12, Some([f64::NAN, 0.0])),
        ];

        let scene = spawn_population_globe(&mut world, &countries, &small_settings(), &mut rng);
        assert_eq!(scene.bars.len(), 1);

        let bar = world.bar(scene.bars[0].entity).expect("bar component");
        assert_eq!(bar.country, "Testland");
        assert_eq!(bar.population_text, "1,000,000,000");
        assert_eq!(world.parent(scene.bars[0].entity), Some(scene.group));
    }

    #[test]
    fn scene_layers_are_wired() {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let settings = small_settings();
        let scene = spawn_population_globe(&mut world, &[], &settings, &mut rng);

        assert_eq!(world.parent(scene.sphere), Some(scene.group));
        assert_eq!(world.parent(scene.atmosphere), None);
        assert_eq!(
            world.material(scene.atmosphere).map(|m| m.side),
            Some(Side::Back)
        );

        let Some(Shape3D::Points { cloud }) = world.drawable_3d(scene.stars).map(|d| d.shape) else {
            panic!("expected starfield");
        };
        let stars = world.point_cloud(cloud).expect("cloud");
        assert_eq!(stars.len(), 64);
        for s in stars {
            assert!(s.x >= -1000.0 && s.x < 1000.0);
            assert!(s.y >= -1000.0 && s.y < 1000.0);
            assert!(s.z > -2000.0 && s.z <= 0.0);
        }
    }

    #[test]
    fn spawn_is_deterministic_for_a_seed() {
        let countries = vec![country("A", 50_000_000, Some([45.0, 90.0]))];
        let spawn = || {
            let mut world = World::new();
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            let scene = spawn_population_globe(&mut world, &countries, &small_settings(), &mut rng);
            (world.drawable_3d(scene.bars[0].entity), scene.bars[0].pulse.delay_s())
        };
        assert_eq!(spawn(), spawn());
    }

    #[test]
    fn pulse_scales_bar_depth() {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let settings = GlobeSettings {
            pulse_max_delay_s: 0.0,
            ..small_settings()
        };
        let countries = vec![country("Testland", 1_000_000_000, Some([0.0, 0.0]))];
        let mut scene = spawn_population_globe(&mut world, &countries, &settings, &mut rng);

        scene.animate_bars(&mut world, 1.0);
        let t = world.transform(scene.bars[0].entity).expect("transform");
        assert_close(t.scale.z, 1.2, 1e-9);
        assert_close(t.scale.x, 1.0, 1e-12);
    }

    #[test]
    fn ray_at_bar_hits_it_and_nothing_else() {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let countries = vec![
            country("Testland", 1_000_000_000, Some([0.0, 0.0])),
            country("Northland", 1_000_000_000, Some([60.0, 0.0])),
        ];
        let scene = spawn_population_globe(&mut world, &countries, &small_settings(), &mut rng);

        let camera = Vec3::new(0.0, 0.0, 15.0);
        let ray = Ray::new(camera, Vec3::new(0.0, 0.0, -1.0));
        let hit = pick_bars(&world, ray).expect("hit");
        assert_eq!(hit.entity, scene.bars[0].entity);
        assert!(ray_hits_entity(&world, scene.bars[1].entity, ray).is_none());

        let empty = Ray::new(camera, Vec3::new(1.0, 1.0, 0.0));
        assert!(pick_bars(&world, empty).is_none());
    }

    #[test]
    fn group_rotation_moves_bars() {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let countries = vec![country("Testland", 1_000_000_000, Some([0.0, 0.0]))];
        let scene = spawn_population_globe(&mut world, &countries, &small_settings(), &mut rng);

        scene.set_group_rotation(&mut world, 0.0, std::f64::consts::FRAC_PI_2);
        let p = world
            .world_matrix(scene.bars[0].entity)
            .transform_point(Vec3::ZERO);
        assert_vec_close(p, Vec3::new(5.0, 0.0, 0.0), 1e-9);
    }
}
