use std::cmp::Ordering;

use foundation::bounds::Aabb3;
use foundation::math::Vec3;

use crate::World;
use crate::components::Shape3D;
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub distance: f64,
}

/// Deterministic ray picking over population bars.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - If multiple bars are hit at the same distance, the lower `EntityId::index()` wins.
///
/// Bars are tested against their oriented box in local space, so the group
/// rotation and per-bar pulse scale are honored.
pub fn pick_bars(world: &World, ray: Ray) -> Option<PickHit> {
    let dir = ray.dir.try_normalize()?;
    let ray = Ray::new(ray.origin, dir);

    let mut best: Option<(f64, EntityId)> = None;
    for entity in world.bar_entities() {
        let Some(t) = ray_hits_entity(world, entity, ray) else {
            continue;
        };
        best = match best {
            None => Some((t, entity)),
            Some((bt, be)) => {
                let ord = t
                    .partial_cmp(&bt)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| entity.index().cmp(&be.index()));
                if ord.is_lt() { Some((t, entity)) } else { Some((bt, be)) }
            }
        };
    }

    let (distance, entity) = best?;
    Some(PickHit { entity, distance })
}

/// Distance along `ray` (in units of `ray.dir`) to the entity's drawable,
/// or `None` when it is missed, behind the origin, or not pickable.
pub fn ray_hits_entity(world: &World, entity: EntityId, ray: Ray) -> Option<f64> {
    let drawable = world.drawable_3d(entity)?;
    world.transform(entity)?;

    let (origin, dir) = world
        .lineage(entity)
        .into_iter()
        .filter_map(|e| world.transform(e))
        .fold((ray.origin, ray.dir), |(o, d), t| {
            (t.inverse_point(o), t.inverse_vector(d))
        });

    match drawable.shape {
        Shape3D::Sphere { radius, .. } => ray_sphere_t(origin, dir, radius),
        Shape3D::Box { size, offset } => {
            Aabb3::from_center_half_extents(offset, size.scale(0.5)).ray_hit_t(
                origin,
                dir,
                0.0,
                f64::INFINITY,
            )
        }
        Shape3D::Points { .. } => None,
    }
}

fn ray_sphere_t(origin: Vec3, dir: Vec3, radius: f64) -> Option<f64> {
    let a = dir.dot(dir);
    if a <= 0.0 {
        return None;
    }
    let b = 2.0 * origin.dot(dir);
    let c = origin.dot(origin) - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let near = (-b - sqrt) / (2.0 * a);
    let far = (-b + sqrt) / (2.0 * a);
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{Ray, pick_bars, ray_hits_entity};
    use crate::World;
    use crate::components::{Bar, Drawable3D, Transform};
    use crate::entity::EntityId;
    use foundation::math::{Quat, Vec3};

    fn spawn_bar(world: &mut World, position: Vec3, name: &str) -> EntityId {
        let e = world.spawn();
        world.set_transform(e, Transform::translate(position));
        world.set_drawable_3d(e, Drawable3D::cuboid(Vec3::ONE, Vec3::ZERO));
        world.set_bar(
            e,
            Bar {
                country: name.to_string(),
                population_text: "1".to_string(),
            },
        );
        e
    }

    #[test]
    fn ray_picks_nearest_bar() {
        let mut world = World::new();
        let far = spawn_bar(&mut world, Vec3::new(0.0, 0.0, -10.0), "far");
        let near = spawn_bar(&mut world, Vec3::new(0.0, 0.0, -5.0), "near");

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = pick_bars(&world, ray).expect("hit");
        assert_eq!(hit.entity, near);
        assert!((hit.distance - 4.5).abs() < 1e-12);
        assert_ne!(hit.entity, far);
    }

    #[test]
    fn tie_breaks_by_entity_index() {
        let mut world = World::new();
        let first = spawn_bar(&mut world, Vec3::new(0.0, 0.0, -5.0), "a");
        let _second = spawn_bar(&mut world, Vec3::new(0.0, 0.0, -5.0), "b");

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(pick_bars(&world, ray).map(|h| h.entity), Some(first));
    }

    #[test]
    fn ray_into_empty_space_misses() {
        let mut world = World::new();
        spawn_bar(&mut world, Vec3::new(0.0, 0.0, -5.0), "a");

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!(pick_bars(&world, ray).is_none());
        let behind = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(pick_bars(&world, behind).is_none());
    }

    #[test]
    fn non_bar_drawables_are_not_picked() {
        let mut world = World::new();
        let sphere = world.spawn();
        world.set_transform(sphere, Transform::identity());
        world.set_drawable_3d(sphere, Drawable3D::sphere(5.0, 8));

        let ray = Ray::new(Vec3::new(0.0, 0.0, 15.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(pick_bars(&world, ray).is_none());
        let t = ray_hits_entity(&world, sphere, ray).expect("sphere hit");
        assert!((t - 10.0).abs() < 1e-12);
    }

    #[test]
    fn picking_follows_parent_rotation() {
        let mut world = World::new();
        let group = world.spawn();
        world.set_transform(
            group,
            Transform::identity().with_rotation(Quat::from_rotation_y(std::f64::consts::FRAC_PI_2)),
        );
        let bar = spawn_bar(&mut world, Vec3::new(0.0, 0.0, 5.0), "rotated");
        world.set_parent(bar, group);

        // Local +Z ends up on world +X after the group turns a quarter.
        let hit_x = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(pick_bars(&world, hit_x).map(|h| h.entity), Some(bar));
        let miss_z = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(pick_bars(&world, miss_z).is_none());
    }
}
