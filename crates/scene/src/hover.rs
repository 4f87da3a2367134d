use crate::World;
use crate::entity::EntityId;
use crate::picking::PickHit;

/// What the tooltip has to do after a hover update.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverChange {
    /// Same target as the previous frame; nothing to write.
    Unchanged,
    Entered {
        entity: EntityId,
        label: String,
        value: String,
    },
    Cleared,
}

/// Tracks the hovered bar and drives bar opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTracker {
    base_opacity: f32,
    hover_opacity: f32,
    hovered: Option<EntityId>,
    /// `false` until the first update; the tooltip's initial DOM state is unknown.
    synced: bool,
}

impl HoverTracker {
    pub fn new(base_opacity: f32, hover_opacity: f32) -> Self {
        Self {
            base_opacity,
            hover_opacity,
            hovered: None,
            synced: false,
        }
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    /// Reset every bar to base opacity, raise the hit bar, and report how the
    /// tooltip changed relative to the previous call. The first call always
    /// reports, so an initial miss hides the tooltip.
    pub fn update(&mut self, world: &mut World, hit: Option<PickHit>) -> HoverChange {
        let bars = world.bar_entities();
        for &entity in &bars {
            if let Some(material) = world.material_mut(entity) {
                material.opacity = self.base_opacity;
            }
        }

        let target = hit
            .map(|h| h.entity)
            .filter(|entity| world.bar(*entity).is_some());
        if let Some(entity) = target
            && let Some(material) = world.material_mut(entity)
        {
            material.opacity = self.hover_opacity;
        }

        if self.synced && target == self.hovered {
            return HoverChange::Unchanged;
        }
        self.synced = true;
        self.hovered = target;

        match target.and_then(|entity| world.bar(entity).map(|bar| (entity, bar))) {
            Some((entity, bar)) => HoverChange::Entered {
                entity,
                label: bar.country.clone(),
                value: bar.population_text.clone(),
            },
            None => HoverChange::Cleared,
        }
    }

    /// Forget the hovered bar, restoring its base opacity.
    pub fn clear(&mut self, world: &mut World) -> HoverChange {
        self.update(world, None)
    }
}

#[cfg(test)]
mod tests {
    use super::{HoverChange, HoverTracker};
    use crate::World;
    use crate::components::{Bar, Drawable3D, Material, Transform};
    use crate::entity::EntityId;
    use crate::picking::PickHit;
    use foundation::math::Vec3;
    use pretty_assertions::assert_eq;

    fn spawn_bar(world: &mut World, name: &str) -> EntityId {
        let e = world.spawn();
        world.set_transform(e, Transform::identity());
        world.set_drawable_3d(e, Drawable3D::cuboid(Vec3::ONE, Vec3::ZERO));
        world.set_material(e, Material::solid([0.0, 1.0, 1.0]).with_opacity(0.4));
        world.set_bar(
            e,
            Bar {
                country: name.to_string(),
                population_text: "1,000".to_string(),
            },
        );
        e
    }

    fn hit(entity: EntityId) -> Option<PickHit> {
        Some(PickHit {
            entity,
            distance: 1.0,
        })
    }

    fn opacity(world: &World, e: EntityId) -> Option<f32> {
        world.material(e).map(|m| m.opacity)
    }

    #[test]
    fn hover_raises_only_the_hit_bar() {
        let mut world = World::new();
        let a = spawn_bar(&mut world, "A");
        let b = spawn_bar(&mut world, "B");
        let mut tracker = HoverTracker::new(0.4, 1.0);

        let change = tracker.update(&mut world, hit(a));
        assert_eq!(
            change,
            HoverChange::Entered {
                entity: a,
                label: "A".to_string(),
                value: "1,000".to_string(),
            }
        );
        assert_eq!(opacity(&world, a), Some(1.0));
        assert_eq!(opacity(&world, b), Some(0.4));

        tracker.update(&mut world, hit(b));
        assert_eq!(opacity(&world, a), Some(0.4));
        assert_eq!(opacity(&world, b), Some(1.0));
    }

    #[test]
    fn repeated_target_is_unchanged() {
        let mut world = World::new();
        let a = spawn_bar(&mut world, "A");
        let mut tracker = HoverTracker::new(0.4, 1.0);

        tracker.update(&mut world, hit(a));
        assert_eq!(tracker.update(&mut world, hit(a)), HoverChange::Unchanged);
        assert_eq!(opacity(&world, a), Some(1.0));
    }

    #[test]
    fn miss_clears_once_and_resets_opacity() {
        let mut world = World::new();
        let a = spawn_bar(&mut world, "A");
        let mut tracker = HoverTracker::new(0.4, 1.0);

        tracker.update(&mut world, None);
        tracker.update(&mut world, hit(a));
        assert_eq!(tracker.clear(&mut world), HoverChange::Cleared);
        assert_eq!(tracker.update(&mut world, None), HoverChange::Unchanged);
        assert_eq!(opacity(&world, a), Some(0.4));
        assert_eq!(tracker.hovered(), None);
    }

    #[test]
    fn first_miss_hides_the_tooltip() {
        let mut world = World::new();
        spawn_bar(&mut world, "A");
        let mut tracker = HoverTracker::new(0.4, 1.0);

        assert_eq!(tracker.update(&mut world, None), HoverChange::Cleared);
        assert_eq!(tracker.update(&mut world, None), HoverChange::Unchanged);
        assert_eq!(tracker.update(&mut world, None), HoverChange::Unchanged);
    }
}
