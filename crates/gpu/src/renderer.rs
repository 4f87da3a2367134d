use foundation::math::{Mat4, Vec3};
use scene::components::{Material, PointCloudId, Shape3D, Side, Surface};
use scene::entity::EntityId;
use scene::world::World;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RenderCommand {
    Stars {
        model: Mat4,
        cloud: PointCloudId,
    },
    /// Unit sphere mesh scaled to `radius` by `model`.
    Sphere {
        entity: EntityId,
        model: Mat4,
        segments: u32,
        material: Material,
    },
    /// Unit cube centered at the origin, mapped onto the bar box by `model`.
    Bar {
        entity: EntityId,
        model: Mat4,
        color: [f32; 3],
        opacity: f32,
    },
}

impl RenderCommand {
    /// Back-to-front layering: stars, back-face shells, opaque spheres, bars.
    fn layer(&self) -> u8 {
        match self {
            RenderCommand::Stars { .. } => 0,
            RenderCommand::Sphere { material, .. } if material.side == Side::Back => 1,
            RenderCommand::Sphere { .. } => 2,
            RenderCommand::Bar { .. } => 3,
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderFrame {
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn bars(&self) -> impl Iterator<Item = &RenderCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Bar { .. }))
    }
}

pub struct Renderer;

impl Renderer {
    pub fn collect(world: &World) -> RenderFrame {
        let mut frame = RenderFrame::default();
        for (entity, world_matrix, drawable) in world.drawables_3d() {
            let command = match drawable.shape {
                Shape3D::Points { cloud } => RenderCommand::Stars {
                    model: world_matrix,
                    cloud,
                },
                Shape3D::Sphere { radius, segments } => RenderCommand::Sphere {
                    entity,
                    model: world_matrix.mul(&Mat4::from_scale(Vec3::splat(radius))),
                    segments,
                    material: world.material(entity).unwrap_or_else(Material::globe),
                },
                Shape3D::Box { size, offset } => {
                    let Some(material) = world.material(entity) else {
                        continue;
                    };
                    let color = match material.surface {
                        Surface::Solid { color } => color,
                        _ => [1.0, 1.0, 1.0],
                    };
                    let local = Mat4::from_translation(offset).mul(&Mat4::from_scale(size));
                    RenderCommand::Bar {
                        entity,
                        model: world_matrix.mul(&local),
                        color,
                        opacity: material.opacity,
                    }
                }
            };
            frame.commands.push(command);
        }
        frame.commands.sort_by_key(RenderCommand::layer);
        frame
    }
}
