use crate::components::{Bar, Drawable3D, Material, PointCloudId, Transform};
use crate::entity::EntityId;
use foundation::handles::Handle;
use foundation::math::{Mat4, Vec3};

/// Parent chains deeper than this are treated as cycles and cut.
const MAX_HIERARCHY_DEPTH: usize = 16;

#[derive(Debug, Default)]
pub struct World {
    next_index: u32,
    transforms: Vec<Option<Transform>>,
    parents: Vec<Option<EntityId>>,
    drawables_3d: Vec<Option<Drawable3D>>,
    materials: Vec<Option<Material>>,
    bars: Vec<Option<Bar>>,
    point_clouds: Vec<Vec<Vec3>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(Handle::new(self.next_index));
        self.next_index += 1;
        let idx = id.index() as usize;
        self.ensure_capacity(idx);
        id
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        self.ensure_capacity(entity.index() as usize);
        self.transforms[entity.index() as usize] = Some(transform);
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.transforms.get(entity.index() as usize).and_then(|t| *t)
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.transforms
            .get_mut(entity.index() as usize)
            .and_then(|t| t.as_mut())
    }

    pub fn set_parent(&mut self, entity: EntityId, parent: EntityId) {
        self.ensure_capacity(entity.index() as usize);
        self.parents[entity.index() as usize] = Some(parent);
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.parents.get(entity.index() as usize).and_then(|p| *p)
    }

    pub fn set_drawable_3d(&mut self, entity: EntityId, drawable: Drawable3D) {
        self.ensure_capacity(entity.index() as usize);
        self.drawables_3d[entity.index() as usize] = Some(drawable);
    }

    pub fn drawable_3d(&self, entity: EntityId) -> Option<Drawable3D> {
        self.drawables_3d
            .get(entity.index() as usize)
            .and_then(|d| *d)
    }

    pub fn set_material(&mut self, entity: EntityId, material: Material) {
        self.ensure_capacity(entity.index() as usize);
        self.materials[entity.index() as usize] = Some(material);
    }

    pub fn material(&self, entity: EntityId) -> Option<Material> {
        self.materials.get(entity.index() as usize).and_then(|m| *m)
    }

    pub fn material_mut(&mut self, entity: EntityId) -> Option<&mut Material> {
        self.materials
            .get_mut(entity.index() as usize)
            .and_then(|m| m.as_mut())
    }

    pub fn set_bar(&mut self, entity: EntityId, bar: Bar) {
        self.ensure_capacity(entity.index() as usize);
        self.bars[entity.index() as usize] = Some(bar);
    }

    pub fn bar(&self, entity: EntityId) -> Option<&Bar> {
        self.bars.get(entity.index() as usize).and_then(|b| b.as_ref())
    }

    /// Entities carrying a [`Bar`], in ascending index order.
    pub fn bar_entities(&self) -> Vec<EntityId> {
        self.bars
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_some())
            .map(|(idx, _)| EntityId(Handle::new(idx as u32)))
            .collect()
    }

    pub fn add_point_cloud(&mut self, points: Vec<Vec3>) -> PointCloudId {
        let id = PointCloudId(self.point_clouds.len() as u32);
        self.point_clouds.push(points);
        id
    }

    pub fn point_cloud(&self, id: PointCloudId) -> Option<&[Vec3]> {
        self.point_clouds.get(id.0 as usize).map(Vec::as_slice)
    }

    /// Ancestors from the root down to `entity` (inclusive).
    pub fn lineage(&self, entity: EntityId) -> Vec<EntityId> {
        let mut chain = vec![entity];
        let mut cursor = entity;
        while let Some(parent) = self.parent(cursor) {
            if chain.len() >= MAX_HIERARCHY_DEPTH {
                break;
            }
            chain.push(parent);
            cursor = parent;
        }
        chain.reverse();
        chain
    }

    /// Local-to-world matrix, composing all parent transforms.
    pub fn world_matrix(&self, entity: EntityId) -> Mat4 {
        self.lineage(entity)
            .into_iter()
            .filter_map(|e| self.transform(e))
            .fold(Mat4::IDENTITY, |acc, t| acc.mul(&t.matrix()))
    }

    /// Visible 3D drawables with their world matrices, in index order.
    pub fn drawables_3d(&self) -> Vec<(EntityId, Mat4, Drawable3D)> {
        let mut out = Vec::new();
        for (idx, drawable) in self.drawables_3d.iter().enumerate() {
            let Some(drawable) = drawable else { continue };
            let entity = EntityId(Handle::new(idx as u32));
            if self.transform(entity).is_none() {
                continue;
            }
            out.push((entity, self.world_matrix(entity), *drawable));
        }
        out
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.transforms.len() <= idx {
            let new_len = idx + 1;
            self.transforms.resize(new_len, None);
            self.parents.resize(new_len, None);
            self.drawables_3d.resize(new_len, None);
            self.materials.resize(new_len, None);
            self.bars.resize(new_len, None);
        }
    }
}
