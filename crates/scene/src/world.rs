use crate::components::{ComponentBounds, ComponentProperties, Drawable3D, Placement, Visibility};
use crate::entity::EntityId;
use foundation::Pose;
use foundation::handles::Handle;

/// Column store for scene entities.
///
/// Slots are reused after `despawn`; the generation counter makes stale ids
/// from a previous occupant miss instead of aliasing the new one.
#[derive(Debug, Default)]
pub struct World {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    placements: Vec<Option<Placement>>,
    bounds: Vec<Option<ComponentBounds>>,
    visibility: Vec<Option<Visibility>>,
    drawables_3d: Vec<Option<Drawable3D>>,
    properties: Vec<Option<ComponentProperties>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        if let Some(index) = self.free.pop() {
            let idx = index as usize;
            self.alive[idx] = true;
            return EntityId(Handle::new(index, self.generations[idx]));
        }

        let index = self.generations.len() as u32;
        self.ensure_capacity(index as usize);
        self.alive[index as usize] = true;
        EntityId(Handle::new(index, 0))
    }

    /// Removes `entity` and all of its components. Returns `false` for ids
    /// that are already gone.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        let Some(idx) = self.slot(entity) else {
            return false;
        };
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.placements[idx] = None;
        self.bounds[idx] = None;
        self.visibility[idx] = None;
        self.drawables_3d[idx] = None;
        self.properties[idx] = None;
        self.free.push(entity.index());
        true
    }

    /// Despawns every live entity; returns how many there were.
    pub fn clear(&mut self) -> usize {
        let live: Vec<EntityId> = (0..self.alive.len())
            .filter(|idx| self.alive[*idx])
            .map(|idx| EntityId(Handle::new(idx as u32, self.generations[idx])))
            .collect();
        for entity in &live {
            self.despawn(*entity);
        }
        live.len()
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.slot(entity).is_some()
    }

    pub fn len(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_placement(&mut self, entity: EntityId, placement: Placement) -> bool {
        self.with_slot(entity, |w, idx| w.placements[idx] = Some(placement))
    }

    pub fn placement(&self, entity: EntityId) -> Option<Placement> {
        self.slot(entity).and_then(|idx| self.placements[idx])
    }

    /// Writes a settled pose in one step: committed and displayed together.
    pub fn commit_pose(&mut self, entity: EntityId, pose: Pose) -> bool {
        self.set_placement(entity, Placement::settled(pose))
    }

    pub fn set_bounds(&mut self, entity: EntityId, bounds: ComponentBounds) -> bool {
        self.with_slot(entity, |w, idx| w.bounds[idx] = Some(bounds))
    }

    pub fn bounds(&self, entity: EntityId) -> Option<ComponentBounds> {
        self.slot(entity).and_then(|idx| self.bounds[idx])
    }

    pub fn set_visibility(&mut self, entity: EntityId, visibility: Visibility) -> bool {
        self.with_slot(entity, |w, idx| w.visibility[idx] = Some(visibility))
    }

    pub fn visibility(&self, entity: EntityId) -> Option<Visibility> {
        self.slot(entity).and_then(|idx| self.visibility[idx])
    }

    pub fn set_drawable_3d(&mut self, entity: EntityId, drawable: Drawable3D) -> bool {
        self.with_slot(entity, |w, idx| w.drawables_3d[idx] = Some(drawable))
    }

    pub fn drawable_3d(&self, entity: EntityId) -> Option<Drawable3D> {
        self.slot(entity).and_then(|idx| self.drawables_3d[idx])
    }

    pub fn set_properties(&mut self, entity: EntityId, properties: ComponentProperties) -> bool {
        self.with_slot(entity, |w, idx| w.properties[idx] = Some(properties))
    }

    pub fn properties(&self, entity: EntityId) -> Option<&ComponentProperties> {
        self.slot(entity).and_then(|idx| self.properties[idx].as_ref())
    }

    /// Visible 3D drawables that have a placement. Entities without a
    /// visibility component count as visible.
    pub fn drawables_3d(&self) -> Vec<(EntityId, Placement, Drawable3D)> {
        let mut out = Vec::new();
        for (idx, drawable) in self.drawables_3d.iter().enumerate() {
            let Some(drawable) = drawable else { continue };
            let Some(placement) = self.placements[idx] else {
                continue;
            };
            let visible = self.visibility[idx].map(Visibility::is_shown).unwrap_or(true);
            if !visible {
                continue;
            }

            let id = EntityId(Handle::new(idx as u32, self.generations[idx]));
            out.push((id, placement, *drawable));
        }
        out
    }

    fn slot(&self, entity: EntityId) -> Option<usize> {
        let idx = entity.index() as usize;
        let live = self.alive.get(idx).copied().unwrap_or(false)
            && self.generations[idx] == entity.generation();
        live.then_some(idx)
    }

    fn with_slot(&mut self, entity: EntityId, f: impl FnOnce(&mut Self, usize)) -> bool {
        match self.slot(entity) {
            Some(idx) => {
                f(self, idx);
                true
            }
            None => false,
        }
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.generations.len() <= idx {
            let new_len = idx + 1;
            self.generations.resize(new_len, 0);
            self.alive.resize(new_len, false);
            self.placements.resize(new_len, None);
            self.bounds.resize(new_len, None);
            self.visibility.resize(new_len, None);
            self.drawables_3d.resize(new_len, None);
            self.properties.resize(new_len, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::components::{AssetId, ComponentProperties, Drawable3D, Placement, Visibility};
    use foundation::math::{GeoCoordinate, Heading};
    use foundation::Pose;

    fn pose(lon: f64, lat: f64) -> Pose {
        Pose::at(GeoCoordinate::new(lon, lat).unwrap())
    }

    #[test]
    fn spawn_and_collect_drawables() {
        let mut world = World::new();
        let entity = world.spawn();
        world.commit_pose(entity, pose(90.4125, 23.8103));
        world.set_drawable_3d(entity, Drawable3D::model(AssetId(1)));

        let drawables = world.drawables_3d();
        assert_eq!(drawables.len(), 1);
        assert_eq!(drawables[0].0, entity);
    }

    #[test]
    fn hidden_entities_are_filtered() {
        let mut world = World::new();
        let entity = world.spawn();
        world.commit_pose(entity, pose(0.0, 0.0));
        world.set_drawable_3d(entity, Drawable3D::model(AssetId(1)));
        world.set_visibility(entity, Visibility::Hidden);

        assert!(world.drawables_3d().is_empty());
    }

    #[test]
    fn drawables_without_placement_are_skipped() {
        let mut world = World::new();
        let entity = world.spawn();
        world.set_drawable_3d(entity, Drawable3D::model(AssetId(1)));
        assert!(world.drawables_3d().is_empty());
    }

    #[test]
    fn stale_ids_miss_after_slot_reuse() {
        let mut world = World::new();
        let first = world.spawn();
        world.set_properties(first, ComponentProperties::with_tooltip("Bus #123"));
        assert!(world.despawn(first));
        assert!(!world.despawn(first));

        let second = world.spawn();
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(!world.is_alive(first));
        assert!(world.properties(second).is_none());
        assert!(!world.commit_pose(first, pose(1.0, 1.0)));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn clear_despawns_everything() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        world.despawn(a);
        assert_eq!(world.clear(), 1);
        assert!(!world.is_alive(b));
        assert!(world.is_empty());
        assert_eq!(world.clear(), 0);
    }

    #[test]
    fn commit_pose_settles_placement() {
        let mut world = World::new();
        let entity = world.spawn();
        let start = pose(0.0, 0.0);
        let target = Pose::new(GeoCoordinate::new(0.001, 0.0).unwrap(), Heading::EAST);
        world.set_placement(
            entity,
            Placement {
                committed: target,
                displayed: start,
            },
        );
        assert!(!world.placement(entity).unwrap().is_settled());

        world.commit_pose(entity, target);
        let placement = world.placement(entity).unwrap();
        assert!(placement.is_settled());
        assert_eq!(placement.displayed, target);
    }
}
