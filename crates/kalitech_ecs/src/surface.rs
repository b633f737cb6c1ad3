use std::collections::HashMap;

use kalitech_common::KalitechError;

use crate::entity::EntityId;

pub type SurfaceId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle {
    pub id: SurfaceId,
    pub kind: SurfaceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Mesh,
    Terrain,
    EditorGrid,
}

struct Entry<Spatial> {
    spatial: Spatial,
    kind: SurfaceKind,
    attached_entity: Option<EntityId>,
}

/// Authoritative store of scene spatials referenced opaquely by scripts
/// (§4.F). Id `0` is reserved and never handed out by `register`.
pub struct SurfaceRegistry<Spatial> {
    entries: HashMap<SurfaceId, Entry<Spatial>>,
    entity_to_surface: HashMap<EntityId, SurfaceId>,
    next_id: SurfaceId,
}

impl<Spatial> Default for SurfaceRegistry<Spatial> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            entity_to_surface: HashMap::new(),
            next_id: 1,
        }
    }
}

fn unknown_surface(id: SurfaceId) -> KalitechError {
    KalitechError::InvalidHandle(format!("surface {id} does not exist"))
}

fn duplicate_surface(id: SurfaceId) -> KalitechError {
    KalitechError::InvalidHandle(format!("surface {id} is already registered"))
}

impl<Spatial> SurfaceRegistry<Spatial> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spatial: Spatial, kind: SurfaceKind) -> SurfaceHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            id,
            Entry {
                spatial,
                kind,
                attached_entity: None,
            },
        );
        SurfaceHandle { id, kind }
    }

    /// Registers a surface under an id owned by an external id space (the
    /// renderer's own handle allocator), instead of allocating one from
    /// `next_id`. Keeps `next_id` past every id seen this way so a later
    /// `register` call never collides with it (§4.F, renderer-backed
    /// surfaces and host-declared ones share one id space).
    pub fn register_existing(&mut self, id: SurfaceId, spatial: Spatial, kind: SurfaceKind) -> Result<(), KalitechError> {
        if self.entries.contains_key(&id) {
            return Err(duplicate_surface(id));
        }
        self.entries.insert(
            id,
            Entry {
                spatial,
                kind,
                attached_entity: None,
            },
        );
        self.next_id = self.next_id.max(id + 1);
        Ok(())
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Spatial> {
        self.entries.get(&id).map(|e| &e.spatial)
    }

    pub fn exists(&self, id: SurfaceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// One surface per entity. Attaching a surface that is already
    /// attached elsewhere detaches it from its previous entity first.
    pub fn attach(&mut self, surface_id: SurfaceId, entity_id: EntityId) -> Result<(), KalitechError> {
        let entry = self.entries.get_mut(&surface_id).ok_or_else(|| unknown_surface(surface_id))?;

        if let Some(previous) = entry.attached_entity {
            self.entity_to_surface.remove(&previous);
        }
        entry.attached_entity = Some(entity_id);
        self.entity_to_surface.insert(entity_id, surface_id);
        Ok(())
    }

    pub fn detach_surface(&mut self, id: SurfaceId) -> Result<(), KalitechError> {
        let entry = self.entries.get_mut(&id).ok_or_else(|| unknown_surface(id))?;
        if let Some(entity_id) = entry.attached_entity.take() {
            self.entity_to_surface.remove(&entity_id);
        }
        Ok(())
    }

    pub fn detach_entity(&mut self, entity_id: EntityId) -> Option<SurfaceId> {
        let surface_id = self.entity_to_surface.remove(&entity_id)?;
        if let Some(entry) = self.entries.get_mut(&surface_id) {
            entry.attached_entity = None;
        }
        Some(surface_id)
    }

    /// Detaches the entity (if any) and removes the surface, returning its
    /// spatial.
    pub fn destroy(&mut self, id: SurfaceId) -> Result<Spatial, KalitechError> {
        let entry = self.entries.remove(&id).ok_or_else(|| unknown_surface(id))?;
        if let Some(entity_id) = entry.attached_entity {
            self.entity_to_surface.remove(&entity_id);
        }
        Ok(entry.spatial)
    }

    /// Drops every surface and resets id allocation (§4.L world rebuild,
    /// §5 "surfaces destroyed as entities are freed" — the orchestrator
    /// calls this alongside `EcsStore::reset` rather than destroying
    /// surfaces one at a time).
    pub fn reset(&mut self) {
        self.entries.clear();
        self.entity_to_surface.clear();
        self.next_id = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_zero_is_never_allocated() {
        let mut reg: SurfaceRegistry<&str> = SurfaceRegistry::new();
        let handle = reg.register("cube", SurfaceKind::Mesh);
        assert_ne!(handle.id, 0);
    }

    #[test]
    fn reattaching_moves_surface_to_new_entity() {
        let mut reg: SurfaceRegistry<&str> = SurfaceRegistry::new();
        let handle = reg.register("cube", SurfaceKind::Mesh);
        reg.attach(handle.id, 1).unwrap();
        reg.attach(handle.id, 2).unwrap();
        assert_eq!(reg.detach_entity(1), None);
        assert_eq!(reg.detach_entity(2), Some(handle.id));
    }

    #[test]
    fn destroy_detaches_entity_and_removes_spatial() {
        let mut reg: SurfaceRegistry<&str> = SurfaceRegistry::new();
        let handle = reg.register("cube", SurfaceKind::Mesh);
        reg.attach(handle.id, 1).unwrap();
        assert_eq!(reg.destroy(handle.id).unwrap(), "cube");
        assert!(!reg.exists(handle.id));
        assert_eq!(reg.detach_entity(1), None);
    }

    #[test]
    fn unknown_id_errors() {
        let mut reg: SurfaceRegistry<&str> = SurfaceRegistry::new();
        assert!(reg.attach(99, 1).is_err());
    }

    #[test]
    fn register_existing_rejects_a_duplicate_id() {
        let mut reg: SurfaceRegistry<&str> = SurfaceRegistry::new();
        reg.register_existing(5, "cube", SurfaceKind::Mesh).unwrap();
        assert!(reg.register_existing(5, "other", SurfaceKind::Mesh).is_err());
    }

    #[test]
    fn register_existing_keeps_later_allocations_past_the_external_id() {
        let mut reg: SurfaceRegistry<&str> = SurfaceRegistry::new();
        reg.register_existing(5, "cube", SurfaceKind::Mesh).unwrap();
        let handle = reg.register("plane", SurfaceKind::Mesh);
        assert!(handle.id > 5);
    }

    #[test]
    fn reset_clears_entries_and_restarts_id_allocation() {
        let mut reg: SurfaceRegistry<&str> = SurfaceRegistry::new();
        let handle = reg.register("cube", SurfaceKind::Mesh);
        reg.attach(handle.id, 1).unwrap();
        reg.reset();
        assert!(!reg.exists(handle.id));
        assert_eq!(reg.detach_entity(1), None);
        assert_eq!(reg.register("plane", SurfaceKind::Mesh).id, handle.id);
    }
}
