use std::{any::TypeId, collections::HashMap};

use kalitech_common::KalitechError;
use serde_json::Value as JsonValue;

use crate::{
    column::{Column, ErasedColumn},
    entity::{EntityId, EntityManager},
};

/// Both storages described in §4.D sharing one entity-id space: `Typed`
/// columns keyed by native `TypeId` for host-side components, `Named`
/// columns keyed by string for script-declared ones.
#[derive(Default)]
pub struct EcsStore {
    entities: EntityManager,
    typed: HashMap<TypeId, Box<dyn ErasedColumn>>,
    named: HashMap<String, Column<JsonValue>>,
}

fn dead_entity(id: EntityId) -> KalitechError {
    KalitechError::InvalidHandle(format!("entity {id} is not alive"))
}

impl EcsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> EntityId {
        self.entities.create()
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.is_alive(id)
    }

    pub fn destroy(&mut self, id: EntityId) {
        if !self.entities.destroy(id) {
            return;
        }
        for column in self.typed.values_mut() {
            column.clear_at(id as usize);
        }
        for column in self.named.values_mut() {
            column.clear_at(id as usize);
        }
    }

    pub fn set<T: 'static>(&mut self, id: EntityId, value: T) -> Result<(), KalitechError> {
        if !self.entities.is_alive(id) {
            return Err(dead_entity(id));
        }
        let column = self
            .typed
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Column::<T>::new()));
        typed_column_mut::<T>(column.as_mut()).set(id as usize, value);
        Ok(())
    }

    pub fn get<T: 'static>(&self, id: EntityId) -> Option<&T> {
        let column = self.typed.get(&TypeId::of::<T>())?;
        typed_column::<T>(column.as_ref()).get(id as usize)
    }

    pub fn has<T: 'static>(&self, id: EntityId) -> bool {
        self.get::<T>(id).is_some()
    }

    pub fn remove<T: 'static>(&mut self, id: EntityId) -> Option<T> {
        let column = self.typed.get_mut(&TypeId::of::<T>())?;
        typed_column_mut::<T>(column.as_mut()).remove(id as usize)
    }

    pub fn for_each<T: 'static>(&self, mut f: impl FnMut(EntityId, &T)) {
        if let Some(column) = self.typed.get(&TypeId::of::<T>()) {
            typed_column::<T>(column.as_ref()).for_each(|i, v| f(i as EntityId, v));
        }
    }

    pub fn set_named(&mut self, id: EntityId, name: &str, value: JsonValue) -> Result<(), KalitechError> {
        if !self.entities.is_alive(id) {
            return Err(dead_entity(id));
        }
        self.named.entry(name.to_owned()).or_default().set(id as usize, value);
        Ok(())
    }

    pub fn get_named(&self, id: EntityId, name: &str) -> Option<&JsonValue> {
        self.named.get(name)?.get(id as usize)
    }

    pub fn has_named(&self, id: EntityId, name: &str) -> bool {
        self.get_named(id, name).is_some()
    }

    pub fn remove_named(&mut self, id: EntityId, name: &str) -> Option<JsonValue> {
        self.named.get_mut(name)?.remove(id as usize)
    }

    pub fn for_each_named(&self, name: &str, mut f: impl FnMut(EntityId, &JsonValue)) {
        if let Some(column) = self.named.get(name) {
            column.for_each(|i, v| (f)(i as EntityId, v));
        }
    }

    pub fn reset(&mut self) {
        self.entities.reset();
        self.typed.clear();
        self.named.clear();
    }
}

fn typed_column<T: 'static>(erased: &dyn ErasedColumn) -> &Column<T> {
    (erased.as_any())
        .downcast_ref::<Column<T>>()
        .expect("TypeId key matches the column's concrete type")
}

fn typed_column_mut<T: 'static>(erased: &mut dyn ErasedColumn) -> &mut Column<T> {
    (erased.as_any_mut())
        .downcast_mut::<Column<T>>()
        .expect("TypeId key matches the column's concrete type")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn typed_roundtrip() {
        let mut store = EcsStore::new();
        let e = store.create();
        store.set(e, Position { x: 1.0, y: 2.0 }).unwrap();
        assert_eq!(store.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert!(store.has::<Position>(e));
        assert_eq!(store.remove::<Position>(e), Some(Position { x: 1.0, y: 2.0 }));
        assert!(!store.has::<Position>(e));
    }

    #[test]
    fn set_on_dead_entity_fails() {
        let mut store = EcsStore::new();
        let e = store.create();
        store.destroy(e);
        assert!(matches!(store.set(e, 1u32), Err(KalitechError::InvalidHandle(_))));
    }

    #[test]
    fn destroy_clears_every_column_at_that_id() {
        let mut store = EcsStore::new();
        let e = store.create();
        store.set(e, 7u32).unwrap();
        store.set_named(e, "health", JsonValue::from(10)).unwrap();
        store.destroy(e);
        assert!(!store.get::<u32>(e).is_some());
        assert!(store.get_named(e, "health").is_none());
    }

    #[test]
    fn named_components_are_independent_per_key() {
        let mut store = EcsStore::new();
        let e = store.create();
        store.set_named(e, "health", JsonValue::from(10)).unwrap();
        store.set_named(e, "mana", JsonValue::from(5)).unwrap();
        assert_eq!(store.get_named(e, "health"), Some(&JsonValue::from(10)));
        assert_eq!(store.get_named(e, "mana"), Some(&JsonValue::from(5)));
    }

    #[test]
    fn reused_entity_id_starts_with_clean_columns() {
        let mut store = EcsStore::new();
        let e = store.create();
        store.set(e, 1u32).unwrap();
        store.destroy(e);
        let reused = store.create();
        assert_eq!(reused, e);
        assert!(!store.has::<u32>(reused));
    }
}
