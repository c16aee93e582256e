//! The simulation-owned entity table.

use crate::{Entity, EntityAllocator, Position, Tags, Velocity};

/// Everything the simulation knows about one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRecord {
    pub position: Position,
    pub velocity: Velocity,
    pub tags: Tags,
}

impl EntityRecord {
    #[must_use]
    pub const fn new(position: Position, tags: Tags) -> Self {
        Self {
            position,
            velocity: Velocity::ZERO,
            tags,
        }
    }
}

/// Slot-indexed entity table.
///
/// Iteration order is slot order, which keeps runs reproducible for a
/// given seed.
#[derive(Debug, Default)]
pub struct EntityStore {
    allocator: EntityAllocator,
    slots: Vec<Option<(Entity, EntityRecord)>>,
}

impl EntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            allocator: EntityAllocator::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn spawn(&mut self, record: EntityRecord) -> Entity {
        let entity = self.allocator.allocate();
        let slot = entity.id() as usize;

        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }
        self.slots[slot] = Some((entity, record));

        entity
    }

    /// Removes `entity`, returning its last record.
    pub fn despawn(&mut self, entity: Entity) -> Option<EntityRecord> {
        if !self.allocator.free(entity) {
            return None;
        }
        self.slots[entity.id() as usize]
            .take()
            .map(|(_, record)| record)
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&EntityRecord> {
        match self.slots.get(entity.id() as usize)? {
            Some((current, record)) if *current == entity => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        match self.slots.get_mut(entity.id() as usize)? {
            Some((current, record)) if *current == entity => Some(record),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &EntityRecord)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|(entity, record)| (*entity, record)))
    }

    /// Live entities carrying every flag of `required`, in slot order.
    pub fn with_tags(&self, required: Tags) -> impl Iterator<Item = (Entity, &EntityRecord)> {
        self.iter()
            .filter(move |(_, record)| record.tags.satisfies(required))
    }

    /// Snapshot of the entities carrying `required`.
    #[must_use]
    pub fn ids_with_tags(&self, required: Tags) -> Vec<Entity> {
        self.with_tags(required).map(|(entity, _)| entity).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.allocator.alive_count() as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
