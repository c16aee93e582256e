//! Generational entity handles.
//!
//! A slot index is recycled after despawn, but its generation is bumped so a
//! handle kept by a behavior system can never alias the slot's next occupant.

use std::cmp::Ordering;
use std::fmt;

/// Recycling counter for an entity slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Generation(u32);

impl Generation {
    #[must_use]
    pub const fn first() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn bumped(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Slot index of an entity.
pub type EntityId = u32;

/// Stable identifier of a simulated entity.
///
/// Ordering follows the packed bits (generation, then slot). Spatial queries
/// use it to break distance ties, so both the indexed and the linear path
/// agree on which of two equidistant entities is "nearest".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: EntityId,
    generation: Generation,
}

impl Entity {
    #[must_use]
    pub const fn new(id: EntityId, generation: Generation) -> Self {
        Self { id, generation }
    }

    #[must_use]
    pub const fn id(self) -> EntityId {
        self.id
    }

    #[must_use]
    pub const fn generation(self) -> Generation {
        self.generation
    }

    /// Packs the handle as `(generation << 32) | id`.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.generation.0 as u64) << 32) | (self.id as u64)
    }

    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            id: bits as u32,
            generation: Generation((bits >> 32) as u32),
        }
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bits().cmp(&other.to_bits())
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}{:?})", self.id, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}g{}", self.id, self.generation.0)
    }
}

/// Hands out entity handles, reusing freed slots.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<Generation>,
    free: Vec<EntityId>,
    alive: u32,
}

impl EntityAllocator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generations: Vec::new(),
            free: Vec::new(),
            alive: 0,
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            generations: Vec::with_capacity(capacity),
            free: Vec::new(),
            alive: 0,
        }
    }

    pub fn allocate(&mut self) -> Entity {
        self.alive += 1;

        match self.free.pop() {
            Some(id) => Entity::new(id, self.generations[id as usize]),
            None => {
                let id = self.generations.len() as EntityId;
                self.generations.push(Generation::first());
                Entity::new(id, Generation::first())
            }
        }
    }

    /// Frees the slot of `entity`.
    ///
    /// Returns `false` for stale or unknown handles.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let slot = &mut self.generations[entity.id() as usize];
        *slot = slot.bumped();
        self.free.push(entity.id());
        self.alive -= 1;
        true
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.generations
            .get(entity.id() as usize)
            .is_some_and(|&current| current == entity.generation())
    }

    #[must_use]
    pub const fn alive_count(&self) -> u32 {
        self.alive
    }

    /// Number of slots ever handed out, live or free.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.generations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_sequential_slots() {
        let mut allocator = EntityAllocator::new();

        let a = allocator.allocate();
        let b = allocator.allocate();

        assert_eq!(a.id(), 0);
        assert_eq!(b.id(), 1);
        assert_eq!(allocator.alive_count(), 2);
    }

    #[test]
    fn freed_slot_comes_back_with_new_generation() {
        let mut allocator = EntityAllocator::new();

        let old = allocator.allocate();
        assert!(allocator.free(old));
        assert!(!allocator.is_alive(old));
        assert!(!allocator.free(old), "double free must be rejected");

        let new = allocator.allocate();
        assert_eq!(new.id(), old.id());
        assert_ne!(new.generation(), old.generation());
        assert!(allocator.is_alive(new));
        assert!(!allocator.is_alive(old));
    }

    #[test]
    fn bits_roundtrip_and_order() {
        let low = Entity::new(7, Generation::first());
        let high = Entity::new(3, Generation::first().bumped());

        assert_eq!(Entity::from_bits(low.to_bits()), low);
        assert!(low < high, "generation dominates ordering");
    }
}
