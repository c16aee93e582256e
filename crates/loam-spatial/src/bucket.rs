//! Per-chunk entity buckets.

use hashbrown::{HashMap, HashSet};
use loam_entity::{Entity, Position, Tags};

/// What a bucket remembers about one of its residents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resident {
    pub position: Position,
    pub tags: Tags,
}

/// Entities currently inside one chunk.
///
/// Members are additionally filed under each of their single tags, so a
/// tag-filtered query walks only the matching sub-collection instead of
/// filtering the whole bucket.
#[derive(Debug)]
pub struct ChunkBucket {
    members: HashMap<Entity, Resident>,
    tagged: [HashSet<Entity>; Tags::COUNT],
}

impl Default for ChunkBucket {
    fn default() -> Self {
        Self {
            members: HashMap::new(),
            tagged: std::array::from_fn(|_| HashSet::new()),
        }
    }
}

impl ChunkBucket {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or refreshes a resident. Returns `true` if it was not present.
    pub fn insert(&mut self, entity: Entity, resident: Resident) -> bool {
        match self.members.insert(entity, resident) {
            Some(previous) => {
                if previous.tags != resident.tags {
                    self.unfile(entity, previous.tags);
                    self.file(entity, resident.tags);
                }
                false
            }
            None => {
                self.file(entity, resident.tags);
                true
            }
        }
    }

    pub fn remove(&mut self, entity: Entity) -> Option<Resident> {
        let resident = self.members.remove(&entity)?;
        self.unfile(entity, resident.tags);
        Some(resident)
    }

    /// Updates the stored position of a member that stays in this chunk.
    pub fn set_position(&mut self, entity: Entity, position: Position) -> bool {
        match self.members.get_mut(&entity) {
            Some(resident) => {
                resident.position = position;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&Resident> {
        self.members.get(&entity)
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.members.contains_key(&entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.members.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &Resident)> {
        self.members.iter().map(|(&entity, resident)| (entity, resident))
    }

    /// Members filed under a single tag.
    #[must_use]
    pub fn tagged(&self, tag: Tags) -> Option<&HashSet<Entity>> {
        tag.slot().map(|slot| &self.tagged[slot])
    }

    /// Calls `visit` for every member carrying all of `required`.
    ///
    /// With a non-empty filter the smallest matching tag sub-collection is
    /// walked and the remaining flags checked per member.
    pub fn for_each_matching(&self, required: Tags, mut visit: impl FnMut(Entity, &Resident)) {
        let required = required.known();
        if required.is_empty() {
            for (&entity, resident) in &self.members {
                visit(entity, resident);
            }
            return;
        }

        let Some(narrowest) = required
            .slots()
            .min_by_key(|&slot| self.tagged[slot].len())
        else {
            return;
        };

        for entity in &self.tagged[narrowest] {
            if let Some(resident) = self.members.get(entity) {
                if resident.tags.satisfies(required) {
                    visit(*entity, resident);
                }
            }
        }
    }

    /// Whether the tag sub-collections agree with member tags.
    pub(crate) fn tag_files_consistent(&self) -> bool {
        let filed: usize = self.tagged.iter().map(HashSet::len).sum();
        let expected: usize = self
            .members
            .values()
            .map(|resident| resident.tags.slots().count())
            .sum();

        filed == expected
            && self.members.iter().all(|(entity, resident)| {
                resident
                    .tags
                    .slots()
                    .all(|slot| self.tagged[slot].contains(entity))
            })
    }

    fn file(&mut self, entity: Entity, tags: Tags) {
        for slot in tags.slots() {
            self.tagged[slot].insert(entity);
        }
    }

    fn unfile(&mut self, entity: Entity, tags: Tags) {
        for slot in tags.slots() {
            self.tagged[slot].remove(&entity);
        }
    }
}
