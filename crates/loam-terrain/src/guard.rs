//! Generation guard.

use std::cell::Cell;

use loam_entity::Position;

use crate::{ChunkStore, Tile};

/// Counts of guarded reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardStats {
    /// Reads answered from a generated chunk.
    pub served: u64,
    /// Reads that hit an ungenerated chunk and returned `None`.
    pub skipped: u64,
}

/// Integer tile under `position`, or `None` when the position is
/// non-finite or its tile lies outside the `i32` tile range. Such a tile
/// belongs to no chunk and can never be generated.
pub fn tile_coords(position: Position) -> Option<(i32, i32)> {
    if !position.is_finite() {
        return None;
    }
    let (x, y) = position.tile();
    Some((i32::try_from(x).ok()?, i32::try_from(y).ok()?))
}

/// Tile reads for hot loops.
///
/// Checks the covering chunk's `generated` flag first and answers `None`
/// when it is not set, so a read can never cost a chunk generation. Callers
/// treat `None` as "no information this tick", not as an error.
#[derive(Debug)]
pub struct GenerationGuard<'a, S: ChunkStore + ?Sized> {
    store: &'a S,
    stats: Cell<GuardStats>,
}

impl<'a, S: ChunkStore + ?Sized> GenerationGuard<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
            stats: Cell::new(GuardStats {
                served: 0,
                skipped: 0,
            }),
        }
    }

    /// Tile at integer world coordinates if its chunk is generated.
    pub fn tile_if_generated(&self, x: i32, y: i32) -> Option<Tile> {
        let key = self.store.chunk_size().key_of_tile(x, y);
        let mut stats = self.stats.get();

        let tile = if self.store.chunk_state_at(key).generated {
            stats.served += 1;
            Some(self.store.tile_at(x, y))
        } else {
            stats.skipped += 1;
            None
        };

        self.stats.set(stats);
        tile
    }

    /// Tile under a world position. `None` also for positions outside the
    /// tile coordinate range.
    pub fn tile_at_position(&self, position: Position) -> Option<Tile> {
        let (x, y) = tile_coords(position)?;
        self.tile_if_generated(x, y)
    }

    pub fn stats(&self) -> GuardStats {
        self.stats.get()
    }
}
