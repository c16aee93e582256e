//! Tile values.

/// Surface type of a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// No terrain. What an ungenerated chunk reads as.
    #[default]
    Void,
    Water,
    Sand,
    Grass,
    Forest,
    Rock,
}

impl TileKind {
    #[must_use]
    pub const fn is_water(self) -> bool {
        matches!(self, Self::Water)
    }

    /// Whether construction is allowed on this surface.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(self, Self::Sand | Self::Grass | Self::Forest)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    pub kind: TileKind,
    pub elevation: u8,
}

impl Tile {
    pub const VOID: Self = Self::new(TileKind::Void, 0);

    #[must_use]
    pub const fn new(kind: TileKind, elevation: u8) -> Self {
        Self { kind, elevation }
    }

    #[must_use]
    pub const fn is_water(self) -> bool {
        self.kind.is_water()
    }
}
