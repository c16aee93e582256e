//! Capability tags.

use bitflags::bitflags;

bitflags! {
    /// Capabilities an entity advertises to spatial queries.
    ///
    /// A query asking for `required` tags matches entities whose tag set
    /// contains every flag of `required`; an empty set matches everything.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Tags: u16 {
        /// is-agent
        const AGENT = 1 << 0;
        /// has-resource
        const RESOURCE = 1 << 1;
        /// has-plant
        const PLANT = 1 << 2;
        const ANIMAL = 1 << 3;
        const BUILDING = 1 << 4;
        /// Radiates warmth for the temperature system.
        const HEAT_SOURCE = 1 << 5;
    }
}

impl Tags {
    /// Number of single-flag slots, one per declared capability.
    pub const COUNT: usize = 6;

    /// Drops bits that name no declared capability.
    ///
    /// `from_bits_retain` can build sets with such bits; they take part in no
    /// matching.
    #[inline]
    #[must_use]
    pub const fn known(self) -> Self {
        Self::from_bits_truncate(self.bits())
    }

    /// Slot of a single declared flag, for per-tag sub-indices.
    ///
    /// Returns `None` for empty, multi-flag and undeclared sets, so a
    /// returned slot is always below [`Tags::COUNT`].
    #[must_use]
    pub const fn slot(self) -> Option<usize> {
        let bits = self.bits();
        if bits.count_ones() == 1 && bits & Self::all().bits() == bits {
            Some(bits.trailing_zeros() as usize)
        } else {
            None
        }
    }

    /// Slots of every declared flag in the set.
    pub fn slots(self) -> impl Iterator<Item = usize> {
        self.known().iter().filter_map(Self::slot)
    }

    /// Whether an entity tagged `self` satisfies a `required` filter.
    /// Undeclared bits on either side are ignored.
    #[inline]
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        self.known().contains(required.known())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_declared_flag_has_a_distinct_slot() {
        let slots: Vec<_> = Tags::all().iter().filter_map(Tags::slot).collect();

        assert_eq!(slots.len(), Tags::COUNT);
        assert!(slots.iter().all(|&slot| slot < Tags::COUNT));
        for (i, slot) in slots.iter().enumerate() {
            assert!(!slots[i + 1..].contains(slot));
        }
    }

    #[test]
    fn combined_sets_have_no_slot() {
        assert_eq!(Tags::empty().slot(), None);
        assert_eq!((Tags::AGENT | Tags::ANIMAL).slot(), None);
    }

    #[test]
    fn undeclared_bits_have_no_slot_and_never_match() {
        let stray = Tags::from_bits_retain(1 << 9);

        assert_eq!(stray.slot(), None);
        assert_eq!(stray.known(), Tags::empty());
        assert_eq!((stray | Tags::PLANT).slots().collect::<Vec<_>>(), vec![2]);
        assert!(Tags::AGENT.satisfies(stray));
        assert!((stray | Tags::AGENT).satisfies(Tags::AGENT));
        assert!(!stray.satisfies(Tags::AGENT));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Tags::empty().satisfies(Tags::empty()));
        assert!(Tags::PLANT.satisfies(Tags::empty()));
        assert!((Tags::PLANT | Tags::RESOURCE).satisfies(Tags::RESOURCE));
        assert!(!Tags::AGENT.satisfies(Tags::RESOURCE));
    }
}
