//! Common wiring surface for spatial consumers.

use loam_spatial::SharedIndex;

use crate::Proximity;

/// A system that issues spatial queries through a [`Proximity`].
///
/// World setup calls [`SpatialConsumer::wire`] once per consumer. Skipping
/// that call is a supported configuration, not an error.
pub trait SpatialConsumer {
    fn proximity(&self) -> &Proximity;

    fn proximity_mut(&mut self) -> &mut Proximity;

    fn wire(&mut self, index: SharedIndex) {
        self.proximity_mut().wire(index);
    }

    fn unwire(&mut self) {
        self.proximity_mut().unwire();
    }

    fn is_wired(&self) -> bool {
        self.proximity().is_wired()
    }
}
