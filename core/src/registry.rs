//! Gauge registry seam between governance and the voting engine

use crate::error::Result;
use crate::shared::Shared;
use crate::GaugeId;

/// Creates and looks up reward gauges.
///
/// The governance engine materializes passed proposals through this trait
/// and never touches the voting engine's tables directly.
pub trait GaugeRegistry {
    /// Create an active gauge for `pool_id`
    fn create_gauge(&mut self, pool_id: &str, name: &str, now: u64) -> Result<GaugeId>;

    /// The active gauge for `pool_id`, if any
    fn active_gauge_for_pool(&self, pool_id: &str) -> Option<GaugeId>;
}

impl<T: GaugeRegistry> GaugeRegistry for Shared<T> {
    fn create_gauge(&mut self, pool_id: &str, name: &str, now: u64) -> Result<GaugeId> {
        self.write().create_gauge(pool_id, name, now)
    }

    fn active_gauge_for_pool(&self, pool_id: &str) -> Option<GaugeId> {
        self.read().active_gauge_for_pool(pool_id)
    }
}
