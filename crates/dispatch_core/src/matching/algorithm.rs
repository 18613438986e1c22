use crate::directory::DriverRecord;
use crate::error::Result;
use crate::geo::Coordinate;

use super::types::MatchResult;

/// Trait for driver selection strategies.
///
/// Implementations are pure: they read the borrowed candidates and never
/// mutate or retain them, so one instance can serve concurrent callers.
pub trait MatchingAlgorithm: Send + Sync {
    /// Select a driver for a pickup.
    ///
    /// # Arguments
    ///
    /// * `pickup` - Pickup coordinate; validated before anything else
    /// * `candidates` - Snapshot of drivers to consider, in a stable order
    /// * `preferred_id` - Driver the customer asked for, if any
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no candidate is online with a known location.
    /// `Err(InvalidCoordinate)` when the pickup or an inspected driver location
    /// is out of range.
    fn select_driver<'a>(
        &self,
        pickup: &Coordinate,
        candidates: &[&'a DriverRecord],
        preferred_id: Option<&str>,
    ) -> Result<MatchResult<'a>>;
}
