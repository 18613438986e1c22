use crate::directory::DriverRecord;
use crate::error::Result;
use crate::geo::{distance_km, Coordinate};

use super::algorithm::MatchingAlgorithm;
use super::types::{DriverMatch, MatchResult, MatchSource, TieBreak};

/// Preferred driver first, otherwise the closest dispatchable driver.
///
/// # Algorithm Behavior
///
/// 1. If `preferred_id` names a candidate that is online with a location, it is
///    returned straight away; no other candidate is inspected.
/// 2. Otherwise every online candidate with a location is scored by Haversine
///    distance to the pickup.
/// 3. The smallest distance wins; equal distances are resolved by [`TieBreak`].
///
/// An unusable preferred driver (offline, no location, not in the snapshot) is
/// not an error: matching falls through to step 2.
///
/// Time complexity: O(n) in the number of candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestDriverMatching {
    pub tie_break: TieBreak,
}

impl NearestDriverMatching {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    fn preferred<'a>(
        &self,
        pickup: &Coordinate,
        candidates: &[&'a DriverRecord],
        preferred_id: &str,
    ) -> Result<MatchResult<'a>> {
        let Some(driver) = candidates.iter().copied().find(|d| d.id == preferred_id) else {
            tracing::debug!(preferred_id, "preferred driver not in snapshot");
            return Ok(None);
        };
        let location = match (&driver.current_location, driver.is_online) {
            (Some(location), true) => location,
            _ => {
                tracing::debug!(
                    preferred_id,
                    is_online = driver.is_online,
                    has_location = driver.current_location.is_some(),
                    "preferred driver unavailable, falling back to nearest"
                );
                return Ok(None);
            }
        };
        Ok(Some(DriverMatch {
            driver,
            distance_km: distance_km(pickup, location)?,
            source: MatchSource::Preferred,
        }))
    }
}

impl MatchingAlgorithm for NearestDriverMatching {
    fn select_driver<'a>(
        &self,
        pickup: &Coordinate,
        candidates: &[&'a DriverRecord],
        preferred_id: Option<&str>,
    ) -> Result<MatchResult<'a>> {
        pickup.validate()?;

        if let Some(preferred_id) = preferred_id {
            if let Some(found) = self.preferred(pickup, candidates, preferred_id)? {
                tracing::debug!(
                    driver = %found.driver.id,
                    distance_km = found.distance_km,
                    "preferred driver matched"
                );
                return Ok(Some(found));
            }
        }

        let mut best: Option<(&'a DriverRecord, f64)> = None;
        let mut eligible = 0usize;
        for driver in candidates.iter().copied().filter(|d| d.is_online) {
            let Some(location) = &driver.current_location else {
                continue;
            };
            eligible += 1;
            let distance = distance_km(pickup, location)?;
            best = match best {
                None => Some((driver, distance)),
                Some((incumbent, best_distance))
                    if distance < best_distance
                        || (distance == best_distance
                            && self.tie_break.prefers(driver, incumbent)) =>
                {
                    Some((driver, distance))
                }
                keep => keep,
            };
        }

        tracing::debug!(
            candidates = candidates.len(),
            eligible,
            matched = ?best.map(|(d, _)| d.id.as_str()),
            "nearest driver scan"
        );

        Ok(best.map(|(driver, distance_km)| DriverMatch {
            driver,
            distance_km,
            source: MatchSource::Nearest,
        }))
    }
}
