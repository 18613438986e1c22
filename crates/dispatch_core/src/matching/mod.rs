pub mod algorithm;
pub mod nearest;
pub mod types;

pub use algorithm::MatchingAlgorithm;
pub use nearest::NearestDriverMatching;
pub use types::{DriverMatch, MatchResult, MatchSource, TieBreak};

use crate::directory::DriverRecord;
use crate::error::Result;
use crate::geo::Coordinate;

/// Select a driver from an owned snapshot with the default nearest-driver rules.
pub fn select_driver<'a>(
    pickup: &Coordinate,
    candidates: &'a [DriverRecord],
    preferred_id: Option<&str>,
) -> Result<MatchResult<'a>> {
    let refs: Vec<&DriverRecord> = candidates.iter().collect();
    NearestDriverMatching::default().select_driver(pickup, &refs, preferred_id)
}
