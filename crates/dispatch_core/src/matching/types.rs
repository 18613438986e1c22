use serde::{Deserialize, Serialize};

use crate::directory::DriverRecord;

/// Why a driver was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// The caller named this driver and it was dispatchable.
    Preferred,
    /// Closest dispatchable driver to the pickup.
    Nearest,
}

/// A selected driver, borrowed from the snapshot it was chosen from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverMatch<'a> {
    pub driver: &'a DriverRecord,
    /// Unrounded pickup distance.
    pub distance_km: f64,
    pub source: MatchSource,
}

/// Outcome of one matching call: `None` means no dispatchable driver.
pub type MatchResult<'a> = Option<DriverMatch<'a>>;

/// Rule for choosing between candidates at exactly the same distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First minimum in candidate order wins.
    #[default]
    InputOrder,
    /// Lexicographically smallest driver id wins, independent of order.
    LowestDriverId,
}

impl TieBreak {
    /// Whether `challenger` should replace `incumbent` at equal distance.
    pub fn prefers(self, challenger: &DriverRecord, incumbent: &DriverRecord) -> bool {
        match self {
            Self::InputOrder => false,
            Self::LowestDriverId => challenger.id < incumbent.id,
        }
    }
}
