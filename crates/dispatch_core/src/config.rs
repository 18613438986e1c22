use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::directory::{
    check_search_radius, CellIndexedDirectory, DriverDirectory, DriverRecord, SnapshotDirectory,
};
use crate::error::{DispatchError, Result};
use crate::matching::TieBreak;
use crate::pricing::{PricingPolicyKind, TierCatalog};

/// Dispatch configuration. Every field has a default, so `{}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Delivery type tiers and their base prices.
    pub tiers: TierCatalog,
    /// Pricing policy applied to every quote.
    pub pricing: PricingPolicyKind,
    /// How the matcher resolves candidates at equal distance.
    pub tie_break: TieBreak,
    /// Max H3 grid distance (cells) for candidate drivers, capped at
    /// [`crate::directory::MAX_SEARCH_RADIUS`]. `None` = no spatial pre-filter.
    pub search_radius: Option<u32>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tiers: TierCatalog::default(),
            pricing: PricingPolicyKind::default(),
            tie_break: TieBreak::default(),
            search_radius: None,
        }
    }
}

impl DispatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| DispatchError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            DispatchError::InvalidConfig(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.tiers.validate()?;
        self.pricing.validate()?;
        check_search_radius(self.search_radius)
    }

    /// Driver directory honouring `search_radius`: H3-indexed when a radius
    /// is set, a plain snapshot otherwise.
    pub fn directory(&self, drivers: Vec<DriverRecord>) -> Result<Box<dyn DriverDirectory>> {
        Ok(match self.search_radius {
            Some(radius) => Box::new(CellIndexedDirectory::new(drivers, Some(radius))?),
            None => Box::new(SnapshotDirectory::new(drivers)),
        })
    }

    pub fn with_pricing(mut self, pricing: PricingPolicyKind) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_search_radius(mut self, search_radius: Option<u32>) -> Self {
        self.search_radius = search_radius;
        self
    }
}
