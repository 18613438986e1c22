//! Delivery pricing: tier catalog, quotes and the pluggable pricing policies.
//!
//! Two policies exist, selectable via [`PricingPolicyKind`]:
//!
//! - **`TieredPricingPolicy`**: the first kilometre is covered by the tier's base
//!   price; every further kilometre adds one more base price.
//! - **`LinearPricingPolicy`**: flat `base_fee + rate_per_km * distance`,
//!   independent of the tier.
//!
//! Which of the two is authoritative is a product decision, so both are kept
//! and the caller picks one through configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::geo::round_to;

/// Default flat fee for the linear policy.
pub const DEFAULT_LINEAR_BASE_FEE: f64 = 5.0;

/// Default per-kilometre rate for the linear policy.
pub const DEFAULT_LINEAR_RATE_PER_KM: f64 = 2.0;

/// Distance covered by the tier base price before the surcharge starts.
pub const INCLUDED_DISTANCE_KM: f64 = 1.0;

/// Decimal places kept on a quoted cost.
pub const COST_DECIMALS: u32 = 2;

/// A named delivery speed/price class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryTypeTier {
    pub id: String,
    pub base_price: f64,
}

impl DeliveryTypeTier {
    pub fn new(id: impl Into<String>, base_price: f64) -> Self {
        Self {
            id: id.into(),
            base_price,
        }
    }

    pub fn standard() -> Self {
        Self::new("standard", 10.0)
    }

    pub fn urgent() -> Self {
        Self::new("urgent", 15.0)
    }
}

/// Static set of delivery tiers, looked up by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierCatalog {
    tiers: Vec<DeliveryTypeTier>,
}

impl Default for TierCatalog {
    fn default() -> Self {
        Self {
            tiers: vec![DeliveryTypeTier::standard(), DeliveryTypeTier::urgent()],
        }
    }
}

impl TierCatalog {
    pub fn new(tiers: Vec<DeliveryTypeTier>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[DeliveryTypeTier] {
        &self.tiers
    }

    /// Resolve a tier by id.
    pub fn get(&self, id: &str) -> Result<&DeliveryTypeTier> {
        self.tiers.iter().find(|tier| tier.id == id).ok_or_else(|| {
            tracing::warn!(tier = id, "unknown delivery type tier");
            DispatchError::UnknownTier(id.to_string())
        })
    }

    /// Reject empty or duplicate ids and base prices that are negative or not
    /// whole cents.
    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(DispatchError::InvalidConfig(
                "tier catalog cannot be empty".to_string(),
            ));
        }
        for (index, tier) in self.tiers.iter().enumerate() {
            if tier.id.trim().is_empty() {
                return Err(DispatchError::InvalidConfig(
                    "tier ids must be non-empty strings".to_string(),
                ));
            }
            check_price(&format!("tier '{}' base_price", tier.id), tier.base_price)?;
            if self.tiers[..index].iter().any(|other| other.id == tier.id) {
                return Err(DispatchError::InvalidConfig(format!(
                    "duplicate tier id '{}'",
                    tier.id
                )));
            }
        }
        Ok(())
    }
}

/// Price for one delivery. Computed fresh per request, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingQuote {
    /// Unrounded distance the quote was computed from.
    pub distance_km: f64,
    /// Cost rounded to [`COST_DECIMALS`] places.
    pub cost: f64,
}

/// Trait for pricing backends. Implementations must be `Send + Sync` so one
/// policy can be shared by every caller.
pub trait PricingPolicy: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs and CLI output.
    fn name(&self) -> &'static str;

    /// Price a delivery of `distance_km` in the given tier.
    ///
    /// Fails with [`DispatchError::InvalidDistance`] for negative or
    /// non-finite distances, and with [`DispatchError::InvalidConfig`] when the
    /// base price is not a whole number of cents.
    fn quote(&self, distance_km: f64, tier: &DeliveryTypeTier) -> Result<PricingQuote>;
}

/// A price must be non-negative and already on the cent grid, otherwise
/// rounding the quoted cost could take it below the price itself.
fn check_price(label: &str, price: f64) -> Result<()> {
    if !(price.is_finite() && price >= 0.0) {
        return Err(DispatchError::InvalidConfig(format!(
            "{label} must be non-negative, got {price}"
        )));
    }
    if round_to(price, COST_DECIMALS) != price {
        return Err(DispatchError::InvalidConfig(format!(
            "{label} must be a whole number of cents, got {price}"
        )));
    }
    Ok(())
}

fn check_distance(distance_km: f64) -> Result<()> {
    if distance_km.is_finite() && distance_km >= 0.0 {
        Ok(())
    } else {
        Err(DispatchError::InvalidDistance(distance_km))
    }
}

/// Base price covers the first kilometre; each further kilometre adds one base
/// price, pro rata.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredPricingPolicy;

impl PricingPolicy for TieredPricingPolicy {
    fn name(&self) -> &'static str {
        "tiered"
    }

    fn quote(&self, distance_km: f64, tier: &DeliveryTypeTier) -> Result<PricingQuote> {
        check_distance(distance_km)?;
        check_price(&format!("tier '{}' base_price", tier.id), tier.base_price)?;
        let cost = if distance_km <= INCLUDED_DISTANCE_KM {
            tier.base_price
        } else {
            tier.base_price + tier.base_price * (distance_km - INCLUDED_DISTANCE_KM)
        };
        Ok(PricingQuote {
            distance_km,
            cost: round_to(cost, COST_DECIMALS),
        })
    }
}

/// Flat fee plus a fixed per-kilometre rate; ignores the tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearPricingPolicy {
    pub base_fee: f64,
    pub rate_per_km: f64,
}

impl Default for LinearPricingPolicy {
    fn default() -> Self {
        Self {
            base_fee: DEFAULT_LINEAR_BASE_FEE,
            rate_per_km: DEFAULT_LINEAR_RATE_PER_KM,
        }
    }
}

impl PricingPolicy for LinearPricingPolicy {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn quote(&self, distance_km: f64, _tier: &DeliveryTypeTier) -> Result<PricingQuote> {
        check_distance(distance_km)?;
        check_price("linear base_fee", self.base_fee)?;
        let cost = self.base_fee + self.rate_per_km * distance_km;
        Ok(PricingQuote {
            distance_km,
            cost: round_to(cost, COST_DECIMALS),
        })
    }
}

fn default_linear_base_fee() -> f64 {
    DEFAULT_LINEAR_BASE_FEE
}

fn default_linear_rate_per_km() -> f64 {
    DEFAULT_LINEAR_RATE_PER_KM
}

/// Which pricing policy to use. Serialized into [`crate::config::DispatchConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingPolicyKind {
    #[default]
    Tiered,
    Linear {
        #[serde(default = "default_linear_base_fee")]
        base_fee: f64,
        #[serde(default = "default_linear_rate_per_km")]
        rate_per_km: f64,
    },
}

impl PricingPolicyKind {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Tiered => Ok(()),
            Self::Linear {
                base_fee,
                rate_per_km,
            } => {
                check_price("linear base_fee", base_fee)?;
                if !(rate_per_km.is_finite() && rate_per_km >= 0.0) {
                    return Err(DispatchError::InvalidConfig(format!(
                        "linear rate_per_km must be non-negative, got {rate_per_km}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Construct a boxed pricing policy from its kind.
pub fn build_pricing_policy(kind: &PricingPolicyKind) -> Box<dyn PricingPolicy> {
    match *kind {
        PricingPolicyKind::Tiered => Box::new(TieredPricingPolicy),
        PricingPolicyKind::Linear {
            base_fee,
            rate_per_km,
        } => Box::new(LinearPricingPolicy {
            base_fee,
            rate_per_km,
        }),
    }
}
