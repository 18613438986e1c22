//! Order dispatch: pricing plus driver selection for order records.
//!
//! [`Dispatcher`] is the one place orders get priced and matched. It mutates
//! only the [`Order`] values it is handed and returns a [`DispatchOutcome`];
//! persisting the order and notifying the driver stay with the caller.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::DispatchConfig;
use crate::directory::{DriverDirectory, DriverRecord};
use crate::error::{DispatchError, Result};
use crate::geo::{distance_km, Coordinate};
use crate::matching::{MatchResult, MatchSource, MatchingAlgorithm, NearestDriverMatching};
use crate::order::{Order, OrderStatus};
use crate::pricing::{build_pricing_policy, PricingPolicy, PricingQuote, TierCatalog};

/// Status message attached to a pending order nobody could take.
pub const NO_DRIVERS_MESSAGE: &str = "No drivers available";

/// Driver picked for an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub driver_id: String,
    pub distance_km: f64,
    pub source: MatchSource,
}

/// Result of dispatching one order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub order_id: String,
    pub quote: PricingQuote,
    /// `None` when no driver was available.
    pub assignment: Option<Assignment>,
}

pub struct Dispatcher {
    tiers: TierCatalog,
    pricing: Box<dyn PricingPolicy>,
    matcher: Box<dyn MatchingAlgorithm>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tiers", &self.tiers)
            .field("pricing", &self.pricing.name())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        tiers: TierCatalog,
        pricing: Box<dyn PricingPolicy>,
        matcher: Box<dyn MatchingAlgorithm>,
    ) -> Self {
        Self {
            tiers,
            pricing,
            matcher,
        }
    }

    /// Build from a validated configuration.
    ///
    /// `config.search_radius` is not applied here: the dispatcher matches over
    /// whatever [`DriverDirectory`] it is handed. Build the directory with
    /// [`DispatchConfig::directory`] to get the configured spatial pre-filter.
    pub fn from_config(config: &DispatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.tiers.clone(),
            build_pricing_policy(&config.pricing),
            Box::new(NearestDriverMatching::new(config.tie_break)),
        ))
    }

    pub fn tiers(&self) -> &TierCatalog {
        &self.tiers
    }

    pub fn pricing_policy(&self) -> &dyn PricingPolicy {
        self.pricing.as_ref()
    }

    /// Price a delivery between two points for the given tier.
    pub fn quote(
        &self,
        pickup: &Coordinate,
        dropoff: &Coordinate,
        tier_id: &str,
    ) -> Result<PricingQuote> {
        let distance = distance_km(pickup, dropoff)?;
        let tier = self.tiers.get(tier_id)?;
        self.pricing.quote(distance, tier)
    }

    /// Price an order and store the price and distance on it.
    pub fn quote_order(&self, order: &mut Order) -> Result<PricingQuote> {
        let quote = self.quote(&order.pickup, &order.dropoff, &order.tier)?;
        order.distance_km = Some(quote.distance_km);
        order.price = Some(quote.cost);
        Ok(quote)
    }

    /// Select a driver for a pickup from the directory.
    ///
    /// The preferred driver is looked up in the whole directory, so a spatial
    /// pre-filter never hides the driver the customer asked for.
    pub fn select_driver<'a>(
        &self,
        directory: &'a dyn DriverDirectory,
        pickup: &Coordinate,
        preferred_id: Option<&str>,
    ) -> Result<MatchResult<'a>> {
        self.select_excluding(directory, pickup, preferred_id, &HashSet::new())
    }

    fn select_excluding<'a>(
        &self,
        directory: &'a dyn DriverDirectory,
        pickup: &Coordinate,
        preferred_id: Option<&str>,
        taken: &HashSet<String>,
    ) -> Result<MatchResult<'a>> {
        let mut candidates: Vec<&'a DriverRecord> = directory
            .candidates(pickup)?
            .into_iter()
            .filter(|driver| !taken.contains(&driver.id))
            .collect();
        if let Some(id) = preferred_id {
            let listed = candidates.iter().any(|driver| driver.id == id);
            if !listed && !taken.contains(id) {
                if let Some(driver) = directory.get(id) {
                    candidates.insert(0, driver);
                }
            }
        }
        self.matcher.select_driver(pickup, &candidates, preferred_id)
    }

    /// Price an unassigned pending order and match it to a driver.
    ///
    /// On a match the driver is recorded and the order stays pending until the
    /// driver accepts. Without one the order keeps its pending status with
    /// [`NO_DRIVERS_MESSAGE`]. The order is left untouched on error.
    pub fn assign(
        &self,
        order: &mut Order,
        directory: &dyn DriverDirectory,
    ) -> Result<DispatchOutcome> {
        self.assign_excluding(order, directory, &HashSet::new())
    }

    fn assign_excluding(
        &self,
        order: &mut Order,
        directory: &dyn DriverDirectory,
        taken: &HashSet<String>,
    ) -> Result<DispatchOutcome> {
        if order.status() != OrderStatus::Pending {
            return Err(DispatchError::IllegalTransition {
                from: order.status(),
                to: OrderStatus::Pending,
            });
        }
        if order.is_assigned() {
            return Err(DispatchError::AlreadyAssigned {
                order_id: order.id.clone(),
            });
        }

        let quote = self.quote(&order.pickup, &order.dropoff, &order.tier)?;
        let assignment = self
            .select_excluding(
                directory,
                &order.pickup,
                order.preferred_driver_id.as_deref(),
                taken,
            )?
            .map(|found| Assignment {
                driver_id: found.driver.id.clone(),
                distance_km: found.distance_km,
                source: found.source,
            });

        order.distance_km = Some(quote.distance_km);
        order.price = Some(quote.cost);
        match &assignment {
            Some(assignment) => {
                order.assign_driver(&assignment.driver_id, assignment.distance_km)?;
                tracing::info!(
                    order = %order.id,
                    driver = %assignment.driver_id,
                    pickup_km = assignment.distance_km,
                    source = ?assignment.source,
                    cost = quote.cost,
                    "order assigned"
                );
            }
            None => {
                order.note_pending(NO_DRIVERS_MESSAGE)?;
                tracing::info!(order = %order.id, cost = quote.cost, "no driver available");
            }
        }

        Ok(DispatchOutcome {
            order_id: order.id.clone(),
            quote,
            assignment,
        })
    }

    /// Dispatch every unassigned pending order, in slice order.
    ///
    /// Drivers already holding an active order in `orders`, or picked earlier in
    /// this pass, are not offered again. Each processed order gets its own
    /// result; one failure does not stop the rest.
    pub fn assign_pending(
        &self,
        orders: &mut [Order],
        directory: &dyn DriverDirectory,
    ) -> Vec<(String, Result<DispatchOutcome>)> {
        let mut taken: HashSet<String> = orders
            .iter()
            .filter(|order| !order.status().is_terminal())
            .filter_map(|order| order.driver_id.clone())
            .collect();

        let mut results = Vec::new();
        for order in orders.iter_mut() {
            if order.status() != OrderStatus::Pending || order.is_assigned() {
                continue;
            }
            let result = self.assign_excluding(order, directory, &taken);
            if let Ok(DispatchOutcome {
                assignment: Some(assignment),
                ..
            }) = &result
            {
                taken.insert(assignment.driver_id.clone());
            }
            results.push((order.id.clone(), result));
        }
        tracing::debug!(
            processed = results.len(),
            busy = taken.len(),
            "pending dispatch pass"
        );
        results
    }
}
