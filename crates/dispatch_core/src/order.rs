//! Order records and the status state machine guarding them.
//!
//! Every status write goes through [`Order::transition_to`], which checks the
//! transition table in [`OrderStatus::can_transition_to`] before mutating.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InTransit,
    PickedUp,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending,
        Self::Accepted,
        Self::InTransit,
        Self::PickedUp,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::InTransit => "in_transit",
            Self::PickedUp => "picked_up",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Transition table. `Pending -> Pending` is allowed so a status message
    /// can be attached to an unassigned order.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, Accepted)
                | (Pending, Cancelled)
                | (Accepted, InTransit)
                | (Accepted, Cancelled)
                | (InTransit, PickedUp)
                | (PickedUp, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownStatus(s.to_string()))
    }
}

/// A delivery request as persisted by the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
    /// Delivery type tier id, e.g. `standard` or `urgent`.
    pub tier: String,
    #[serde(default)]
    pub preferred_driver_id: Option<String>,
    #[serde(default)]
    pub driver_id: Option<String>,
    /// Pickup distance of the assigned driver.
    #[serde(default)]
    pub driver_distance_km: Option<f64>,
    /// Pickup to drop-off distance the price was computed from.
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    status: OrderStatus,
    #[serde(default)]
    pub status_message: Option<String>,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        pickup: Coordinate,
        dropoff: Coordinate,
        tier: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pickup,
            dropoff,
            tier: tier.into(),
            preferred_driver_id: None,
            driver_id: None,
            driver_distance_km: None,
            distance_km: None,
            price: None,
            status: OrderStatus::Pending,
            status_message: None,
        }
    }

    pub fn with_preferred_driver(mut self, driver_id: impl Into<String>) -> Self {
        self.preferred_driver_id = Some(driver_id.into());
        self
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_assigned(&self) -> bool {
        self.driver_id.is_some()
    }

    /// Move to `next` if the transition table allows it. Leaving a status
    /// clears its message.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            tracing::warn!(
                order = %self.id,
                from = %self.status,
                to = %next,
                "rejected illegal status transition"
            );
            return Err(DispatchError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        if next != self.status {
            self.status_message = None;
        }
        self.status = next;
        Ok(())
    }

    /// Attach an explanatory message while staying pending.
    pub fn note_pending(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition_to(OrderStatus::Pending)?;
        self.status_message = Some(message.into());
        Ok(())
    }

    /// Record the driver chosen for a pending order. The order stays pending
    /// until that driver accepts.
    pub fn assign_driver(&mut self, driver_id: &str, driver_distance_km: f64) -> Result<()> {
        if self.status != OrderStatus::Pending {
            return Err(DispatchError::IllegalTransition {
                from: self.status,
                to: OrderStatus::Pending,
            });
        }
        if self.driver_id.as_deref().is_some_and(|current| current != driver_id) {
            return Err(DispatchError::AlreadyAssigned {
                order_id: self.id.clone(),
            });
        }
        self.driver_id = Some(driver_id.to_string());
        self.driver_distance_km = Some(driver_distance_km);
        self.status_message = None;
        Ok(())
    }

    /// Driver accepts the order. Fails if another driver is assigned.
    pub fn accept(&mut self, driver_id: &str) -> Result<()> {
        if self.driver_id.as_deref().is_some_and(|current| current != driver_id) {
            return Err(DispatchError::AlreadyAssigned {
                order_id: self.id.clone(),
            });
        }
        self.transition_to(OrderStatus::Accepted)?;
        self.driver_id = Some(driver_id.to_string());
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.transition_to(OrderStatus::Cancelled)
    }
}
