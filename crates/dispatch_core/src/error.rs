use thiserror::Error;

use crate::order::OrderStatus;

/// Failures raised by the dispatch core.
///
/// All of these are caller-input problems: retrying with the same input yields
/// the same error. "No driver available" is not an error and is reported as
/// `Ok(None)` by the matcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("cannot parse coordinate '{0}', expected \"lat,lon\"")]
    UnparsableCoordinate(String),
    #[error("invalid distance: {0} km (must be a non-negative number)")]
    InvalidDistance(f64),
    #[error("unknown delivery type tier: {0}")]
    UnknownTier(String),
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("unknown order status: {0}")]
    UnknownStatus(String),
    #[error("order {order_id} already has an assigned driver")]
    AlreadyAssigned { order_id: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
