//! Driver matching and delivery pricing for the DeliverEase dispatch flow.
//!
//! Everything here is synchronous and pure over caller-supplied snapshots:
//! no I/O, no shared mutable state, safe to call from any number of threads.

pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod matching;
pub mod order;
pub mod pricing;

pub use config::DispatchConfig;
pub use directory::{
    CellIndexedDirectory, DriverDirectory, DriverRecord, SnapshotDirectory, MAX_SEARCH_RADIUS,
};
pub use dispatch::{Assignment, DispatchOutcome, Dispatcher, NO_DRIVERS_MESSAGE};
pub use error::{DispatchError, Result};
pub use geo::{distance_km, round_to, Coordinate};
pub use matching::{select_driver, DriverMatch, MatchResult, MatchSource, TieBreak};
pub use order::{Order, OrderStatus};
pub use pricing::{
    DeliveryTypeTier, LinearPricingPolicy, PricingPolicy, PricingPolicyKind, PricingQuote,
    TierCatalog, TieredPricingPolicy,
};
