use dispatch_core::{Coordinate, DriverRecord, Order};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SEED: u64 = 42;

pub fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).expect("valid coordinate")
}

/// Lower Manhattan.
pub fn new_york() -> Coordinate {
    coord(40.7128, -74.0060)
}

/// Times Square, roughly 5.2 km from [`new_york`].
pub fn midtown() -> Coordinate {
    coord(40.7580, -73.9855)
}

pub fn los_angeles() -> Coordinate {
    coord(34.0522, -118.2437)
}

pub fn online_driver(id: &str, at: Coordinate) -> DriverRecord {
    DriverRecord::new(id).online().at(at)
}

pub fn order(id: &str, pickup: Coordinate, tier: &str) -> Order {
    Order::new(id, pickup, midtown(), tier)
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

/// Uniform coordinate over the whole valid range.
pub fn random_coordinate(rng: &mut StdRng) -> Coordinate {
    coord(rng.gen_range(-90.0..=90.0), rng.gen_range(-180.0..=180.0))
}

/// Point due north of `origin` at roughly `km` kilometres.
pub fn north_of(origin: Coordinate, km: f64) -> Coordinate {
    let degrees = (km / dispatch_core::geo::EARTH_RADIUS_KM).to_degrees();
    coord(origin.latitude + degrees, origin.longitude)
}
