mod support;

use dispatch_core::matching::{MatchingAlgorithm, NearestDriverMatching};
use dispatch_core::{
    distance_km, select_driver, DeliveryTypeTier, DriverRecord, MatchSource, PricingPolicy,
    TieredPricingPolicy,
};
use rand::Rng;

use support::fixtures::{
    coord, los_angeles, midtown, new_york, north_of, online_driver, random_coordinate, rng,
};

const SAMPLES: usize = 500;

#[test]
fn distance_is_symmetric() {
    let mut rng = rng();
    for _ in 0..SAMPLES {
        let a = random_coordinate(&mut rng);
        let b = random_coordinate(&mut rng);
        let ab = distance_km(&a, &b).expect("distance");
        let ba = distance_km(&b, &a).expect("distance");
        assert!((ab - ba).abs() < 1e-9, "{a} {b}: {ab} vs {ba}");
    }
}

#[test]
fn distance_to_self_is_zero() {
    let mut rng = rng();
    for _ in 0..SAMPLES {
        let a = random_coordinate(&mut rng);
        assert!(distance_km(&a, &a).expect("distance").abs() < 1e-9);
    }
}

#[test]
fn distance_obeys_triangle_inequality() {
    let mut rng = rng();
    for _ in 0..SAMPLES {
        let a = random_coordinate(&mut rng);
        let b = random_coordinate(&mut rng);
        let c = random_coordinate(&mut rng);
        let ac = distance_km(&a, &c).expect("distance");
        let ab = distance_km(&a, &b).expect("distance");
        let bc = distance_km(&b, &c).expect("distance");
        assert!(ac <= ab + bc + 1e-3, "{a} {b} {c}");
    }
}

#[test]
fn tiered_pricing_is_monotonic_with_base_floor() {
    let mut rng = rng();
    let policy = TieredPricingPolicy;
    for tier in [DeliveryTypeTier::standard(), DeliveryTypeTier::urgent()] {
        let mut distances: Vec<f64> = (0..SAMPLES).map(|_| rng.gen_range(0.0..50.0)).collect();
        distances.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
        let mut previous = f64::MIN;
        for d in distances {
            let quote = policy.quote(d, &tier).expect("quote");
            assert!(quote.cost >= tier.base_price);
            assert!(quote.cost >= previous, "cost dropped at {d} km");
            if d <= 1.0 {
                assert_eq!(quote.cost, tier.base_price);
            }
            previous = quote.cost;
        }
    }
}

#[test]
fn preferred_driver_wins_regardless_of_distance() {
    let mut rng = rng();
    let pickup = new_york();
    for _ in 0..50 {
        let drivers: Vec<DriverRecord> = (0..10)
            .map(|i| online_driver(&format!("d{i}"), random_coordinate(&mut rng)))
            .collect();
        let preferred = format!("d{}", rng.gen_range(0..10));
        let found = select_driver(&pickup, &drivers, Some(preferred.as_str()))
            .expect("match")
            .expect("some driver");
        assert_eq!(found.driver.id, preferred);
        assert_eq!(found.source, MatchSource::Preferred);
    }
}

#[test]
fn empty_or_offline_snapshot_has_no_match() {
    let pickup = new_york();
    assert!(select_driver(&pickup, &[], None).expect("match").is_none());

    let offline = vec![
        DriverRecord::new("a").at(midtown()),
        DriverRecord::new("b").at(los_angeles()),
    ];
    assert!(select_driver(&pickup, &offline, None).expect("match").is_none());
}

#[test]
fn closest_of_one_five_and_ten_km_is_chosen() {
    let pickup = new_york();
    let drivers = vec![
        online_driver("ten", north_of(pickup, 10.0)),
        online_driver("one", north_of(pickup, 1.0)),
        online_driver("five", north_of(pickup, 5.0)),
    ];
    let found = select_driver(&pickup, &drivers, None)
        .expect("match")
        .expect("some driver");
    assert_eq!(found.driver.id, "one");
    assert!((found.distance_km - 1.0).abs() < 1e-6);
}

#[test]
fn matcher_result_is_nearest_over_random_snapshots() {
    let mut rng = rng();
    let matcher = NearestDriverMatching::default();
    for _ in 0..100 {
        let pickup = random_coordinate(&mut rng);
        let drivers: Vec<DriverRecord> = (0..20)
            .map(|i| {
                let driver = DriverRecord::new(format!("d{i}")).at(random_coordinate(&mut rng));
                if rng.gen_bool(0.6) {
                    driver.online()
                } else {
                    driver
                }
            })
            .collect();
        let refs: Vec<&DriverRecord> = drivers.iter().collect();
        let result = matcher.select_driver(&pickup, &refs, None).expect("match");

        let expected = drivers
            .iter()
            .filter(|d| d.is_dispatchable())
            .map(|d| distance_km(&pickup, &d.current_location.expect("location")).expect("km"))
            .fold(None, |best: Option<f64>, d| Some(best.map_or(d, |b| b.min(d))));
        match (result, expected) {
            (Some(found), Some(min)) => {
                assert!(found.driver.is_dispatchable());
                assert_eq!(found.distance_km, min);
            }
            (None, None) => {}
            (found, min) => panic!("mismatch: {found:?} vs {min:?}"),
        }
    }
}

#[test]
fn new_york_scenario_matches_midtown_and_prices_at_52() {
    let pickup = coord(40.7128, -74.0060);
    let drivers = vec![
        online_driver("A", coord(40.7580, -73.9855)),
        online_driver("B", coord(34.0522, -118.2437)),
    ];
    let found = select_driver(&pickup, &drivers, None)
        .expect("match")
        .expect("some driver");
    assert_eq!(found.driver.id, "A");
    assert!((found.distance_km - 5.2).abs() <= 0.2);

    let quote = TieredPricingPolicy
        .quote(5.2, &DeliveryTypeTier::new("standard", 10.0))
        .expect("quote");
    assert_eq!(quote.cost, 52.0);
}
