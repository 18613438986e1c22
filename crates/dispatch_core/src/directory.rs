//! Driver records and read-only directory views over them.
//!
//! This module provides:
//!
//! - **DriverRecord**: a driver's dispatchable state at one point in time
//! - **DriverDirectory**: the snapshot contract the matcher reads from
//! - **SnapshotDirectory**: a plain ordered snapshot, every driver is a candidate
//! - **CellIndexedDirectory**: H3 cell → driver buckets for radius-limited
//!   candidate queries
//!
//! Staleness of a snapshot is the caller's concern; nothing here performs I/O.

use std::collections::HashMap;

use h3o::{CellIndex, LatLng, Resolution};
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::geo::Coordinate;

/// A driver as stored by the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    pub id: String,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub current_location: Option<Coordinate>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
}

impl DriverRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_online: false,
            current_location: None,
            vehicle_type: None,
        }
    }

    pub fn online(mut self) -> Self {
        self.is_online = true;
        self
    }

    pub fn at(mut self, location: Coordinate) -> Self {
        self.current_location = Some(location);
        self
    }

    pub fn with_vehicle(mut self, vehicle_type: impl Into<String>) -> Self {
        self.vehicle_type = Some(vehicle_type.into());
        self
    }

    /// Online with a known location. Only such drivers can be matched.
    pub fn is_dispatchable(&self) -> bool {
        self.is_online && self.current_location.is_some()
    }
}

/// Read-only view of driver state handed to the matcher.
pub trait DriverDirectory: Send + Sync {
    /// Drivers to consider for a pickup, in a stable order.
    fn candidates(&self, pickup: &Coordinate) -> Result<Vec<&DriverRecord>>;

    /// Look up one driver by id.
    fn get(&self, id: &str) -> Option<&DriverRecord>;

    /// Total number of drivers in the snapshot.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered, in-memory snapshot of driver records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDirectory {
    drivers: Vec<DriverRecord>,
}

impl SnapshotDirectory {
    pub fn new(drivers: Vec<DriverRecord>) -> Self {
        Self { drivers }
    }

    /// Parse a JSON array of driver records.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let drivers: Vec<DriverRecord> = serde_json::from_str(json)
            .map_err(|err| DispatchError::InvalidConfig(format!("driver snapshot: {err}")))?;
        Ok(Self::new(drivers))
    }

    pub fn drivers(&self) -> &[DriverRecord] {
        &self.drivers
    }

    pub fn into_drivers(self) -> Vec<DriverRecord> {
        self.drivers
    }
}

impl DriverDirectory for SnapshotDirectory {
    fn candidates(&self, pickup: &Coordinate) -> Result<Vec<&DriverRecord>> {
        pickup.validate()?;
        Ok(self.drivers.iter().collect())
    }

    fn get(&self, id: &str) -> Option<&DriverRecord> {
        self.drivers.iter().find(|driver| driver.id == id)
    }

    fn len(&self) -> usize {
        self.drivers.len()
    }
}

/// Default H3 resolution (~240m cells), suitable for city-scale dispatch.
pub const DEFAULT_RESOLUTION: Resolution = Resolution::Nine;

/// Largest accepted search radius in grid steps. A disk of this radius at
/// resolution 9 already spans a few hundred kilometres.
pub const MAX_SEARCH_RADIUS: u32 = 500;

/// Reject search radii above [`MAX_SEARCH_RADIUS`].
pub fn check_search_radius(search_radius: Option<u32>) -> Result<()> {
    match search_radius {
        Some(radius) if radius > MAX_SEARCH_RADIUS => Err(DispatchError::InvalidConfig(format!(
            "search_radius must be at most {MAX_SEARCH_RADIUS} cells, got {radius}"
        ))),
        _ => Ok(()),
    }
}

fn cell_for(location: &Coordinate, resolution: Resolution) -> Result<CellIndex> {
    location.validate()?;
    let latlng = LatLng::new(location.latitude, location.longitude).map_err(|_| {
        DispatchError::InvalidCoordinate {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    })?;
    Ok(latlng.to_cell(resolution))
}

/// Driver snapshot bucketed by H3 cell.
///
/// With a search radius set, [`DriverDirectory::candidates`] only returns
/// drivers whose cell lies within that many grid steps of the pickup cell.
/// Without one it behaves exactly like [`SnapshotDirectory`]. Either way the
/// returned drivers keep snapshot order.
#[derive(Debug, Clone)]
pub struct CellIndexedDirectory {
    drivers: Vec<DriverRecord>,
    resolution: Resolution,
    search_radius: Option<u32>,
    /// Map from H3 cell to indices into `drivers`
    drivers_by_cell: HashMap<CellIndex, Vec<usize>>,
    /// Reverse mapping: driver index → current cell
    driver_to_cell: HashMap<usize, CellIndex>,
}

impl CellIndexedDirectory {
    /// Index a snapshot. Fails if any known driver location is out of range or
    /// the radius exceeds [`MAX_SEARCH_RADIUS`].
    pub fn new(drivers: Vec<DriverRecord>, search_radius: Option<u32>) -> Result<Self> {
        Self::with_resolution(drivers, search_radius, DEFAULT_RESOLUTION)
    }

    pub fn with_resolution(
        drivers: Vec<DriverRecord>,
        search_radius: Option<u32>,
        resolution: Resolution,
    ) -> Result<Self> {
        check_search_radius(search_radius)?;
        let mut directory = Self {
            drivers: Vec::with_capacity(drivers.len()),
            resolution,
            search_radius,
            drivers_by_cell: HashMap::new(),
            driver_to_cell: HashMap::new(),
        };
        for driver in drivers {
            directory.insert(driver)?;
        }
        Ok(directory)
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn search_radius(&self) -> Option<u32> {
        self.search_radius
    }

    /// Append a driver to the snapshot.
    pub fn insert(&mut self, driver: DriverRecord) -> Result<()> {
        let cell = match &driver.current_location {
            Some(location) => Some(cell_for(location, self.resolution)?),
            None => None,
        };
        let index = self.drivers.len();
        self.drivers.push(driver);
        if let Some(cell) = cell {
            self.place(index, cell);
        }
        Ok(())
    }

    /// Move a driver to a new location (or clear it). Returns `false` for an
    /// unknown id.
    pub fn update_location(&mut self, id: &str, location: Option<Coordinate>) -> Result<bool> {
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };
        let new_cell = match &location {
            Some(location) => Some(cell_for(location, self.resolution)?),
            None => None,
        };
        self.unplace(index);
        if let Some(cell) = new_cell {
            self.place(index, cell);
        }
        self.drivers[index].current_location = location;
        Ok(true)
    }

    /// Toggle a driver's online flag. Returns `false` for an unknown id.
    pub fn set_online(&mut self, id: &str, is_online: bool) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.drivers[index].is_online = is_online;
                true
            }
            None => false,
        }
    }

    /// H3 cell currently holding the driver, if it has a location.
    pub fn driver_cell(&self, id: &str) -> Option<CellIndex> {
        self.index_of(id)
            .and_then(|index| self.driver_to_cell.get(&index).copied())
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.drivers.iter().position(|driver| driver.id == id)
    }

    fn place(&mut self, index: usize, cell: CellIndex) {
        self.drivers_by_cell.entry(cell).or_default().push(index);
        self.driver_to_cell.insert(index, cell);
    }

    fn unplace(&mut self, index: usize) {
        if let Some(cell) = self.driver_to_cell.remove(&index) {
            if let Some(indices) = self.drivers_by_cell.get_mut(&cell) {
                indices.retain(|&i| i != index);
                if indices.is_empty() {
                    self.drivers_by_cell.remove(&cell);
                }
            }
        }
    }
}

impl DriverDirectory for CellIndexedDirectory {
    fn candidates(&self, pickup: &Coordinate) -> Result<Vec<&DriverRecord>> {
        let origin = cell_for(pickup, self.resolution)?;
        let Some(radius) = self.search_radius else {
            return Ok(self.drivers.iter().collect());
        };
        let mut indices: Vec<usize> = origin
            .grid_disk::<Vec<_>>(radius)
            .into_iter()
            .filter_map(|cell| self.drivers_by_cell.get(&cell))
            .flatten()
            .copied()
            .collect();
        indices.sort_unstable();
        tracing::debug!(
            radius,
            in_range = indices.len(),
            total = self.drivers.len(),
            "cell-indexed candidate query"
        );
        Ok(indices.into_iter().map(|i| &self.drivers[i]).collect())
    }

    fn get(&self, id: &str) -> Option<&DriverRecord> {
        self.index_of(id).map(|index| &self.drivers[index])
    }

    fn len(&self) -> usize {
        self.drivers.len()
    }
}
