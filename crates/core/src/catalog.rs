use crate::domain::vehicle::{Vehicle, VehicleId};

pub const DEFAULT_FEATURED: usize = 3;
pub const MAX_FEATURED: usize = 12;

/// A snapshot of the fleet, ordered by name then id.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    vehicles: Vec<Vehicle>,
}

impl Catalog {
    pub fn new(mut vehicles: Vec<Vehicle>) -> Self {
        vehicles.sort_by(|left, right| {
            left.name().cmp(right.name()).then_with(|| left.id().cmp(right.id()))
        });
        Self { vehicles }
    }

    pub fn find(&self, vehicle_id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.id() == vehicle_id)
    }

    pub fn all(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn available(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter().filter(|vehicle| vehicle.is_available())
    }

    pub fn featured(&self, limit: usize) -> &[Vehicle] {
        let limit = limit.min(MAX_FEATURED).min(self.vehicles.len());
        &self.vehicles[..limit]
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn into_vehicles(self) -> Vec<Vehicle> {
        self.vehicles
    }
}
