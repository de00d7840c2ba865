//! Resolved facts about the party asking to park.

use pw_core::{BuildingId, CitizenId, CityHost, Position, VehicleId};

/// Who is asking, where they live, where they work.
///
/// Resolved from the host on every evaluation and never cached: citizens
/// move house and change jobs between checks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActorContext {
    pub citizen:       CitizenId,
    pub home:          BuildingId,
    pub home_position: Option<Position>,
    pub work:          BuildingId,
    pub work_position: Option<Position>,
    pub visitor:       bool,
}

impl ActorContext {
    /// Resolve a citizen.  `None` if the id is invalid or the host does not
    /// know the citizen.
    pub fn resolve<H: CityHost + ?Sized>(host: &H, citizen: CitizenId) -> Option<Self> {
        if !citizen.is_valid() {
            return None;
        }
        let info = host.citizen(citizen)?;
        Some(Self {
            citizen,
            home:          info.home,
            home_position: building_position(host, info.home),
            work:          info.work,
            work_position: building_position(host, info.work),
            visitor:       info.visitor,
        })
    }

    /// Resolve the citizen currently driving `vehicle`.
    pub fn resolve_driver<H: CityHost + ?Sized>(host: &H, vehicle: VehicleId) -> Option<Self> {
        if !vehicle.is_valid() {
            return None;
        }
        let citizen = host.vehicle_driver(vehicle)?;
        Self::resolve(host, citizen)
    }
}

fn building_position<H: CityHost + ?Sized>(host: &H, building: BuildingId) -> Option<Position> {
    if !building.is_valid() || !host.building_exists(building) {
        return None;
    }
    host.building_position(building).filter(|p| p.is_finite())
}
