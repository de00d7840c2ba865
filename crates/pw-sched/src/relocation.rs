//! Moving denied vehicles off a lot.
//!
//! The configured backend is a preference, not a promise: a path-aware
//! relocator that is missing or not ready falls back to the host's direct
//! nudge.  Whatever the backend, a vehicle that could not be moved is
//! evicted.  It is never left on the lot to be retried in the same audit.

use pw_core::{CityHost, ParkingRelocator, Position, RelocationBackend};

use crate::DeniedVehicle;

/// What happened to one denied vehicle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// Re-parked by the named backend.
    Moved(RelocationBackend),
    /// Relocation failed; the vehicle was removed from the lot.
    Released,
}

/// Backend that will actually handle the next relocation.
pub fn effective_backend(
    preferred: RelocationBackend,
    relocator: &dyn ParkingRelocator,
) -> RelocationBackend {
    match preferred {
        RelocationBackend::PathAware if relocator.is_available() => RelocationBackend::PathAware,
        _ => RelocationBackend::DirectNudge,
    }
}

/// Move `vehicle` with the effective backend, evicting it on failure.
pub fn relocate<H: CityHost + ?Sized>(
    host:      &mut H,
    relocator: &mut dyn ParkingRelocator,
    preferred: RelocationBackend,
    vehicle:   &DeniedVehicle,
    reference: Position,
) -> RelocationOutcome {
    let backend = effective_backend(preferred, relocator);
    let moved = match backend {
        RelocationBackend::PathAware => {
            relocator.try_move(vehicle.parked, vehicle.owner, vehicle.home, reference)
        }
        RelocationBackend::DirectNudge => host.nudge_parked_vehicle(vehicle.parked, reference),
    };

    if moved {
        RelocationOutcome::Moved(backend)
    } else {
        host.release_parked_vehicle(vehicle.parked);
        RelocationOutcome::Released
    }
}
