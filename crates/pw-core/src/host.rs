//! Capabilities the engine consumes from the host simulation.
//!
//! # Pluggability
//!
//! The engine never owns city data.  Building, vehicle and citizen lookups go
//! through [`CityHost`], which the host implements over its own pools.  The
//! host is passed by reference into each call, so the engine holds no
//! borrows between ticks.
//!
//! Two optional collaborators are injected once at construction:
//!
//! - [`ParkingRelocator`]: an external, path-aware relocator.  The engine
//!   does not care whether a real one exists; [`NullRelocator`] reports
//!   itself unavailable and the engine falls back to the host's own nudge.
//! - [`TickDispatcher`]: "run the engine tick on the simulation thread as
//!   soon as possible".  The engine asks for one tick at a time and
//!   re-asks while work remains.

use crate::{BuildingId, CitizenId, ParkedVehicleId, Position, VehicleId};

// ── Host records ──────────────────────────────────────────────────────────────

/// Facts about one parked vehicle, resolved fresh on every request.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParkedVehicleInfo {
    /// Citizen owning the vehicle.  `CitizenId::INVALID` if ownerless.
    pub owner: CitizenId,

    /// Where the vehicle is parked.
    pub position: Position,

    /// Host verdict that the vehicle is stuck mid-parking: the owner still
    /// points back at this vehicle and the "parking in progress" flag has
    /// not cleared.  One day of this is normal; two in a row is not.
    pub stuck_candidate: bool,
}

/// Facts about one citizen needed to judge parking entitlement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CitizenInfo {
    /// Home building, or `BuildingId::INVALID` if homeless.
    pub home: BuildingId,

    /// Work place or school, or `BuildingId::INVALID`.
    pub work: BuildingId,

    /// Tourists and other non-residents.
    pub visitor: bool,
}

// ── CityHost ──────────────────────────────────────────────────────────────────

/// Read/write access to the host's building, vehicle and citizen pools.
///
/// # Contract
///
/// - Lookups return `None` for deleted, never-created or out-of-range ids;
///   they never panic.
/// - The parked-vehicle list of a lot is a singly linked list threaded
///   through the parked-vehicle pool.  Callers walk it with
///   [`first_parked_vehicle`](Self::first_parked_vehicle) and
///   [`next_parked_vehicle`](Self::next_parked_vehicle) and must cap the walk.
pub trait CityHost {
    /// `true` if the building slot is created and not being deleted.
    fn building_exists(&self, building: BuildingId) -> bool;

    /// Reference position of the building.
    fn building_position(&self, building: BuildingId) -> Option<Position>;

    /// `true` if the building's prefab is a parking lot type the engine
    /// supports rules for.
    fn is_supported_lot(&self, building: BuildingId) -> bool;

    /// World positions of the building's parking spaces.  `None` if the
    /// geometry cannot be resolved right now.
    fn parking_spaces(&self, building: BuildingId) -> Option<Vec<Position>>;

    /// Head of the lot's parked-vehicle list.
    fn first_parked_vehicle(&self, building: BuildingId) -> Option<ParkedVehicleId>;

    /// Successor of `parked` in its lot's parked-vehicle list.
    fn next_parked_vehicle(&self, parked: ParkedVehicleId) -> Option<ParkedVehicleId>;

    /// Citizen currently driving `vehicle`.
    fn vehicle_driver(&self, vehicle: VehicleId) -> Option<CitizenId>;

    fn parked_vehicle(&self, parked: ParkedVehicleId) -> Option<ParkedVehicleInfo>;

    fn citizen(&self, citizen: CitizenId) -> Option<CitizenInfo>;

    /// Try to re-park `parked` somewhere legal near `reference` using the
    /// host's own vehicle update logic.  Returns `true` if it moved.
    fn nudge_parked_vehicle(&mut self, parked: ParkedVehicleId, reference: Position) -> bool;

    /// Remove `parked` from its lot outright.
    fn release_parked_vehicle(&mut self, parked: ParkedVehicleId);

    /// Complete a parking transition that never finished.  Returns `true`
    /// if the host changed anything.
    fn finalize_stuck_vehicle(&mut self, parked: ParkedVehicleId) -> bool;
}

// ── ParkingRelocator ──────────────────────────────────────────────────────────

/// External path-aware relocation backend.
pub trait ParkingRelocator: Send {
    /// `false` if the backend is not installed or not ready.
    fn is_available(&self) -> bool;

    /// Move `parked` (owned by `owner`, who lives in `home`) to a legal spot,
    /// searching outward from `reference`.  Returns `true` on success.
    fn try_move(
        &mut self,
        parked:    ParkedVehicleId,
        owner:     CitizenId,
        home:      BuildingId,
        reference: Position,
    ) -> bool;
}

/// A [`ParkingRelocator`] that is never available.
pub struct NullRelocator;

impl ParkingRelocator for NullRelocator {
    #[inline]
    fn is_available(&self) -> bool {
        false
    }

    #[inline]
    fn try_move(
        &mut self,
        _parked:    ParkedVehicleId,
        _owner:     CitizenId,
        _home:      BuildingId,
        _reference: Position,
    ) -> bool {
        false
    }
}

// ── TickDispatcher ────────────────────────────────────────────────────────────

/// Schedules one engine tick on the simulation thread.
///
/// The host answers a request by calling `ParkingPolicyEngine::run_tick`
/// once, as soon as it can.  Requests are not counted: the engine never
/// issues a second request before the first has been served.
pub trait TickDispatcher: Send {
    fn request_tick(&mut self);
}

/// A [`TickDispatcher`] that drops every request.  The host then drives
/// `run_tick` on its own cadence.
pub struct NoopDispatcher;

impl TickDispatcher for NoopDispatcher {
    #[inline]
    fn request_tick(&mut self) {}
}
