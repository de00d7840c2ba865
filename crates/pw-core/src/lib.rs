//! `pw-core`: foundational types for the `parkwarden` parking policy engine.
//!
//! This crate is a dependency of every other `pw-*` crate.  It has no `pw-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `BuildingId`, `VehicleId`, `ParkedVehicleId`, `CitizenId` |
//! | [`geo`]         | `Position`, planar distance                               |
//! | [`settings`]    | `EngineSettings`, `TickBudgets`, `RelocationBackend`      |
//! | [`affinity`]    | `ThreadAffinity`, single-thread confinement check        |
//! | [`host`]        | `CityHost`, `ParkingRelocator`, `TickDispatcher` traits   |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |

pub mod affinity;
pub mod error;
pub mod geo;
pub mod host;
pub mod ids;
pub mod settings;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use affinity::ThreadAffinity;
pub use error::{CoreError, CoreResult};
pub use geo::Position;
pub use host::{
    CitizenInfo, CityHost, NoopDispatcher, NullRelocator, ParkedVehicleInfo, ParkingRelocator,
    TickDispatcher,
};
pub use ids::{BuildingId, CitizenId, ParkedVehicleId, VehicleId};
pub use settings::{EngineSettings, RelocationBackend, TickBudgets};
