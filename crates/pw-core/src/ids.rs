//! Strongly typed, zero-cost identifier wrappers for host entities.
//!
//! The host simulation stores buildings, vehicles and parked vehicles in
//! fixed-size pools indexed by small integers, and citizens in a larger
//! pool.  Slot `0` is never handed out by the host, so both `0` and the
//! `INVALID` sentinel read as "no entity" through [`is_valid`].
//!
//! [`is_valid`]: BuildingId::is_valid

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no entity": the inner type's `MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// `false` for the `INVALID` sentinel and for the reserved slot `0`.
            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self.0 != 0 && self != Self::INVALID
            }

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Index of a building in the host's building pool.
    pub struct BuildingId(u16);
}

typed_id! {
    /// Index of a moving vehicle in the host's vehicle pool.
    pub struct VehicleId(u16);
}

typed_id! {
    /// Index of a parked vehicle in the host's parked-vehicle pool.
    pub struct ParkedVehicleId(u16);
}

typed_id! {
    /// Index of a citizen.  Citizens outnumber vehicles by far, hence `u32`.
    pub struct CitizenId(u32);
}
