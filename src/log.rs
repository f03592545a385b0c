//! Logging shims, contingent on the `defmt` feature
//!
//! With the feature off these compile to nothing, so the router core
//! carries no logging cost in release firmware.

macro_rules! trace {
    ($($args:tt)*) => {
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($args)*)
    };
}

macro_rules! warn {
    ($($args:tt)*) => {
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($args)*)
    };
}
