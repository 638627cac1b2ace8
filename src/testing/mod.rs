//! Deterministic synthetic-signal utilities.
//!
//! Fixtures in this namespace feed the normalizer/detector pipeline
//! without touching live sensor hardware; they back the unit and
//! integration tests and the replay CLI's demo mode.

pub mod fixtures;
