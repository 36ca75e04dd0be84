//! Public facade crate for `ars`.
//!
//! Re-exports the backend-agnostic types/traits from `ars-core` at the root and
//! the local engine (pipeline, fetcher, config snapshots) as [`engine`].

pub use ars_core::*;

pub use ars_local as engine;
