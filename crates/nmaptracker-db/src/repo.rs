//! Repository helpers for every entity in the data model, generic over
//! `sqlx::SqliteExecutor<'_>` so the same function bodies run against
//! either the live pool or an open transaction (see SPEC_FULL.md §9).

pub mod baselines;
pub mod host_observations;
pub mod hosts;
pub mod imports;
pub mod port_observations;
pub mod ports;
pub mod projects;
pub mod scope;
