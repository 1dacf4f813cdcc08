//! Test helpers shared across MemOS dashboard crates.

pub mod api;
pub mod fixtures;

pub use api::{StubApi, StubCall, StubFailure};
pub use fixtures::{card_json, condensation, condensations, query_response};
