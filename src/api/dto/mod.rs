//! Data Transfer Objects for REST response serialization.
//!
//! Field names are camelCase to match what browser clients already read.

pub mod stats_dto;

pub use stats_dto::*;
