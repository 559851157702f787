//! Domain layer types and invariants.

pub mod error;
pub mod geojson;
pub mod render;
pub mod style;
