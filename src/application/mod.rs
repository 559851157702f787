//! Application services: fetching, rendering, saving and the pipeline tying them together.

pub mod error;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod renderer;
