//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod renderer;
pub mod telemetry;
