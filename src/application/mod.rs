//! Mockup generation services: technique resolution, task orchestration and
//! batch coordination on top of the renderer port.

pub mod batch;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchConfig, BatchCoordinator, Combination, plan_combinations};
pub use orchestrator::{MockupLookup, PollConfig, TaskOrchestrator, select_mockup};
pub use service::MockupService;
