//! Value types shared by the mockup engine. Nothing here performs I/O.

pub mod batch;
pub mod geometry;
pub mod task;
pub mod technique;
pub mod types;

pub use batch::{BatchFailure, BatchMockup, BatchOutcome, BatchResult};
pub use geometry::{InchGeometry, PlacementGeometry, REFERENCE_DPI};
pub use task::{RenderTask, TaskMockup, TaskStatus, TaskSubmission, VariantMockups};
pub use technique::{ParseTechniqueError, Technique};
pub use types::{BatchRequest, MatchKind, RenderRequest, RenderResult, StyleDescriptor};
