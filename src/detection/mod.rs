//! Capability detection, candidate selection and destination checks.

pub mod conflicts;
pub mod runner;
pub mod selection;

pub use conflicts::ConflictGuard;
pub use runner::DetectionRunner;
pub use selection::{choose, SELECTION_PROMPT_KEY};
