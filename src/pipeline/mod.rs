//! The orchestration pipeline.
//!
//! One [`AnalysisRequest`](crate::request::AnalysisRequest) flows through
//! template resolution, detection, selection, conflict checks, optional
//! registry enrichment and artifact generation, and yields exactly one
//! [`AnalysisResult`]. Any stage may end the run with a typed error.

pub mod generate;
pub mod orchestrator;
pub mod result;

pub use generate::generate;
pub use orchestrator::Orchestrator;
pub use result::AnalysisResult;
