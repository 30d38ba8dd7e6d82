// Scan Pipeline Module
// Multi-stage deception scan organized into phase submodules:
// - router: category/score -> forensic module routing table
// - store: scan records keyed by id
// - triage: Phase 1 risk scoring via the reasoning chain
// - deep_dive: Phase 2 category-specific forensic detail
// - adjudication: Phase 3 final verdict ("Supreme Court")
// - reconstruction: Phase 4 content restoration narrative
// - pipeline: orchestrator sequencing the phases against the store

pub mod adjudication;
pub mod deep_dive;
pub mod pipeline;
pub mod reconstruction;
pub mod router;
pub mod store;
pub mod triage;

pub use deep_dive::{ForensicAnalyzer, SimulatedForensics};
pub use pipeline::ScanPipeline;
pub use reconstruction::{Reconstructor, SimulatedReconstruction};
pub use router::route;
pub use store::ScanStore;

use thiserror::Error;

/// Client-visible failures. Provider-level errors never appear here:
/// they are absorbed into fallback attempts or degraded payloads.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("No content supplied: provide text_content, url, or file")]
    EmptySubmission,
    #[error("Scan not found")]
    NotFound(String),
}
