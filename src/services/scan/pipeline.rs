// Scan pipeline orchestrator
// Owns the store, the injected reasoning chain, and the analyzer seams;
// generates scan ids and sequences the four phases.

use crate::models::{
    AdjudicationOutcome, DeepDiveReport, ReconstructionReport, ScanRecord, ScanSubmission,
};
use crate::services::providers::ProviderChain;
use crate::services::scan::deep_dive::{ForensicAnalyzer, SimulatedForensics};
use crate::services::scan::reconstruction::{Reconstructor, SimulatedReconstruction};
use crate::services::scan::store::ScanStore;
use crate::services::scan::{adjudication, triage, ScanError};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

pub struct ScanPipeline {
    store: ScanStore,
    chain: ProviderChain,
    forensics: Box<dyn ForensicAnalyzer>,
    reconstruction: Box<dyn Reconstructor>,
}

impl ScanPipeline {
    /// Pipeline with the simulated forensic and reconstruction layers.
    pub fn new(chain: ProviderChain) -> Self {
        Self::with_analyzers(
            chain,
            Box::new(SimulatedForensics::new()),
            Box::new(SimulatedReconstruction::new()),
        )
    }

    pub fn with_analyzers(
        chain: ProviderChain,
        forensics: Box<dyn ForensicAnalyzer>,
        reconstruction: Box<dyn Reconstructor>,
    ) -> Self {
        Self {
            store: ScanStore::new(),
            chain,
            forensics,
            reconstruction,
        }
    }

    /// Phase 1. Every submission creates a fresh record under a fresh
    /// id; ids are never reused or updated in place.
    pub async fn submit(&self, submission: &ScanSubmission) -> Result<ScanRecord, ScanError> {
        let result = triage::run(&self.chain, submission).await?;

        let record = ScanRecord {
            id: format!("scan_{}", Uuid::new_v4().simple()),
            score: result.score,
            category: result.category,
            confidence: result.confidence,
            explanation_summary: result.explanation_summary,
            routing_decision: result.routing_decision,
            status: result.status,
            timestamp: Utc::now(),
        };

        info!(
            scan_id = %record.id,
            score = record.score,
            category = record.category.label(),
            status = ?record.status,
            "triage complete"
        );
        self.store.insert(record.clone());
        Ok(record)
    }

    pub fn get(&self, scan_id: &str) -> Result<ScanRecord, ScanError> {
        self.store
            .get(scan_id)
            .ok_or_else(|| ScanError::NotFound(scan_id.to_string()))
    }

    /// Phase 2: derived from the stored category, no provider call.
    pub fn deep_dive(&self, scan_id: &str) -> Result<DeepDiveReport, ScanError> {
        let record = self.get(scan_id)?;
        Ok(self.forensics.analyze(&record.id, record.category))
    }

    /// Phase 3: re-derives Phase 2 (idempotent, uncached) and invokes
    /// the reasoning chain over both phases. Total chain failure
    /// surfaces as a degraded offline payload, never an error.
    pub async fn adjudicate(&self, scan_id: &str) -> Result<AdjudicationOutcome, ScanError> {
        let record = self.get(scan_id)?;
        let deep_dive = self.forensics.analyze(&record.id, record.category);
        Ok(adjudication::run(&self.chain, &record, &deep_dive).await)
    }

    /// Phase 4: derived from the stored category, no provider call.
    pub fn reconstruct(&self, scan_id: &str) -> Result<ReconstructionReport, ScanError> {
        let record = self.get(scan_id)?;
        Ok(self.reconstruction.reconstruct(&record.id, record.category))
    }
}
