// VERITAS Data Models
// Wire shapes for the scan lifecycle: triage record, phase reports, verdicts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Risk Category ============

/// Closed risk taxonomy. Provider output is free text and is normalized
/// into this set; anything unrecognized collapses to `Benign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Contextual,
    Synthetic,
    Narrative,
    Benign,
}

impl RiskCategory {
    /// Lowercase-compare a provider-supplied label against the canonical
    /// set. No match defaults to `Benign`.
    pub fn from_provider_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "contextual" => RiskCategory::Contextual,
            "synthetic" => RiskCategory::Synthetic,
            "narrative" => RiskCategory::Narrative,
            _ => RiskCategory::Benign,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Contextual => "Contextual",
            RiskCategory::Synthetic => "Synthetic",
            RiskCategory::Narrative => "Narrative",
            RiskCategory::Benign => "Benign",
        }
    }
}

// ============ Scan Record ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Completed,
    Escalated,
}

/// Phase 1 output, created once by triage and never mutated afterwards.
/// Later phases attach derived data through their own reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: String,
    pub score: u8,
    pub category: RiskCategory,
    pub confidence: f64,
    pub explanation_summary: String,
    pub routing_decision: Vec<String>,
    pub status: ScanStatus,
    pub timestamp: DateTime<Utc>,
}

// ============ Scan Submission ============

/// Raw client submission. At least one of the three fields must be
/// present; the uploaded file is referenced by name only (its bytes are
/// deliberately not transcribed).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanSubmission {
    pub text_content: Option<String>,
    pub url: Option<String>,
    #[serde(skip)]
    pub file_name: Option<String>,
}

impl ScanSubmission {
    pub fn is_empty(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, |v| v.trim().is_empty());
        blank(&self.text_content) && blank(&self.url) && blank(&self.file_name)
    }
}

// ============ Provider Payloads ============

/// Triage structured output, validated against the triage schema before
/// deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct TriageAssessment {
    pub deception_score: u8,
    pub risk_category: String,
    pub explanation_summary: String,
    pub confidence_score: f64,
}

/// Adjudication structured output ("Supreme Court" verdict).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictReport {
    pub scan_id: String,
    pub verdict: Verdict,
    pub reasoning_log: String,
    pub evidence_heatmap: String,
    pub confidence_calibration: f64,
    pub audit_trail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Manipulated,
    Authentic,
    Inconclusive,
}

/// Terminal degraded adjudication payload: every provider in the chain
/// failed. Distinct from the triage fail-open default.
#[derive(Debug, Clone, Serialize)]
pub struct OfflineNotice {
    pub scan_id: String,
    pub error: String,
    pub provider_failures: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AdjudicationOutcome {
    Verdict(VerdictReport),
    Offline(OfflineNotice),
}

// ============ Deep-Dive Report ============

/// Phase 2 report. `results` carries fixed per-category simulated
/// metrics; the field set is stable per category even though numeric
/// values vary within documented bounds.
#[derive(Debug, Clone, Serialize)]
pub struct DeepDiveReport {
    pub scan_id: String,
    pub feature: String,
    pub phase2_category: RiskCategory,
    pub results: ForensicResults,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ForensicResults {
    Contextual(ContextualForensics),
    Synthetic(SyntheticForensics),
    Narrative(NarrativeForensics),
    Benign(BenignForensics),
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextualForensics {
    pub lineage_graph_nodes: u32,
    pub earliest_trace_days: u32,
    pub coordinated_cluster_detected: bool,
    pub cross_platform_spread_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyntheticForensics {
    pub fft_anomaly_score: f64,
    pub diffusion_artifact_probability: f64,
    pub optical_flow_break_detected: bool,
    pub gan_fingerprint: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NarrativeForensics {
    pub sentiment_amplification_score: f64,
    pub contradiction_count: u32,
    pub hallucination_probability: f64,
    pub emotional_trigger_density: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenignForensics {
    pub forensic_trace_required: bool,
    pub note: String,
}

// ============ Reconstruction Report ============

/// Phase 4 report: narrative of reverting detected manipulation.
#[derive(Debug, Clone, Serialize)]
pub struct ReconstructionReport {
    pub scan_id: String,
    pub inverse_diffusion_model: String,
    pub latency_ms: u32,
    pub reconstruction_confidence: f64,
    pub status_message: String,
    pub revert_action: String,
}
