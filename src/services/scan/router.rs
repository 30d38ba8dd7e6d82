// Risk routing table: (category, score) -> forensic modules

use crate::models::RiskCategory;

/// Score threshold below which no forensic escalation happens at all.
pub const ESCALATION_THRESHOLD: u8 = 30;

/// Map a risk category and deception score to the ordered list of
/// forensic modules the scan should be routed to. The score gates
/// routing: below the threshold the list is empty even for a
/// non-benign category.
pub fn route(category: RiskCategory, score: u8) -> Vec<String> {
    if score < ESCALATION_THRESHOLD {
        return Vec::new();
    }

    let modules: &[&str] = match category {
        RiskCategory::Contextual => &[
            "Digital Patient Zero Traceback",
            "TIDE-MARK Clustering",
            "Federated GNN Analysis",
        ],
        RiskCategory::Synthetic => &[
            "Diffusion Artifact Lab",
            "FFT Anomaly Detection",
            "Optical Flow Consistency",
        ],
        RiskCategory::Narrative => &[
            "Sovereigner Sentiment Analysis",
            "Narrative Contradiction Engine",
            "LLM Hallucination Check",
        ],
        RiskCategory::Benign => &[],
    };

    modules.iter().map(|m| m.to_string()).collect()
}
