// Phase 1: Multimodal Semantic Triage
// Normalizes the submission into a text payload, runs the reasoning
// chain against the triage schema, and resolves the canonical risk
// assessment. Fails only on an empty submission; chain exhaustion
// degrades to a fixed fail-open benign result instead of erroring.

use crate::models::{RiskCategory, ScanStatus, ScanSubmission, TriageAssessment};
use crate::services::providers::{FieldKind, FieldSpec, OutputSchema, ProviderChain};
use crate::services::scan::router;
use crate::services::scan::ScanError;
use crate::services::text_signals::compute_signals;
use tracing::{debug, warn};

/// Fail-open defaults when every reasoning provider is unreachable.
const DEGRADED_SCORE: u8 = 15;
const DEGRADED_CONFIDENCE: f64 = 0.8;
const DEGRADED_EXPLANATION: &str =
    "All reasoning engines were unreachable; content provisionally marked benign pending re-scan.";

const TRIAGE_PREAMBLE: &str = "You are the VERITAS Phase 1 semantic triage engine. \
Assess the following content for deception risk. Deception covers contextual misuse \
(real content in a false frame), synthetic generation (AI-fabricated media), and \
narrative manipulation (emotional or contradictory framing). \
Classify risk_category as one of: Contextual, Synthetic, Narrative, Benign.";

/// Resolved Phase 1 output, before the orchestrator assigns an id.
#[derive(Debug, Clone)]
pub struct TriageResult {
    pub score: u8,
    pub category: RiskCategory,
    pub confidence: f64,
    pub explanation_summary: String,
    pub routing_decision: Vec<String>,
    pub status: ScanStatus,
}

pub fn triage_schema() -> OutputSchema {
    OutputSchema {
        name: "triage",
        fields: vec![
            FieldSpec {
                name: "deception_score",
                kind: FieldKind::Integer { min: 0, max: 100 },
            },
            FieldSpec {
                name: "risk_category",
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "explanation_summary",
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "confidence_score",
                kind: FieldKind::Float { min: 0.0, max: 1.0 },
            },
        ],
    }
}

/// Collapse the submission into a single text payload. An uploaded file
/// contributes only a placeholder naming it: transcription is a
/// deliberate no-op stub, not an omission.
fn normalize_payload(submission: &ScanSubmission) -> Result<String, ScanError> {
    if submission.is_empty() {
        return Err(ScanError::EmptySubmission);
    }

    let mut payload = String::new();
    if let Some(text) = submission.text_content.as_deref() {
        let text = text.trim();
        if !text.is_empty() {
            payload.push_str(text);
        }
    }
    if let Some(url) = submission.url.as_deref() {
        let url = url.trim();
        if !url.is_empty() {
            if !payload.is_empty() {
                payload.push('\n');
            }
            payload.push_str("Source URL: ");
            payload.push_str(url);
        }
    }
    if let Some(name) = submission.file_name.as_deref() {
        let name = name.trim();
        if !name.is_empty() {
            if !payload.is_empty() {
                payload.push('\n');
            }
            payload.push_str(&format!(
                "[attached media '{}': transcription not yet extracted]",
                name
            ));
        }
    }
    Ok(payload)
}

/// Deterministic triage prompt. Hashtags, comments, and post timestamps
/// are fixed placeholders until the extraction pipeline exists.
fn build_prompt(payload: &str) -> String {
    format!(
        "{}\n\nCONTENT:\n{}\n\nHASHTAGS: not yet extracted\nCOMMENTS: not yet extracted\nPOST TIMESTAMPS: not yet extracted",
        TRIAGE_PREAMBLE, payload
    )
}

pub async fn run(
    chain: &ProviderChain,
    submission: &ScanSubmission,
) -> Result<TriageResult, ScanError> {
    let payload = normalize_payload(submission)?;

    // Advisory telemetry only; never gates or aborts the scan.
    let signals = compute_signals(&payload);
    debug!(
        words = signals.word_count,
        ttr = signals.ttr,
        avg_sentence_len = signals.avg_sentence_len,
        "triage text signals"
    );

    let prompt = build_prompt(&payload);
    let schema = triage_schema();

    let degraded = || {
        (
            DEGRADED_SCORE,
            RiskCategory::Benign,
            DEGRADED_CONFIDENCE,
            DEGRADED_EXPLANATION.to_string(),
        )
    };

    let assessment = match chain.execute(&prompt, &schema).await {
        Ok(value) => serde_json::from_value::<TriageAssessment>(value).ok(),
        Err(exhausted) => {
            warn!(error = %exhausted, "triage chain exhausted, applying fail-open default");
            None
        }
    };

    let (score, category, confidence, explanation) = match assessment {
        Some(a) => (
            a.deception_score,
            RiskCategory::from_provider_label(&a.risk_category),
            a.confidence_score.clamp(0.0, 1.0),
            a.explanation_summary,
        ),
        None => degraded(),
    };

    // Score gates category: low-score content is benign no matter what
    // the provider labeled it.
    let category = if score < router::ESCALATION_THRESHOLD {
        RiskCategory::Benign
    } else {
        category
    };

    let routing_decision = router::route(category, score);
    let status = if score < router::ESCALATION_THRESHOLD {
        ScanStatus::Completed
    } else {
        ScanStatus::Escalated
    };

    Ok(TriageResult {
        score,
        category,
        confidence,
        explanation_summary: explanation,
        routing_decision,
        status,
    })
}
