// Phase 3: Supreme Court Adjudication
// Combines the Phase 1 assessment and a freshly re-derived Phase 2
// report into a second reasoning-chain prompt producing the final
// verdict. Never errors once the scan exists: total chain failure
// becomes an explicit offline payload.

use crate::models::{
    AdjudicationOutcome, DeepDiveReport, OfflineNotice, ScanRecord, Verdict, VerdictReport,
};
use crate::services::providers::{FieldKind, FieldSpec, OutputSchema, ProviderChain};
use serde::Deserialize;
use tracing::warn;

const OFFLINE_ERROR: &str = "All AI agents offline; adjudication unavailable for this scan.";

const ADJUDICATION_PREAMBLE: &str = "You are the VERITAS Supreme Court adjudication agent. \
Weigh the Phase 1 triage assessment against the Phase 2 forensic evidence and deliver a \
final verdict on whether the content is manipulated, authentic, or inconclusive. \
Cite the strongest evidence stream in evidence_heatmap and record your calibration \
reasoning in audit_trail.";

/// Provider payload; the scan id is attached by the service.
#[derive(Debug, Deserialize)]
struct VerdictPayload {
    verdict: Verdict,
    reasoning_log: String,
    evidence_heatmap: String,
    confidence_calibration: f64,
    audit_trail: String,
}

pub fn verdict_schema() -> OutputSchema {
    OutputSchema {
        name: "verdict",
        fields: vec![
            FieldSpec {
                name: "verdict",
                kind: FieldKind::Enumerated(&["manipulated", "authentic", "inconclusive"]),
            },
            FieldSpec {
                name: "reasoning_log",
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "evidence_heatmap",
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "confidence_calibration",
                kind: FieldKind::Float { min: 0.0, max: 1.0 },
            },
            FieldSpec {
                name: "audit_trail",
                kind: FieldKind::Text,
            },
        ],
    }
}

fn build_prompt(record: &ScanRecord, deep_dive: &DeepDiveReport) -> String {
    let forensics = serde_json::to_string_pretty(&deep_dive.results)
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "{}\n\nPHASE 1 TRIAGE:\n- deception score: {}\n- risk category: {}\n- explanation: {}\n\nPHASE 2 FORENSICS ({}):\n{}",
        ADJUDICATION_PREAMBLE,
        record.score,
        record.category.label(),
        record.explanation_summary,
        deep_dive.feature,
        forensics
    )
}

pub async fn run(
    chain: &ProviderChain,
    record: &ScanRecord,
    deep_dive: &DeepDiveReport,
) -> AdjudicationOutcome {
    let prompt = build_prompt(record, deep_dive);
    let schema = verdict_schema();

    match chain.execute(&prompt, &schema).await {
        Ok(value) => match serde_json::from_value::<VerdictPayload>(value) {
            Ok(payload) => AdjudicationOutcome::Verdict(VerdictReport {
                scan_id: record.id.clone(),
                verdict: payload.verdict,
                reasoning_log: payload.reasoning_log,
                evidence_heatmap: payload.evidence_heatmap,
                confidence_calibration: payload.confidence_calibration.clamp(0.0, 1.0),
                audit_trail: payload.audit_trail,
            }),
            Err(e) => {
                warn!(scan_id = %record.id, error = %e, "verdict payload failed to deserialize");
                AdjudicationOutcome::Offline(OfflineNotice {
                    scan_id: record.id.clone(),
                    error: OFFLINE_ERROR.to_string(),
                    provider_failures: vec![format!("verdict payload rejected: {}", e)],
                })
            }
        },
        Err(exhausted) => {
            warn!(scan_id = %record.id, error = %exhausted, "adjudication chain exhausted");
            AdjudicationOutcome::Offline(OfflineNotice {
                scan_id: record.id.clone(),
                error: OFFLINE_ERROR.to_string(),
                provider_failures: exhausted
                    .attempts
                    .iter()
                    .map(|a| a.to_string())
                    .collect(),
            })
        }
    }
}
