// Phase 4: Firewall Reconstruction
// Pure per-category derivation: a narrative of what was reverted plus
// simulated latency/confidence figures. No reasoning-provider call.

use crate::models::{ReconstructionReport, RiskCategory};
use rand::Rng;

const INVERSE_DIFFUSION_MODEL: &str = "InstantViR Inverse Diffusion Engine (student)";

pub trait Reconstructor: Send + Sync {
    fn reconstruct(&self, scan_id: &str, category: RiskCategory) -> ReconstructionReport;
}

/// Simulated reconstruction layer; figures vary within fixed bounds,
/// the narrative per category is fixed.
#[derive(Default)]
pub struct SimulatedReconstruction;

impl SimulatedReconstruction {
    pub fn new() -> Self {
        Self
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

impl Reconstructor for SimulatedReconstruction {
    fn reconstruct(&self, scan_id: &str, category: RiskCategory) -> ReconstructionReport {
        let mut rng = rand::thread_rng();

        let (status_message, revert_action) = match category {
            RiskCategory::Contextual => (
                "Provenance anchor restored",
                "Re-anchored the asset to its earliest verified provenance record and stripped the false-context framing overlays.",
            ),
            RiskCategory::Synthetic => (
                "Ground truth representation mapped",
                "Stripped generator artifacts through inverse diffusion and reverted the asset to its unmanipulated truth baseline.",
            ),
            RiskCategory::Narrative => (
                "Claim graph neutralized",
                "Dampened the amplified sentiment framing and restored the claim graph to verified source statements.",
            ),
            RiskCategory::Benign => (
                "Already at truth baseline",
                "No manipulation detected; nothing to revert.",
            ),
        };

        let (latency_ms, reconstruction_confidence) = if category == RiskCategory::Benign {
            (rng.gen_range(40..=160), round3(rng.gen_range(0.97..0.999)))
        } else {
            (rng.gen_range(800..=4200), round3(rng.gen_range(0.82..0.99)))
        };

        ReconstructionReport {
            scan_id: scan_id.to_string(),
            inverse_diffusion_model: INVERSE_DIFFUSION_MODEL.to_string(),
            latency_ms,
            reconstruction_confidence,
            status_message: status_message.to_string(),
            revert_action: revert_action.to_string(),
        }
    }
}
