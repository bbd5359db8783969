// src/tracking/risk.rs
//
// Discrete collision-risk scoring with asymmetric debouncing: escalation is
// immediate, de-escalation waits until the lower level has persisted for a
// configured number of consecutive cycles. A single noisy frame must never
// cancel an active warning.
//
// Unknown distance is deliberately conservative in both directions: it
// satisfies no distance-keyed rule (no false alarms from a degraded depth
// pipeline) and an established warning only decays through the normal
// de-escalation window.

use tracing::{debug, warn};

use super::track::Track;
use crate::types::{DistanceBucket, MotionClass, RiskConfig, RiskLevel};

pub struct RiskScorer {
    config: RiskConfig,
}

impl RiskScorer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Raw rule-table evaluation, top-down, first match wins
    pub fn compute(&self, track: &Track) -> RiskLevel {
        use DistanceBucket::*;
        use MotionClass::*;

        let bucket = track.bucket();
        let motion = track.motion_class;
        let in_zone = self.config.collision_zone.contains(track.predicted_position);

        if bucket == Some(VeryClose) && matches!(motion, Approaching | Stationary) {
            RiskLevel::Imminent
        } else if bucket == Some(VeryClose) {
            RiskLevel::High
        } else if motion == Approaching && bucket == Some(Close) {
            RiskLevel::High
        } else if motion == Approaching && bucket == Some(Moderate) {
            RiskLevel::Medium
        } else if motion == Crossing && in_zone {
            RiskLevel::Medium
        } else if bucket == Some(Close) {
            RiskLevel::Low
        } else {
            RiskLevel::None
        }
    }

    /// Recomputes the track's risk and folds it through the debounce state.
    /// The reported level on the track only ever moves up immediately.
    pub fn apply(&self, track: &mut Track) {
        let computed = self.compute(track);

        if computed >= track.risk_level {
            if computed > track.risk_level {
                warn!(
                    "⚠️  Track {} ({}) risk {} → {}",
                    track.id,
                    track.label,
                    track.risk_level.as_str(),
                    computed.as_str()
                );
            }
            track.risk_level = computed;
            track.deescalation_streak = 0;
            return;
        }

        track.deescalation_streak += 1;
        if track.deescalation_streak >= self.config.deescalation_min_cycles {
            debug!(
                "Track {} risk {} → {} after {} quiet cycles",
                track.id,
                track.risk_level.as_str(),
                computed.as_str(),
                track.deescalation_streak
            );
            track.risk_level = computed;
            track.deescalation_streak = 0;
        }
    }
}
