// src/guidance.rs
//
// Collaborator-side glue between the tracker's annotated output and the
// narration/TTS services. The tracker never phrases anything; this module
// decides WHICH track deserves an announcement this cycle and suppresses
// repeats, so the narrator downstream is not spammed with the same warning
// every second.

use serde::Serialize;
use tracing::debug;

use crate::tracking::Track;
use crate::types::{Direction, DistanceBucket, GuidanceConfig, MotionClass, RiskLevel};

/// Object categories worth announcing regardless of scene clutter
const SAFETY_LABELS: &[&str] = &[
    "person",
    "car",
    "truck",
    "bus",
    "motorcycle",
    "bicycle",
    "dog",
    "cat",
    "chair",
    "couch",
    "bench",
    "stairs",
    "traffic light",
    "stop sign",
];

pub fn is_safety_relevant(label: &str) -> bool {
    let lower = label.to_lowercase();
    SAFETY_LABELS.contains(&lower.as_str())
}

/// What the narration collaborator receives for one announced hazard
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub track_id: u64,
    pub label: String,
    pub direction: Direction,
    pub distance: Option<DistanceBucket>,
    pub motion: MotionClass,
    pub risk: RiskLevel,
}

impl Alert {
    fn from_track(track: &Track) -> Self {
        Self {
            track_id: track.id,
            label: track.label.clone(),
            direction: Direction::from_center_x(track.center().x),
            distance: track.bucket(),
            motion: track.motion_class,
            risk: track.risk_level,
        }
    }

    /// Identity for duplicate suppression — the same object at the same
    /// risk in the same place is one warning, not a stream of them
    fn key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.label,
            self.direction.as_str(),
            self.risk.as_str()
        )
    }

    /// Plain description for logs; the narration service owns real phrasing
    pub fn describe(&self) -> String {
        let distance = self
            .distance
            .map(|d| d.as_str())
            .unwrap_or("UNKNOWN_DISTANCE");
        format!(
            "{} {} {} {}, {}",
            self.risk.as_str(),
            self.label,
            distance,
            self.direction.as_str(),
            self.motion.as_str()
        )
    }
}

/// Picks at most one announcement per cycle and debounces repeats
pub struct AlertGate {
    min_risk: RiskLevel,
    last_key: Option<String>,
}

impl AlertGate {
    pub fn new(config: &GuidanceConfig) -> Self {
        Self {
            min_risk: config.min_alert_risk,
            last_key: None,
        }
    }

    /// Highest-risk safety-relevant track this cycle, gated by the minimum
    /// risk and duplicate suppression. Ties on risk go to the nearer object.
    pub fn evaluate(&mut self, tracks: &[&Track]) -> Option<Alert> {
        let candidate = tracks
            .iter()
            .filter(|t| t.risk_level >= self.min_risk && is_safety_relevant(&t.label))
            .max_by_key(|t| {
                let proximity = 3 - t.bucket().map(|b| b.rank()).unwrap_or(3);
                (t.risk_level, proximity)
            })?;

        let alert = Alert::from_track(candidate);
        let key = alert.key();
        if self.last_key.as_deref() == Some(key.as_str()) {
            debug!("Suppressing repeated alert: {}", key);
            return None;
        }
        self.last_key = Some(key);
        Some(alert)
    }

    /// Forgets the last announcement, e.g. when the narrator goes quiet
    pub fn reset(&mut self) {
        self.last_key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, Detection};

    fn track(id: u64, label: &str, x: f32, bucket: Option<DistanceBucket>, risk: RiskLevel) -> Track {
        let det = Detection::new(
            label,
            0.9,
            BBox::new(x - 0.05, 0.4, x + 0.05, 0.6).unwrap(),
            bucket,
            None,
            0.0,
        );
        let mut t = Track::new(id, &det);
        t.risk_level = risk;
        t
    }

    fn gate() -> AlertGate {
        AlertGate::new(&GuidanceConfig::default())
    }

    #[test]
    fn test_below_minimum_risk_is_quiet() {
        let mut g = gate();
        let t = track(1, "person", 0.5, Some(DistanceBucket::Close), RiskLevel::Low);
        assert!(g.evaluate(&[&t]).is_none());
    }

    #[test]
    fn test_highest_risk_track_wins() {
        let mut g = gate();
        let low = track(1, "person", 0.2, Some(DistanceBucket::Moderate), RiskLevel::Medium);
        let high = track(2, "car", 0.8, Some(DistanceBucket::VeryClose), RiskLevel::Imminent);
        let alert = g.evaluate(&[&low, &high]).unwrap();
        assert_eq!(alert.track_id, 2);
        assert_eq!(alert.direction, Direction::Right);
    }

    #[test]
    fn test_duplicate_alert_suppressed_until_it_changes() {
        let mut g = gate();
        let t = track(1, "car", 0.5, Some(DistanceBucket::Close), RiskLevel::High);
        assert!(g.evaluate(&[&t]).is_some());
        assert!(g.evaluate(&[&t]).is_none());

        // escalation changes the key, so it speaks again
        let t = track(1, "car", 0.5, Some(DistanceBucket::VeryClose), RiskLevel::Imminent);
        assert!(g.evaluate(&[&t]).is_some());
    }

    #[test]
    fn test_non_safety_labels_ignored() {
        let mut g = gate();
        let t = track(1, "potted plant", 0.5, Some(DistanceBucket::VeryClose), RiskLevel::Imminent);
        assert!(g.evaluate(&[&t]).is_none());
    }

    #[test]
    fn test_describe_reads_naturally_enough_for_logs() {
        let t = track(1, "person", 0.2, Some(DistanceBucket::VeryClose), RiskLevel::Imminent);
        let alert = Alert::from_track(&t);
        assert_eq!(alert.describe(), "IMMINENT person VERY_CLOSE left, STATIONARY");
    }
}
