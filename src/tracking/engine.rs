// src/tracking/engine.rs
//
// One ANI cycle: associate → update matched → spawn unmatched detections →
// coast unmatched tracks → annotate (motion, prediction, risk) → prune.
//
// The engine is a pure synchronous transform from (detections, now) to the
// annotated track list. It owns its track store outright — no globals, so
// multiple camera sessions (or parallel tests) never share state. Callers
// that drive cycles from multiple threads serialize on `&mut self`.

use tracing::{debug, info};

use super::association::associate;
use super::motion::MotionEstimator;
use super::predictor::Predictor;
use super::risk::RiskScorer;
use super::store::TrackStore;
use super::track::Track;
use crate::types::{Config, Detection, RiskLevel, TrackingConfig};

pub struct AniEngine {
    store: TrackStore,
    motion: MotionEstimator,
    predictor: Predictor,
    scorer: RiskScorer,
    tracking: TrackingConfig,
}

impl AniEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            store: TrackStore::new(),
            motion: MotionEstimator::new(config.tracking.clone()),
            predictor: Predictor::new(&config.prediction),
            scorer: RiskScorer::new(config.risk.clone()),
            tracking: config.tracking.clone(),
        }
    }

    /// Processes one batch of detections for one frame and returns the full
    /// live track list (including coasting tracks not matched this cycle),
    /// annotated and in id order. An empty batch is a normal cycle: every
    /// track coasts.
    pub fn process_cycle(&mut self, detections: &[Detection], now: f64) -> Vec<&Track> {
        let assoc = associate(&self.store, detections, self.tracking.max_tracking_distance);
        debug!(
            "Cycle t={:.2}: {} detections, {} matched, {} new, {} coasting",
            now,
            detections.len(),
            assoc.matches.len(),
            assoc.unmatched_detections.len(),
            assoc.unmatched_tracks.len()
        );

        for &(track_id, det_idx) in &assoc.matches {
            if let Some(track) = self.store.get_mut(track_id) {
                self.motion.observe(track, &detections[det_idx]);
            }
        }

        for &det_idx in &assoc.unmatched_detections {
            let det = &detections[det_idx];
            let id = self.store.next_id();
            info!(
                "🆕 Track {} created: {} at ({:.2},{:.2})",
                id, det.label, det.center.x, det.center.y
            );
            self.store.upsert(Track::new(id, det));
        }

        for &track_id in &assoc.unmatched_tracks {
            if let Some(track) = self.store.get_mut(track_id) {
                track.mark_missed();
            }
        }

        // Annotate every live track; coasting tracks are carried forward on
        // their extrapolated position, not a re-observation.
        for track in self.store.iter_mut() {
            track.motion_class = self.motion.classify(track);
            track.predicted_position = self.predictor.project(track);
            self.scorer.apply(track);
        }

        self.store.prune(self.tracking.max_missed_frames);

        self.store.get_all().collect()
    }

    /// Current live track list without advancing a cycle
    pub fn tracks(&self) -> Vec<&Track> {
        self.store.get_all().collect()
    }

    pub fn track_count(&self) -> usize {
        self.store.len()
    }
}

/// True when any track in a cycle's output carries IMMINENT risk
pub fn has_imminent_risk(tracks: &[&Track]) -> bool {
    tracks.iter().any(|t| t.risk_level == RiskLevel::Imminent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, DistanceBucket, MotionClass};

    fn det(
        label: &str,
        x: f32,
        y: f32,
        ts: f64,
        bucket: Option<DistanceBucket>,
    ) -> Detection {
        let half = 0.05;
        Detection::new(
            label,
            0.9,
            BBox::new(x - half, y - half, x + half, y + half).unwrap(),
            bucket,
            None,
            ts,
        )
    }

    fn engine() -> AniEngine {
        AniEngine::new(&Config::default())
    }

    fn engine_with(f: impl FnOnce(&mut Config)) -> AniEngine {
        let mut config = Config::default();
        f(&mut config);
        AniEngine::new(&config)
    }

    #[test]
    fn test_detection_spawns_track_with_stable_id() {
        let mut eng = engine();
        let out = eng.process_cycle(&[det("person", 0.5, 0.5, 0.0, None)], 0.0);
        assert_eq!(out.len(), 1);
        let id = out[0].id;

        let out = eng.process_cycle(&[det("person", 0.55, 0.5, 1.0, None)], 1.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, id);
        assert_eq!(out[0].history.len(), 2);
    }

    #[test]
    fn test_reappearing_object_gets_new_id() {
        let mut eng = engine();
        let out = eng.process_cycle(&[det("person", 0.5, 0.5, 0.0, None)], 0.0);
        let old_id = out[0].id;

        // gone long enough to be pruned
        for i in 1..=6 {
            eng.process_cycle(&[], i as f64);
        }
        assert_eq!(eng.track_count(), 0);

        let out = eng.process_cycle(&[det("person", 0.5, 0.5, 7.0, None)], 7.0);
        assert!(out[0].id > old_id);
    }

    #[test]
    fn test_empty_cycles_prune_everything() {
        let mut eng = engine();
        eng.process_cycle(
            &[
                det("person", 0.3, 0.5, 0.0, None),
                det("car", 0.7, 0.5, 0.0, None),
            ],
            0.0,
        );
        assert_eq!(eng.track_count(), 2);

        // max_missed_frames (5) + 1 empty cycles clears the store
        for i in 1..=6 {
            eng.process_cycle(&[], i as f64);
        }
        assert_eq!(eng.track_count(), 0);
    }

    #[test]
    fn test_coasting_track_survives_within_ceiling() {
        let mut eng = engine();
        eng.process_cycle(&[det("person", 0.5, 0.5, 0.0, None)], 0.0);
        for i in 1..=5 {
            let out = eng.process_cycle(&[], i as f64);
            assert_eq!(out.len(), 1, "cycle {} should still carry the track", i);
            assert_eq!(out[0].missed_frames, i as u32);
        }
    }

    #[test]
    fn test_coasting_position_is_extrapolated() {
        let mut eng = engine();
        eng.process_cycle(&[det("person", 0.3, 0.5, 0.0, None)], 0.0);
        eng.process_cycle(&[det("person", 0.4, 0.5, 1.0, None)], 1.0);
        // velocity 0.1/s; coast one cycle
        let out = eng.process_cycle(&[], 2.0);
        let t = &out[0];
        assert!(t.missed_frames == 1);
        // carried forward ahead of the last observed center
        assert!(t.predicted_position.x > t.center().x);
        assert!((t.predicted_position.x - (0.4 + 0.1 * 1.5)).abs() < 1e-5);
    }

    #[test]
    fn test_cycle_output_is_deterministic() {
        let detections = vec![
            det("person", 0.2, 0.5, 0.0, Some(DistanceBucket::Close)),
            det("person", 0.25, 0.5, 0.0, Some(DistanceBucket::Close)),
            det("car", 0.7, 0.5, 0.0, Some(DistanceBucket::Moderate)),
        ];
        let run = || {
            let mut eng = engine();
            eng.process_cycle(&detections, 0.0)
                .iter()
                .map(|t| (t.id, t.label.clone(), t.risk_level))
                .collect::<Vec<_>>()
        };
        let first = run();
        for _ in 0..5 {
            assert_eq!(run(), first);
        }
    }

    #[test]
    fn test_escalation_speed_single_cycle_to_imminent() {
        let mut eng = engine();
        eng.process_cycle(
            &[det("person", 0.5, 0.5, 0.0, Some(DistanceBucket::Close))],
            0.0,
        );
        let out = eng.process_cycle(
            &[det("person", 0.5, 0.45, 1.0, Some(DistanceBucket::VeryClose))],
            1.0,
        );
        assert_eq!(out[0].motion_class, MotionClass::Approaching);
        assert_eq!(out[0].risk_level, RiskLevel::Imminent);
        assert!(has_imminent_risk(&out));
    }

    #[test]
    fn test_scenario_approach() {
        // §8 approach scenario: head-on convergence over four seconds
        let mut eng = engine();
        let steps: [(f32, DistanceBucket); 4] = [
            (0.50, DistanceBucket::Close),
            (0.45, DistanceBucket::Close),
            (0.38, DistanceBucket::Close),
            (0.30, DistanceBucket::VeryClose),
        ];
        let mut last_risk = RiskLevel::None;
        let mut last_motion = MotionClass::Stationary;
        for (i, (y, bucket)) in steps.iter().enumerate() {
            let out = eng.process_cycle(
                &[det("person", 0.5, *y, i as f64, Some(*bucket))],
                i as f64,
            );
            last_risk = out[0].risk_level;
            last_motion = out[0].motion_class;
        }
        assert_eq!(last_motion, MotionClass::Approaching);
        assert_eq!(last_risk, RiskLevel::Imminent);
    }

    #[test]
    fn test_scenario_crossing() {
        // §8 crossing scenario: lateral pass at constant moderate distance.
        // De-escalation window shortened so the exit from the collision zone
        // is visible immediately.
        let mut eng = engine_with(|c| c.risk.deescalation_min_cycles = 1);
        let xs = [0.1f32, 0.3, 0.5, 0.7];
        let mut seen = Vec::new();
        for (i, x) in xs.iter().enumerate() {
            let out = eng.process_cycle(
                &[det(
                    "bicycle",
                    *x,
                    0.5,
                    i as f64,
                    Some(DistanceBucket::Moderate),
                )],
                i as f64,
            );
            seen.push((
                out[0].motion_class,
                out[0].risk_level,
                out[0].predicted_position,
            ));
        }

        // t=1: velocity 0.2/s, predicted x = 0.3 + 0.3 = 0.6 → inside zone
        assert_eq!(seen[1].0, MotionClass::Crossing);
        assert_eq!(seen[1].1, RiskLevel::Medium);

        // later cycles: prediction leaves the zone, risk falls away
        assert_eq!(seen[3].0, MotionClass::Crossing);
        assert!(seen[3].2.x > 0.6);
        assert!(seen[3].1 <= RiskLevel::Low);
    }

    #[test]
    fn test_deescalation_holds_high_after_qualifying_none() {
        let mut eng = engine_with(|c| c.risk.deescalation_min_cycles = 3);
        eng.process_cycle(
            &[det("car", 0.5, 0.5, 0.0, Some(DistanceBucket::Close))],
            0.0,
        );
        let out = eng.process_cycle(
            &[det("car", 0.5, 0.48, 1.0, Some(DistanceBucket::VeryClose))],
            1.0,
        );
        assert_eq!(out[0].risk_level, RiskLevel::Imminent);

        // object retreats to FAR and holds still: computed NONE, reported
        // stays up for the window
        let mut risks = Vec::new();
        for i in 2..=5 {
            let out = eng.process_cycle(
                &[det("car", 0.5, 0.48, i as f64, Some(DistanceBucket::Far))],
                i as f64,
            );
            risks.push(out[0].risk_level);
        }
        assert_eq!(risks[0], RiskLevel::Imminent);
        assert_eq!(risks[1], RiskLevel::Imminent);
        assert_eq!(risks[2], RiskLevel::None);
    }

    #[test]
    fn test_two_objects_same_label_keep_separate_tracks() {
        let mut eng = engine();
        let out = eng.process_cycle(
            &[
                det("person", 0.2, 0.5, 0.0, None),
                det("person", 0.8, 0.5, 0.0, None),
            ],
            0.0,
        );
        assert_eq!(out.len(), 2);
        let (left_id, right_id) = (out[0].id, out[1].id);

        // both drift slightly; nearest-first keeps identities apart
        let out = eng.process_cycle(
            &[
                det("person", 0.78, 0.5, 1.0, None),
                det("person", 0.22, 0.5, 1.0, None),
            ],
            1.0,
        );
        let left = out.iter().find(|t| t.id == left_id).unwrap();
        let right = out.iter().find(|t| t.id == right_id).unwrap();
        assert!((left.center().x - 0.22).abs() < 1e-6);
        assert!((right.center().x - 0.78).abs() < 1e-6);
    }
}
