// src/tracking/motion.rs
//
// Per-track velocity estimation and motion classification.
//
// Velocity comes from the two most recent observations and is blended with
// the previous estimate (exponential smoothing) — instantaneous deltas from
// a noisy ~1 Hz detector produce false "approaching" spikes otherwise.
//
// Approach/recede detection does not trust planar velocity at all: monocular
// depth is not metrically calibrated frame-to-frame, so the signals are the
// distance-bucket rank trend across the window, with bbox area growth as the
// fallback when buckets are missing or flat.

use tracing::debug;

use super::track::{Observation, Track};
use crate::types::{Detection, MotionClass, Point, TrackingConfig};

pub struct MotionEstimator {
    config: TrackingConfig,
}

impl MotionEstimator {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    /// Folds a matched detection into the track: history append, velocity
    /// update, missed-counter reset.
    pub fn observe(&self, track: &mut Track, det: &Detection) {
        let pushed = track.push_observation(
            Observation {
                center: det.center,
                timestamp: det.timestamp,
                bucket: det.distance_bucket,
                area: det.bbox.area(),
            },
            self.config.history_len,
        );

        if pushed {
            if let Some(raw) = track.instantaneous_velocity() {
                let alpha = self.config.velocity_smoothing_factor;
                track.velocity = if track.history.len() >= 3 {
                    Point::new(
                        alpha * raw.x + (1.0 - alpha) * track.velocity.x,
                        alpha * raw.y + (1.0 - alpha) * track.velocity.y,
                    )
                } else {
                    // first computable estimate — nothing to blend with
                    raw
                };
            }
        }

        track.missed_frames = 0;
        track.last_seen = det.timestamp;
    }

    /// Classifies motion from the smoothed velocity and the window trends.
    /// Evaluation order is the risk precedence: a converging object is
    /// APPROACHING even if it is also cutting across the path.
    pub fn classify(&self, track: &Track) -> MotionClass {
        let v = track.velocity;
        let rank_trend = track.bucket_rank_trend();
        let area_growth = track.area_growth();

        let approaching = rank_trend.map_or(false, |d| d < 0)
            || area_growth.map_or(false, |g| g > self.config.approach_area_growth);
        if approaching {
            debug!(
                "Track {}: approaching (rank trend {:?}, area growth {:?})",
                track.id, rank_trend, area_growth
            );
            return MotionClass::Approaching;
        }

        if v.x.abs() > v.y.abs() && v.x.abs() >= self.config.crossing_velocity_threshold {
            return MotionClass::Crossing;
        }

        let receding = rank_trend.map_or(false, |d| d > 0)
            || area_growth.map_or(false, |g| g < 1.0 / self.config.approach_area_growth);
        if receding {
            return MotionClass::Receding;
        }

        if v.magnitude() >= self.config.stationary_velocity_threshold {
            MotionClass::Moving
        } else {
            MotionClass::Stationary
        }
    }
}
