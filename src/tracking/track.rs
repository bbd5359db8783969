use std::collections::VecDeque;

use serde::Serialize;
use tracing::warn;

use crate::types::{Detection, DistanceBucket, MotionClass, Point, RiskLevel};

/// One confirmed sighting of a tracked object
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Observation {
    pub center: Point,
    /// Seconds; strictly increasing within a track's history
    pub timestamp: f64,
    pub bucket: Option<DistanceBucket>,
    /// Normalized bbox area, kept as the depth-proxy for approach detection
    pub area: f32,
}

/// A persisted estimate of one physical object's position over time.
///
/// Owned exclusively by the `TrackStore`; the id is assigned once at
/// creation and never reused, so downstream consumers (narration, UI
/// overlays) can key on it across cycles.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub id: u64,
    /// Sticky category — association never crosses labels
    pub label: String,
    pub history: VecDeque<Observation>,
    /// Smoothed velocity, normalized units per second
    pub velocity: Point,
    pub motion_class: MotionClass,
    /// Center extrapolated to now + horizon
    pub predicted_position: Point,
    /// Reported (debounced) risk level
    pub risk_level: RiskLevel,
    /// Consecutive processed cycles with no matching detection
    pub missed_frames: u32,
    pub last_seen: f64,
    /// Consecutive cycles the computed risk sat below the reported level
    #[serde(skip)]
    pub(crate) deescalation_streak: u32,
}

impl Track {
    pub fn new(id: u64, det: &Detection) -> Self {
        let mut history = VecDeque::with_capacity(8);
        history.push_back(Observation {
            center: det.center,
            timestamp: det.timestamp,
            bucket: det.distance_bucket,
            area: det.bbox.area(),
        });
        Self {
            id,
            label: det.label.clone(),
            history,
            velocity: Point::default(),
            motion_class: MotionClass::Stationary,
            predicted_position: det.center,
            risk_level: RiskLevel::None,
            missed_frames: 0,
            last_seen: det.timestamp,
            deescalation_streak: 0,
        }
    }

    /// Most recently observed center. History is never empty.
    pub fn center(&self) -> Point {
        self.history.back().expect("track history is never empty").center
    }

    /// Distance bucket from the latest observation
    pub fn bucket(&self) -> Option<DistanceBucket> {
        self.history.back().and_then(|o| o.bucket)
    }

    /// Appends an observation, enforcing strict time ordering and the
    /// retention window. Returns false (and drops the sample) when the
    /// timestamp does not advance.
    pub fn push_observation(&mut self, obs: Observation, retention: usize) -> bool {
        if let Some(last) = self.history.back() {
            if obs.timestamp <= last.timestamp {
                warn!(
                    "Track {}: non-increasing timestamp {:.3} <= {:.3}, sample dropped",
                    self.id, obs.timestamp, last.timestamp
                );
                return false;
            }
        }
        self.history.push_back(obs);
        while self.history.len() > retention.max(2) {
            self.history.pop_front();
        }
        true
    }

    pub fn mark_missed(&mut self) {
        self.missed_frames += 1;
    }

    /// Raw velocity from the two most recent observations, None with fewer
    pub fn instantaneous_velocity(&self) -> Option<Point> {
        if self.history.len() < 2 {
            return None;
        }
        let b = self.history[self.history.len() - 1];
        let a = self.history[self.history.len() - 2];
        let dt = (b.timestamp - a.timestamp) as f32;
        if dt <= 0.0 {
            return None;
        }
        Some(Point::new(
            (b.center.x - a.center.x) / dt,
            (b.center.y - a.center.y) / dt,
        ))
    }

    /// Change in bucket ordinal rank across the retained window
    /// (negative = moving nearer). None until two bucketed observations exist.
    pub fn bucket_rank_trend(&self) -> Option<i8> {
        let mut ranks = self.history.iter().filter_map(|o| o.bucket.map(|b| b.rank()));
        let first = ranks.next()?;
        let last = ranks.last()?;
        Some(last as i8 - first as i8)
    }

    /// Bbox area ratio, newest over oldest in the window. None with a
    /// single observation.
    pub fn area_growth(&self) -> Option<f32> {
        if self.history.len() < 2 {
            return None;
        }
        let first = self.history.front()?.area;
        let last = self.history.back()?.area;
        if first > f32::EPSILON {
            Some(last / first)
        } else {
            None
        }
    }
}
