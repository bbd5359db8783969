use super::track::Track;
use crate::types::{Point, PredictionConfig};

/// Linear position extrapolation over a fixed look-ahead window.
///
/// No acceleration model and no clamping: a prediction outside [0,1] is
/// meaningful downstream (a CROSSING object leaving the field of view).
pub struct Predictor {
    horizon_s: f32,
}

impl Predictor {
    pub fn new(config: &PredictionConfig) -> Self {
        Self {
            horizon_s: config.horizon_s,
        }
    }

    pub fn project(&self, track: &Track) -> Point {
        let c = track.center();
        Point::new(
            c.x + track.velocity.x * self.horizon_s,
            c.y + track.velocity.y * self.horizon_s,
        )
    }
}
