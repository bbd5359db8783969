// src/normalizer.rs
//
// Converts raw detector output into the canonical Detection records the
// tracker consumes. The detector and depth estimator live outside this
// process; whatever they emit is validated here so nothing malformed
// reaches the tracking cycle.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{BBox, Detection, DetectionConfig, DistanceBucket};

/// Raw per-object record as emitted by the detector+depth pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub label: String,
    pub confidence: f32,
    /// [x1, y1, x2, y2] normalized
    pub bbox: [f32; 4],
    /// Normalized depth, 0 = near, 1 = far
    #[serde(default)]
    pub depth: Option<f32>,
    /// Pre-bucketed distance, when the depth pipeline already classified it
    #[serde(default)]
    pub distance: Option<DistanceBucket>,
}

pub struct Normalizer {
    config: DetectionConfig,
}

impl Normalizer {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Normalizes one cycle's raw detections. Records that fail validation
    /// are skipped, never fatal — a degraded detector must not take the
    /// tracker down with it.
    pub fn normalize(&self, raw: &[RawDetection], timestamp: f64) -> Vec<Detection> {
        raw.iter()
            .filter_map(|r| self.normalize_one(r, timestamp))
            .collect()
    }

    fn normalize_one(&self, raw: &RawDetection, timestamp: f64) -> Option<Detection> {
        if !raw.confidence.is_finite() || raw.confidence < self.config.confidence_floor {
            debug!(
                "Dropping {} (conf {:.2} below floor {:.2})",
                raw.label, raw.confidence, self.config.confidence_floor
            );
            return None;
        }

        let [x1, y1, x2, y2] = raw.bbox;
        let Some(bbox) = BBox::new(x1, y1, x2, y2) else {
            warn!(
                "Dropping {} with degenerate bbox [{:.2},{:.2},{:.2},{:.2}]",
                raw.label, x1, y1, x2, y2
            );
            return None;
        };

        let depth = raw.depth.filter(|d| d.is_finite());
        let bucket = raw.distance.or_else(|| depth.map(DistanceBucket::from_depth));

        Some(Detection::new(
            raw.label.clone(),
            raw.confidence.min(1.0),
            bbox,
            bucket,
            depth,
            timestamp,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str, confidence: f32, bbox: [f32; 4]) -> RawDetection {
        RawDetection {
            label: label.to_string(),
            confidence,
            bbox,
            depth: None,
            distance: None,
        }
    }

    #[test]
    fn test_confidence_floor_applied() {
        let n = Normalizer::new(DetectionConfig {
            confidence_floor: 0.25,
        });
        let input = vec![
            raw("person", 0.9, [0.1, 0.1, 0.3, 0.5]),
            raw("person", 0.1, [0.5, 0.1, 0.7, 0.5]),
        ];
        let out = n.normalize(&input, 0.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 0.9);
    }

    #[test]
    fn test_degenerate_bbox_skipped_not_fatal() {
        let n = Normalizer::new(DetectionConfig::default());
        let input = vec![
            raw("chair", 0.8, [0.6, 0.4, 0.2, 0.5]), // inverted x
            raw("chair", 0.8, [0.1, 0.1, 0.3, 0.4]),
        ];
        let out = n.normalize(&input, 0.0);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_depth_derives_bucket_when_missing() {
        let n = Normalizer::new(DetectionConfig::default());
        let mut r = raw("car", 0.8, [0.2, 0.2, 0.6, 0.8]);
        r.depth = Some(0.2);
        let out = n.normalize(&[r], 1.0);
        assert_eq!(out[0].distance_bucket, Some(DistanceBucket::VeryClose));
        assert_eq!(out[0].depth_value, Some(0.2));
    }

    #[test]
    fn test_explicit_bucket_wins_over_depth() {
        let n = Normalizer::new(DetectionConfig::default());
        let mut r = raw("car", 0.8, [0.2, 0.2, 0.6, 0.8]);
        r.depth = Some(0.9);
        r.distance = Some(DistanceBucket::Close);
        let out = n.normalize(&[r], 1.0);
        assert_eq!(out[0].distance_bucket, Some(DistanceBucket::Close));
    }

    #[test]
    fn test_missing_depth_leaves_bucket_unknown() {
        let n = Normalizer::new(DetectionConfig::default());
        let out = n.normalize(&[raw("dog", 0.7, [0.4, 0.4, 0.6, 0.7])], 2.0);
        assert_eq!(out[0].distance_bucket, None);
    }

    #[test]
    fn test_center_derived_from_bbox() {
        let n = Normalizer::new(DetectionConfig::default());
        let out = n.normalize(&[raw("person", 0.9, [0.2, 0.4, 0.4, 0.8])], 0.0);
        assert!((out[0].center.x - 0.3).abs() < 1e-6);
        assert!((out[0].center.y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let n = Normalizer::new(DetectionConfig::default());
        assert!(n.normalize(&[], 0.0).is_empty());
    }
}
