// src/tracking/association.rs
//
// Frame-to-frame matching between the current cycle's detections and the
// live track set. Greedy nearest-first on center distance, gated by label
// agreement — a chair detection never updates a person track. Greedy is
// sufficient here: cycles are infrequent (~1 Hz) and same-label objects
// rarely contest the same neighborhood.

use super::store::TrackStore;
use crate::types::Detection;

#[derive(Debug, Default)]
pub struct Association {
    /// (track id, detection index) pairs, one-to-one both ways
    pub matches: Vec<(u64, usize)>,
    /// Detection indices that matched no track → spawn new tracks
    pub unmatched_detections: Vec<usize>,
    /// Track ids that matched no detection → coast
    pub unmatched_tracks: Vec<u64>,
}

/// Resolves eligible (same label, distance below `max_distance`) pairs by
/// ascending distance. The candidate list is built in (track id, detection
/// arrival) order and sorted stably, so tied distances resolve the same
/// way on every run.
pub fn associate(store: &TrackStore, detections: &[Detection], max_distance: f32) -> Association {
    let mut candidates: Vec<(u64, usize, f32)> = Vec::new();
    for track in store.get_all() {
        let track_center = track.center();
        for (di, det) in detections.iter().enumerate() {
            if det.label != track.label {
                continue;
            }
            let dist = det.center.distance_to(track_center);
            if dist < max_distance {
                candidates.push((track.id, di, dist));
            }
        }
    }

    candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut matched_dets = vec![false; detections.len()];
    let mut result = Association::default();
    for (track_id, di, _dist) in candidates {
        if matched_dets[di] || result.matches.iter().any(|(tid, _)| *tid == track_id) {
            continue;
        }
        matched_dets[di] = true;
        result.matches.push((track_id, di));
    }

    result.unmatched_detections = (0..detections.len()).filter(|&i| !matched_dets[i]).collect();
    result.unmatched_tracks = store
        .get_all()
        .map(|t| t.id)
        .filter(|id| !result.matches.iter().any(|(tid, _)| tid == id))
        .collect();

    result
}
