use std::collections::BTreeMap;

use tracing::info;

use super::track::Track;

/// The set of live tracks, keyed by persistent id.
///
/// BTreeMap keeps iteration in id order, so every traversal of the store is
/// deterministic — association candidates, cycle output, and test runs all
/// see tracks in the same sequence.
#[derive(Debug, Default)]
pub struct TrackStore {
    tracks: BTreeMap<u64, Track>,
    next_id: u64,
}

impl TrackStore {
    pub fn new() -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Issues a fresh id. Strictly increasing for the store's lifetime;
    /// pruned ids are never reissued.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Inserts a new track or replaces the existing one with the same id.
    /// Ids must come from `next_id()` — anything else is a programming
    /// error and trips loudly under test.
    pub fn upsert(&mut self, track: Track) {
        debug_assert!(
            track.id > 0 && track.id < self.next_id,
            "track id {} was never issued by this store",
            track.id
        );
        self.tracks.insert(track.id, track);
    }

    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    /// All live tracks in ascending id order
    pub fn get_all(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.values_mut()
    }

    /// Removes tracks whose missed-cycle count exceeds the ceiling.
    /// Returns how many were dropped.
    pub fn prune(&mut self, missed_frame_ceiling: u32) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|id, t| {
            if t.missed_frames > missed_frame_ceiling {
                info!(
                    "🗑️  Track {} ({}) pruned after {} missed cycles",
                    id, t.label, t.missed_frames
                );
                false
            } else {
                true
            }
        });
        before - self.tracks.len()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
