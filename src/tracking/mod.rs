// Anticipatory Navigation Intelligence — the per-object temporal tracker.
//
// One cycle is a pure transform: (detections, now) → annotated track list.
// Everything here is synchronous and I/O-free; camera, detector, depth, and
// narration live outside the crate.

pub mod association;
pub mod engine;
pub mod motion;
pub mod predictor;
pub mod risk;
pub mod store;
pub mod track;

pub use engine::{has_imminent_risk, AniEngine};
pub use store::TrackStore;
pub use track::{Observation, Track};
