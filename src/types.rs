use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub tracking: TrackingConfig,
    pub prediction: PredictionConfig,
    pub risk: RiskConfig,
    pub guidance: GuidanceConfig,
    pub capture: CaptureConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detections below this confidence never reach the tracker
    pub confidence_floor: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Maximum center-to-center distance (normalized units) for a detection
    /// to claim an existing track. Generous because the effective frame rate
    /// is ~1 Hz and objects move a lot between processed frames.
    pub max_tracking_distance: f32,
    /// Consecutive missed cycles a track survives before it is pruned
    pub max_missed_frames: u32,
    /// Observations retained per track (velocity + trend window)
    pub history_len: usize,
    /// Weight of the newest raw velocity sample when blending with the
    /// previous estimate. Higher = faster response, lower = more stability.
    pub velocity_smoothing_factor: f32,
    /// Speeds below this (units/s) classify as STATIONARY
    pub stationary_velocity_threshold: f32,
    /// Minimum lateral speed (units/s) for CROSSING
    pub crossing_velocity_threshold: f32,
    /// Bbox area growth ratio across the window treated as approach evidence
    /// when distance buckets are missing or flat
    pub approach_area_growth: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_tracking_distance: 0.3,
            max_missed_frames: 5,
            history_len: 8,
            velocity_smoothing_factor: 0.4,
            stationary_velocity_threshold: 0.01,
            crossing_velocity_threshold: 0.05,
            approach_area_growth: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Forward extrapolation window in seconds
    pub horizon_s: f32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self { horizon_s: 1.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Consecutive cycles a lower risk must persist before the reported
    /// level drops. Escalation is always immediate.
    pub deescalation_min_cycles: u32,
    pub collision_zone: CollisionZone,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            deescalation_min_cycles: 3,
            collision_zone: CollisionZone::default(),
        }
    }
}

/// Central region of the frame representing the user's forward path
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionZone {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Default for CollisionZone {
    fn default() -> Self {
        Self {
            x_min: 0.4,
            x_max: 0.6,
            y_min: 0.3,
            y_max: 1.0,
        }
    }
}

impl CollisionZone {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    /// Alerts below this risk level are never announced
    pub min_alert_risk: RiskLevel,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            min_alert_risk: RiskLevel::Medium,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub input_dir: String,
    pub output_dir: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            input_dir: "captures".to_string(),
            output_dir: "output".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Axis-aligned box in normalized coordinates, x1 < x2 and y1 < y2
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    /// Clamps corners into [0,1]; returns None for degenerate boxes
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Self> {
        let (x1, y1) = (x1.clamp(0.0, 1.0), y1.clamp(0.0, 1.0));
        let (x2, y2) = (x2.clamp(0.0, 1.0), y2.clamp(0.0, 1.0));
        if x1 < x2 && y1 < y2 {
            Some(Self { x1, y1, x2, y2 })
        } else {
            None
        }
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }
}

// ============================================================================
// QUALITATIVE CATEGORIES
// ============================================================================

/// Coarse proximity category from monocular depth. Ordered nearest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBucket {
    VeryClose,
    Close,
    Moderate,
    Far,
}

impl DistanceBucket {
    /// Normalized depth (0 = near, 1 = far) → bucket
    pub fn from_depth(depth: f32) -> Self {
        if depth < 0.25 {
            Self::VeryClose
        } else if depth < 0.45 {
            Self::Close
        } else if depth < 0.70 {
            Self::Moderate
        } else {
            Self::Far
        }
    }

    /// Ordinal rank, 0 = nearest
    pub fn rank(&self) -> u8 {
        match self {
            Self::VeryClose => 0,
            Self::Close => 1,
            Self::Moderate => 2,
            Self::Far => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryClose => "VERY_CLOSE",
            Self::Close => "CLOSE",
            Self::Moderate => "MODERATE",
            Self::Far => "FAR",
        }
    }
}

/// Horizontal position relative to the camera center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Ahead,
    Right,
}

impl Direction {
    pub fn from_center_x(x: f32) -> Self {
        if x < 0.4 {
            Self::Left
        } else if x > 0.6 {
            Self::Right
        } else {
            Self::Ahead
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Ahead => "ahead",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionClass {
    Stationary,
    Approaching,
    Receding,
    Crossing,
    Moving,
}

impl MotionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stationary => "STATIONARY",
            Self::Approaching => "APPROACHING",
            Self::Receding => "RECEDING",
            Self::Crossing => "CROSSING",
            Self::Moving => "MOVING",
        }
    }
}

/// Collision risk, ordered so that escalation compares with `>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Imminent,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Imminent => "IMMINENT",
        }
    }
}

// ============================================================================
// DETECTION
// ============================================================================

/// One normalized detection for one processed frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BBox,
    pub center: Point,
    pub distance_bucket: Option<DistanceBucket>,
    pub depth_value: Option<f32>,
    /// Capture time of the source frame, seconds
    pub timestamp: f64,
}

impl Detection {
    pub fn new(
        label: impl Into<String>,
        confidence: f32,
        bbox: BBox,
        distance_bucket: Option<DistanceBucket>,
        depth_value: Option<f32>,
        timestamp: f64,
    ) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
            center: bbox.center(),
            distance_bucket,
            depth_value,
            timestamp,
        }
    }
}
