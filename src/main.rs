// src/main.rs

use anyhow::Result;
use std::path::Path;
use tracing::{error, info, warn};

use pathsense::capture::{self, CycleOutput, OutputWriter};
use pathsense::guidance::AlertGate;
use pathsense::normalizer::Normalizer;
use pathsense::tracking::{has_imminent_risk, AniEngine};
use pathsense::types::{Config, RiskLevel};

fn main() -> Result<()> {
    let config = Config::load_or_default("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("pathsense={}", config.logging.level))
        .init();

    info!("🦯 PathSense navigation assistant starting");
    info!(
        "Tracking: max_distance={:.2}, max_missed={}, horizon={:.1}s, deescalation={} cycles",
        config.tracking.max_tracking_distance,
        config.tracking.max_missed_frames,
        config.prediction.horizon_s,
        config.risk.deescalation_min_cycles
    );

    let run_id = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    info!("Run id: {}", run_id);

    let captures = capture::find_capture_files(&config.capture.input_dir)?;
    if captures.is_empty() {
        error!("No capture files found in {}", config.capture.input_dir);
        return Ok(());
    }

    let mut totals = RunStats::default();

    for (idx, capture_path) in captures.iter().enumerate() {
        info!("========================================");
        info!(
            "Processing capture {}/{}: {}",
            idx + 1,
            captures.len(),
            capture_path.display()
        );

        match process_capture(capture_path, &config) {
            Ok(stats) => {
                info!("✓ Capture processed");
                info!("  Cycles: {}", stats.cycles);
                info!("  Detections accepted: {}", stats.detections);
                info!("  Tracks created: {}", stats.tracks_created);
                info!("  Peak concurrent tracks: {}", stats.peak_tracks);
                info!("  Alerts announced: {}", stats.alerts);
                if stats.imminent_cycles > 0 {
                    warn!("  🚨 Cycles with IMMINENT risk: {}", stats.imminent_cycles);
                } else {
                    info!("  🚨 Cycles with IMMINENT risk: 0");
                }
                totals.merge(&stats);
            }
            Err(e) => {
                error!("Failed to process {}: {}", capture_path.display(), e);
            }
        }
    }

    info!("========================================");
    info!("📊 Final report:");
    info!("  Captures: {}", captures.len());
    info!("  Total cycles: {}", totals.cycles);
    info!("  Total tracks created: {}", totals.tracks_created);
    info!("  Total alerts: {}", totals.alerts);
    if totals.imminent_cycles > 0 {
        warn!("  🚨 IMMINENT cycles: {}", totals.imminent_cycles);
    }

    Ok(())
}

#[derive(Default)]
struct RunStats {
    cycles: u64,
    detections: u64,
    tracks_created: u64,
    peak_tracks: usize,
    alerts: u64,
    imminent_cycles: u64,
}

impl RunStats {
    fn merge(&mut self, other: &RunStats) {
        self.cycles += other.cycles;
        self.detections += other.detections;
        self.tracks_created += other.tracks_created;
        self.peak_tracks = self.peak_tracks.max(other.peak_tracks);
        self.alerts += other.alerts;
        self.imminent_cycles += other.imminent_cycles;
    }
}

fn process_capture(capture_path: &Path, config: &Config) -> Result<RunStats> {
    let cycles = capture::read_capture(capture_path)?;
    info!("  {} cycle(s) loaded", cycles.len());

    // Fresh engine per capture — sessions never share tracker state
    let mut engine = AniEngine::new(config);
    let normalizer = Normalizer::new(config.detection.clone());
    let mut gate = AlertGate::new(&config.guidance);
    let mut writer = OutputWriter::create(&config.capture.output_dir, capture_path)?;

    let mut stats = RunStats::default();
    let mut last_high_water = 0u64;

    for cycle in &cycles {
        let detections = normalizer.normalize(&cycle.detections, cycle.timestamp);
        stats.detections += detections.len() as u64;

        let tracks = engine.process_cycle(&detections, cycle.timestamp);
        stats.cycles += 1;
        stats.peak_tracks = stats.peak_tracks.max(tracks.len());

        if let Some(max_id) = tracks.iter().map(|t| t.id).max() {
            if max_id > last_high_water {
                stats.tracks_created += max_id - last_high_water;
                last_high_water = max_id;
            }
        }

        if has_imminent_risk(&tracks) {
            stats.imminent_cycles += 1;
        }

        let alert = gate.evaluate(&tracks);
        if let Some(ref alert) = alert {
            if alert.risk >= RiskLevel::High {
                warn!("🔊 t={:.1}s: {}", cycle.timestamp, alert.describe());
            } else {
                info!("🔊 t={:.1}s: {}", cycle.timestamp, alert.describe());
            }
            stats.alerts += 1;
        }

        writer.write_cycle(&CycleOutput {
            timestamp: cycle.timestamp,
            tracks: &tracks,
            alert: alert.as_ref(),
        })?;
    }

    let out_path = writer.finish()?;
    info!("💾 Annotated tracks written to {}", out_path.display());

    Ok(stats)
}
