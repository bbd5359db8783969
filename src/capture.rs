// src/capture.rs
//
// Recorded detection captures: the offline stand-in for the live
// camera → detector → depth pipeline. A capture is a JSONL file, one cycle
// per line; the replay harness feeds cycles through the engine and writes
// the annotated track state back out as JSONL for the narration/UI
// collaborators (or for inspection).

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::guidance::Alert;
use crate::normalizer::RawDetection;
use crate::tracking::Track;

/// One recorded cycle: everything the detector emitted for one frame
#[derive(Debug, Deserialize)]
pub struct CycleRecord {
    /// Capture time, seconds
    pub timestamp: f64,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// One annotated cycle written back out
#[derive(Debug, Serialize)]
pub struct CycleOutput<'a> {
    pub timestamp: f64,
    pub tracks: &'a [&'a Track],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<&'a Alert>,
}

/// Recursively finds capture files (.jsonl) under the input directory,
/// sorted for a reproducible processing order
pub fn find_capture_files(input_dir: &str) -> Result<Vec<PathBuf>> {
    let mut captures = Vec::new();

    for entry in WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
            captures.push(path.to_path_buf());
        }
    }

    captures.sort();
    info!("Found {} capture file(s) in {}", captures.len(), input_dir);
    Ok(captures)
}

/// Reads all cycles from a capture file. Unparseable lines are skipped with
/// a warning — one corrupt cycle must not discard a whole session.
pub fn read_capture(path: &Path) -> Result<Vec<CycleRecord>> {
    let file =
        File::open(path).with_context(|| format!("opening capture {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut cycles = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CycleRecord>(&line) {
            Ok(cycle) => cycles.push(cycle),
            Err(e) => warn!(
                "{}:{}: skipping malformed cycle: {}",
                path.display(),
                lineno + 1,
                e
            ),
        }
    }
    Ok(cycles)
}

pub struct OutputWriter {
    file: File,
    path: PathBuf,
}

impl OutputWriter {
    pub fn create(output_dir: &str, capture_path: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir)?;
        let stem = capture_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("capture");
        let path = Path::new(output_dir).join(format!("{}_tracks.jsonl", stem));
        let file = File::create(&path)
            .with_context(|| format!("creating output {}", path.display()))?;
        Ok(Self { file, path })
    }

    pub fn write_cycle(&mut self, output: &CycleOutput) -> Result<()> {
        let line = serde_json::to_string(output)?;
        writeln!(self.file, "{}", line)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.file.flush()?;
        Ok(self.path)
    }
}
