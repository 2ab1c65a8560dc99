use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CONFIDENCE;
use crate::error::Result;

/// Tunable constants for spectral note extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// A bin must exceed this level (dB) to be picked as a peak.
    pub min_db: f32,
    /// Minimum spacing between accepted peaks, in bins.
    pub min_bin_distance: usize,
    /// A note ends at the first frame whose level drops below this (dB).
    pub decay_db: f32,
    /// How far past the onset to look for the decay, in seconds.
    pub max_duration_s: f64,
    /// Duration used when no decay is found inside the scan window.
    pub default_duration_s: f64,
    /// Notes are extended to at least this long.
    pub min_duration_s: f64,
    /// Level mapped to the lowest velocity.
    pub velocity_floor_db: f32,
    /// Velocity units per dB above `velocity_floor_db`.
    pub velocity_scale: f32,
    pub confidence: f32,
    /// Provenance written on every extracted note.
    pub source: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            min_db: -40.0,
            min_bin_distance: 2,
            decay_db: -50.0,
            max_duration_s: 2.0,
            default_duration_s: 0.5,
            min_duration_s: 0.0,
            velocity_floor_db: -60.0,
            velocity_scale: 2.0,
            confidence: DEFAULT_CONFIDENCE,
            source: "spectral_peaks".to_string(),
        }
    }
}

/// Matching tolerances for cross-source agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgreementConfig {
    /// Inclusive semitone distance.
    pub pitch_tolerance: u8,
    /// Inclusive onset distance in seconds.
    pub time_tolerance_s: f64,
}

impl Default for AgreementConfig {
    fn default() -> Self {
        AgreementConfig {
            pitch_tolerance: 1,
            time_tolerance_s: 0.05,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub agreement: AgreementConfig,
}

impl Config {
    /// Load a JSON config file. Keys that are absent keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
