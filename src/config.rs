/*!
 * Engine Configuration
 * Quality gate, decision threshold, and minutiae tolerances
 */

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const MIN_QUALITY_ENV: &str = "FINGERPRINT_MIN_QUALITY";
pub const MATCH_THRESHOLD_ENV: &str = "FINGERPRINT_MATCH_THRESHOLD";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchTolerance {
    /// Maximum Euclidean distance between two points, in pixels.
    pub position: f64,
    /// Maximum absolute angle difference, in radians.
    pub angle: f64,
    pub quality: f64,
}

impl Default for MatchTolerance {
    fn default() -> Self {
        Self {
            position: 10.0,
            angle: 0.3,
            quality: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Templates are only built from captures scoring at least this much.
    pub min_quality: f64,
    /// Final scores at or above this value are a match.
    pub match_threshold: f64,
    pub max_minutiae: usize,
    pub tolerance: MatchTolerance,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_quality: 0.6,
            match_threshold: 0.7,
            max_minutiae: 40,
            tolerance: MatchTolerance::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults, overridden by `FINGERPRINT_MIN_QUALITY` and
    /// `FINGERPRINT_MATCH_THRESHOLD` when they are set to a number.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(value) = read_f64(&lookup, MIN_QUALITY_ENV) {
            config.min_quality = value;
        }
        if let Some(value) = read_f64(&lookup, MATCH_THRESHOLD_ENV) {
            config.match_threshold = value;
        }
        config
    }
}

fn read_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            warn!("Ignoring unparsable {}={}", key, raw);
            None
        }
    }
}
