/*!
 * Feature Extractor
 * Turns a capture payload into synthetic minutiae, a content hash, and a quality score
 */

use std::f64::consts::PI;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::image::decode_image;
use crate::quality::{QualitySource, ThreadRngQuality};

const COUNT_WEIGHT: f64 = 0.6;
const POINT_QUALITY_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinutiaKind {
    RidgeEnding,
    Bifurcation,
}

impl MinutiaKind {
    /// Even coordinate sums are ridge endings, odd ones bifurcations.
    pub fn from_coordinates(x: u8, y: u8) -> Self {
        if (u16::from(x) + u16::from(y)) % 2 == 0 {
            MinutiaKind::RidgeEnding
        } else {
            MinutiaKind::Bifurcation
        }
    }

    /// Compact wire code used inside templates.
    pub fn code(self) -> u8 {
        match self {
            MinutiaKind::RidgeEnding => 0,
            MinutiaKind::Bifurcation => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinutiaPoint {
    pub x: u8,
    pub y: u8,
    pub kind: MinutiaKind,
    /// Radians.
    pub angle: f64,
    pub quality: f64,
}

impl MinutiaPoint {
    /// Geometry is fully determined by the coordinates; only quality is drawn.
    pub fn synthesize(x: u8, y: u8, quality: f64) -> Self {
        let sum = u16::from(x) + u16::from(y);
        Self {
            x,
            y,
            kind: MinutiaKind::from_coordinates(x, y),
            angle: f64::from(sum % 360) * (PI / 180.0),
            quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Hex SHA-256 of the raw capture bytes.
    pub content_hash: String,
    pub minutiae: Vec<MinutiaPoint>,
    pub quality_score: f64,
    pub feature_count: usize,
    pub extracted_at: DateTime<Utc>,
}

impl FeatureSet {
    /// Assemble a feature set from already-synthesized minutiae.
    pub fn new(content_hash: String, minutiae: Vec<MinutiaPoint>, max_minutiae: usize) -> Self {
        let quality_score = quality_score(&minutiae, max_minutiae);
        Self {
            content_hash,
            feature_count: minutiae.len(),
            minutiae,
            quality_score,
            extracted_at: Utc::now(),
        }
    }
}

pub struct FeatureExtractor {
    max_minutiae: usize,
    quality: Arc<dyn QualitySource>,
}

impl FeatureExtractor {
    pub fn new(max_minutiae: usize, quality: Arc<dyn QualitySource>) -> Self {
        Self {
            max_minutiae,
            quality,
        }
    }

    /// Decode a base64 (or data URL) payload and extract its features.
    pub fn extract(&self, payload: &str) -> Result<FeatureSet> {
        let bytes = decode_image(payload)?;
        Ok(self.extract_bytes(&bytes))
    }

    pub fn extract_bytes(&self, bytes: &[u8]) -> FeatureSet {
        let content_hash = content_hash(bytes);
        let minutiae = self.synthesize_minutiae(bytes);

        let features = FeatureSet::new(content_hash, minutiae, self.max_minutiae);
        debug!(
            "Extracted features: hash={}, minutiae={}, quality={:.2}",
            &features.content_hash[..12],
            features.feature_count,
            features.quality_score
        );
        features
    }

    /// Walk a SHA-512 of the bytes two digest bytes at a time: the first is
    /// `x`, the second `y`. Stops at the cap or when the digest runs out.
    pub fn synthesize_minutiae(&self, bytes: &[u8]) -> Vec<MinutiaPoint> {
        let digest = Sha512::digest(bytes);
        digest
            .chunks_exact(2)
            .take(self.max_minutiae)
            .map(|pair| MinutiaPoint::synthesize(pair[0], pair[1], self.quality.draw()))
            .collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(EngineConfig::default().max_minutiae, Arc::new(ThreadRngQuality))
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// `0.6 * min(count / cap, 1) + 0.4 * mean(point quality)`, or 0 with no minutiae.
pub fn quality_score(minutiae: &[MinutiaPoint], max_minutiae: usize) -> f64 {
    if minutiae.is_empty() || max_minutiae == 0 {
        return 0.0;
    }
    let count = minutiae.len() as f64;
    let count_score = (count / max_minutiae as f64).min(1.0);
    let mean_quality = minutiae.iter().map(|m| m.quality).sum::<f64>() / count;
    COUNT_WEIGHT * count_score + POINT_QUALITY_WEIGHT * mean_quality
}
