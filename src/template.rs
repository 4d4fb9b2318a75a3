/*!
 * Template Engine - Build
 * Signed, versioned fingerprint templates built from extracted features
 */

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::error::{FingerprintError, Result};
use crate::features::FeatureSet;

pub const TEMPLATE_VERSION: &str = "1.0";
pub const TEMPLATE_ALGORITHM: &str = "simplified_minutiae";
pub const UNKNOWN_FINGER: &str = "unknown";

/// Anatomical finger labels used by enrollment callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FingerPosition {
    RightThumb,
    RightIndex,
    RightMiddle,
    RightRing,
    RightPinky,
    LeftThumb,
    LeftIndex,
    LeftMiddle,
    LeftRing,
    LeftPinky,
}

impl FingerPosition {
    pub const ALL: [FingerPosition; 10] = [
        FingerPosition::RightThumb,
        FingerPosition::RightIndex,
        FingerPosition::RightMiddle,
        FingerPosition::RightRing,
        FingerPosition::RightPinky,
        FingerPosition::LeftThumb,
        FingerPosition::LeftIndex,
        FingerPosition::LeftMiddle,
        FingerPosition::LeftRing,
        FingerPosition::LeftPinky,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FingerPosition::RightThumb => "rightThumb",
            FingerPosition::RightIndex => "rightIndex",
            FingerPosition::RightMiddle => "rightMiddle",
            FingerPosition::RightRing => "rightRing",
            FingerPosition::RightPinky => "rightPinky",
            FingerPosition::LeftThumb => "leftThumb",
            FingerPosition::LeftIndex => "leftIndex",
            FingerPosition::LeftMiddle => "leftMiddle",
            FingerPosition::LeftRing => "leftRing",
            FingerPosition::LeftPinky => "leftPinky",
        }
    }
}

impl fmt::Display for FingerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown finger position: {0}")]
pub struct ParseFingerPositionError(pub String);

impl FromStr for FingerPosition {
    type Err = ParseFingerPositionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FingerPosition::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseFingerPositionError(s.to_string()))
    }
}

/// Caller-supplied template metadata. The label is free-form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    pub finger_position: Option<String>,
}

impl TemplateMetadata {
    pub fn for_finger(position: FingerPosition) -> Self {
        Self::with_label(position.as_str())
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            finger_position: Some(label.into()),
        }
    }
}

/// Minutia as stored in a template: `t` is 0 for ridge endings and 1 for
/// bifurcations, `a` and `q` are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactMinutia {
    pub x: i32,
    pub y: i32,
    pub t: u8,
    pub a: f64,
    pub q: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub version: String,
    pub algorithm: String,
    pub quality: f64,
    pub minutiae_count: usize,
    pub hash: String,
    pub minutiae: Vec<CompactMinutia>,
    pub created_at: DateTime<Utc>,
    pub finger_position: String,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Every template field except the signature, in canonical order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedFields<'a> {
    version: &'a str,
    algorithm: &'a str,
    quality: f64,
    minutiae_count: usize,
    hash: &'a str,
    minutiae: &'a [CompactMinutia],
    created_at: &'a DateTime<Utc>,
    finger_position: &'a str,
}

impl<'a> From<&'a Template> for SignedFields<'a> {
    fn from(t: &'a Template) -> Self {
        Self {
            version: &t.version,
            algorithm: &t.algorithm,
            quality: t.quality,
            minutiae_count: t.minutiae_count,
            hash: &t.hash,
            minutiae: &t.minutiae,
            created_at: &t.created_at,
            finger_position: &t.finger_position,
        }
    }
}

impl Template {
    /// SHA-256 hex over the canonical JSON of every field but `signature`.
    pub fn compute_signature(&self) -> Result<String> {
        let canonical = serde_json::to_vec(&SignedFields::from(self))?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Recompute and store the signature.
    pub fn seal(&mut self) -> Result<()> {
        self.signature = Some(self.compute_signature()?);
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build and sign a template, refusing captures below `min_quality`.
pub fn build_template(
    features: &FeatureSet,
    metadata: &TemplateMetadata,
    min_quality: f64,
) -> Result<Template> {
    if features.quality_score < min_quality {
        return Err(FingerprintError::QualityTooLow {
            score: features.quality_score,
            threshold: min_quality,
        });
    }

    let minutiae = features
        .minutiae
        .iter()
        .map(|m| CompactMinutia {
            x: i32::from(m.x),
            y: i32::from(m.y),
            t: m.kind.code(),
            a: round2(m.angle),
            q: round2(m.quality),
        })
        .collect();

    let mut template = Template {
        version: TEMPLATE_VERSION.to_string(),
        algorithm: TEMPLATE_ALGORITHM.to_string(),
        quality: features.quality_score,
        minutiae_count: features.feature_count,
        hash: features.content_hash.clone(),
        minutiae,
        created_at: Utc::now(),
        finger_position: metadata
            .finger_position
            .clone()
            .unwrap_or_else(|| UNKNOWN_FINGER.to_string()),
        signature: None,
    };
    template.seal()?;

    debug!(
        "Built template: finger={}, minutiae={}, quality={:.2}",
        template.finger_position, template.minutiae_count, template.quality
    );
    Ok(template)
}

/// True only when a signature is present and matches the recomputed one.
pub fn verify_template(template: &Template) -> bool {
    let Some(stored) = template.signature.as_deref() else {
        return false;
    };
    if stored.is_empty() {
        return false;
    }
    match template.compute_signature() {
        Ok(expected) => expected == stored,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{MinutiaKind, MinutiaPoint};

    fn features_with_quality(score: f64) -> FeatureSet {
        let minutiae = vec![
            MinutiaPoint::synthesize(10, 20, 0.834),
            MinutiaPoint::synthesize(11, 20, 0.617),
        ];
        let mut features = FeatureSet::new("ab".repeat(32), minutiae, 40);
        features.quality_score = score;
        features
    }

    #[test]
    fn quality_gate_is_inclusive() {
        let err = build_template(&features_with_quality(0.59), &TemplateMetadata::default(), 0.6)
            .unwrap_err();
        assert_eq!(
            err,
            FingerprintError::QualityTooLow {
                score: 0.59,
                threshold: 0.6
            }
        );
        assert!(err.to_string().contains("0.59"));
        assert!(err.to_string().contains("0.6"));

        assert!(
            build_template(&features_with_quality(0.6), &TemplateMetadata::default(), 0.6).is_ok()
        );
    }

    #[test]
    fn template_fields_are_compacted() {
        let features = features_with_quality(0.75);
        let template = build_template(
            &features,
            &TemplateMetadata::for_finger(FingerPosition::LeftRing),
            0.6,
        )
        .unwrap();

        assert_eq!(template.version, "1.0");
        assert_eq!(template.algorithm, "simplified_minutiae");
        assert_eq!(template.quality, 0.75);
        assert_eq!(template.minutiae_count, 2);
        assert_eq!(template.hash, features.content_hash);
        assert_eq!(template.finger_position, "leftRing");

        let first = &template.minutiae[0];
        assert_eq!((first.x, first.y, first.t), (10, 20, 0));
        assert_eq!(first.a, 0.52);
        assert_eq!(first.q, 0.83);
        assert_eq!(template.minutiae[1].t, MinutiaKind::Bifurcation.code());
        assert_eq!(template.minutiae[1].q, 0.62);
    }

    #[test]
    fn missing_finger_defaults_to_unknown() {
        let template =
            build_template(&features_with_quality(0.7), &TemplateMetadata::default(), 0.6)
                .unwrap();
        assert_eq!(template.finger_position, UNKNOWN_FINGER);
    }

    #[test]
    fn any_mutation_breaks_the_signature() {
        let template =
            build_template(&features_with_quality(0.7), &TemplateMetadata::default(), 0.6)
                .unwrap();
        assert!(verify_template(&template));

        let mutations: [fn(&mut Template); 9] = [
            |t: &mut Template| t.version = "2.0".to_string(),
            |t: &mut Template| t.algorithm = "other".to_string(),
            |t: &mut Template| t.quality += 0.01,
            |t: &mut Template| t.minutiae_count += 1,
            |t: &mut Template| t.hash = "cd".repeat(32),
            |t: &mut Template| t.minutiae[0].q = 0.99,
            |t: &mut Template| {
                t.minutiae.pop();
            },
            |t: &mut Template| t.created_at = t.created_at + chrono::Duration::seconds(1),
            |t: &mut Template| t.finger_position = "rightThumb".to_string(),
        ];
        for mutate in mutations {
            let mut tampered = template.clone();
            mutate(&mut tampered);
            assert!(!verify_template(&tampered));
        }
    }

    #[test]
    fn absent_or_empty_signature_fails_verification() {
        let mut template =
            build_template(&features_with_quality(0.7), &TemplateMetadata::default(), 0.6)
                .unwrap();
        template.signature = None;
        assert!(!verify_template(&template));
        template.signature = Some(String::new());
        assert!(!verify_template(&template));
        template.seal().unwrap();
        assert!(verify_template(&template));
    }

    #[test]
    fn json_round_trip_keeps_signature_valid() {
        let template =
            build_template(&features_with_quality(0.7123), &TemplateMetadata::default(), 0.6)
                .unwrap();
        let raw = template.to_json().unwrap();
        assert!(raw.contains("\"minutiaeCount\":2"));
        assert!(raw.contains("\"fingerPosition\":\"unknown\""));

        let restored = Template::from_json(&raw).unwrap();
        assert_eq!(restored, template);
        assert!(verify_template(&restored));
    }

    #[test]
    fn unsigned_record_deserializes_but_does_not_verify() {
        let mut value = serde_json::to_value(
            build_template(&features_with_quality(0.7), &TemplateMetadata::default(), 0.6)
                .unwrap(),
        )
        .unwrap();
        value.as_object_mut().unwrap().remove("signature");

        let template: Template = serde_json::from_value(value).unwrap();
        assert_eq!(template.signature, None);
        assert!(!verify_template(&template));
    }

    #[test]
    fn finger_positions_parse_back() {
        for position in FingerPosition::ALL {
            assert_eq!(position.as_str().parse::<FingerPosition>(), Ok(position));
        }
        assert!("thumb".parse::<FingerPosition>().is_err());
    }
}
