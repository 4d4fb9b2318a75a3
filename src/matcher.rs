/*!
 * Template Engine - Compare
 * Similarity scoring between two signed templates
 */

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{EngineConfig, MatchTolerance};
use crate::error::{FingerprintError, Result};
use crate::template::{round2, verify_template, CompactMinutia, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Confidence {
    /// Buckets a final score; the boundaries are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Confidence::VeryHigh
        } else if score >= 0.8 {
            Confidence::High
        } else if score >= 0.7 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::None => "none",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
            Confidence::VeryHigh => "very_high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    HashMatch,
    MinutiaeComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    pub minutiae_score: f64,
    pub quality_factor: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "match")]
    pub is_match: bool,
    pub score: f64,
    pub confidence: Confidence,
    pub method: MatchMethod,
    /// Absent on the hash fast path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<MatchDetails>,
}

#[derive(Debug, Clone)]
pub struct Matcher {
    threshold: f64,
    tolerance: MatchTolerance,
}

impl Matcher {
    pub fn new(threshold: f64, tolerance: MatchTolerance) -> Self {
        Self {
            threshold,
            tolerance,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.match_threshold, config.tolerance)
    }

    pub fn compare(&self, a: &Template, b: &Template) -> Result<MatchResult> {
        if !verify_template(a) || !verify_template(b) {
            warn!("Template comparison refused: signature mismatch");
            return Err(FingerprintError::InvalidTemplateSignature);
        }

        if a.hash == b.hash {
            debug!("Templates share content hash, skipping minutiae comparison");
            return Ok(MatchResult {
                is_match: true,
                score: 1.0,
                confidence: Confidence::High,
                method: MatchMethod::HashMatch,
                details: None,
            });
        }

        let minutiae_score = compare_minutiae(&a.minutiae, &b.minutiae, &self.tolerance);
        let quality_factor = a.quality.min(b.quality);
        let final_score = minutiae_score * quality_factor;

        debug!(
            "Minutiae comparison: minutiae_score={:.2}, quality_factor={:.2}, score={:.2}",
            minutiae_score, quality_factor, final_score
        );

        Ok(MatchResult {
            is_match: final_score >= self.threshold,
            score: round2(final_score),
            confidence: Confidence::from_score(final_score),
            method: MatchMethod::MinutiaeComparison,
            details: Some(MatchDetails {
                minutiae_score: round2(minutiae_score),
                quality_factor: round2(quality_factor),
                threshold: self.threshold,
            }),
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Compare two templates with the default threshold and tolerances.
pub fn compare_templates(a: &Template, b: &Template) -> Result<MatchResult> {
    Matcher::default().compare(a, b)
}

/// Fraction of `set1` points that find a partner in `set2`, over the larger set.
///
/// Points in `set2` are not consumed, so one of them may pair with several
/// points of `set1`.
pub fn compare_minutiae(
    set1: &[CompactMinutia],
    set2: &[CompactMinutia],
    tolerance: &MatchTolerance,
) -> f64 {
    if set1.is_empty() || set2.is_empty() {
        return 0.0;
    }

    let matched = set1
        .iter()
        .filter(|m1| set2.iter().any(|m2| is_minutiae_match(m1, m2, tolerance)))
        .count();

    matched as f64 / set1.len().max(set2.len()) as f64
}

pub fn is_minutiae_match(
    m1: &CompactMinutia,
    m2: &CompactMinutia,
    tolerance: &MatchTolerance,
) -> bool {
    if m1.t != m2.t {
        return false;
    }

    let dx = f64::from(m1.x) - f64::from(m2.x);
    let dy = f64::from(m1.y) - f64::from(m2.y);
    if dx.hypot(dy) > tolerance.position {
        return false;
    }

    if (m1.a - m2.a).abs() > tolerance.angle {
        return false;
    }

    (m1.q - m2.q).abs() <= tolerance.quality
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: i32, y: i32, t: u8, a: f64, q: f64) -> CompactMinutia {
        CompactMinutia { x, y, t, a, q }
    }

    #[test]
    fn type_must_match_exactly() {
        let tol = MatchTolerance::default();
        assert!(!is_minutiae_match(
            &point(1, 1, 0, 0.5, 0.8),
            &point(1, 1, 1, 0.5, 0.8),
            &tol
        ));
    }

    #[test]
    fn tolerances_are_inclusive() {
        let tol = MatchTolerance::default();
        let base = point(100, 100, 0, 1.0, 0.8);
        assert!(is_minutiae_match(&base, &point(106, 108, 0, 1.0, 0.8), &tol));
        assert!(!is_minutiae_match(&base, &point(107, 108, 0, 1.0, 0.8), &tol));
        assert!(is_minutiae_match(&base, &point(100, 100, 0, 1.25, 0.8), &tol));
        assert!(!is_minutiae_match(&base, &point(100, 100, 0, 1.31, 0.8), &tol));
        assert!(is_minutiae_match(&base, &point(100, 100, 0, 1.0, 0.9), &tol));
        assert!(!is_minutiae_match(&base, &point(100, 100, 0, 1.0, 0.55), &tol));
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let tol = MatchTolerance::default();
        let low = point(i32::MIN, i32::MIN, 0, 1.0, 0.8);
        let high = point(i32::MAX, i32::MAX, 0, 1.0, 0.8);
        assert!(!is_minutiae_match(&low, &high, &tol));
        assert!(!is_minutiae_match(&high, &low, &tol));
        assert!(is_minutiae_match(&high, &high, &tol));
    }

    #[test]
    fn empty_sets_score_zero() {
        let tol = MatchTolerance::default();
        let one = [point(1, 1, 0, 0.0, 0.8)];
        assert_eq!(compare_minutiae(&[], &one, &tol), 0.0);
        assert_eq!(compare_minutiae(&one, &[], &tol), 0.0);
    }

    #[test]
    fn second_set_points_are_not_consumed() {
        let tol = MatchTolerance::default();
        let set1 = [
            point(50, 50, 0, 1.0, 0.8),
            point(52, 50, 0, 1.0, 0.8),
            point(54, 50, 0, 1.0, 0.8),
        ];
        let set2 = [
            point(51, 50, 0, 1.0, 0.8),
            point(200, 200, 0, 1.0, 0.8),
            point(10, 10, 1, 1.0, 0.8),
        ];
        // Every set1 point pairs with the same set2 point.
        assert_eq!(compare_minutiae(&set1, &set2, &tol), 1.0);
    }

    #[test]
    fn score_divides_by_larger_set() {
        let tol = MatchTolerance::default();
        let set1 = [point(50, 50, 0, 1.0, 0.8)];
        let set2 = [
            point(50, 50, 0, 1.0, 0.8),
            point(150, 150, 0, 1.0, 0.8),
            point(250, 10, 1, 1.0, 0.8),
            point(0, 250, 1, 1.0, 0.8),
        ];
        assert_eq!(compare_minutiae(&set1, &set2, &tol), 0.25);
    }

    #[test]
    fn confidence_buckets() {
        assert_eq!(Confidence::from_score(0.95), Confidence::VeryHigh);
        assert_eq!(Confidence::from_score(0.9), Confidence::VeryHigh);
        assert_eq!(Confidence::from_score(0.85), Confidence::High);
        assert_eq!(Confidence::from_score(0.7), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.69), Confidence::Low);
        assert_eq!(Confidence::VeryHigh.as_str(), "very_high");
    }

    #[test]
    fn match_result_serializes_with_wire_names() {
        let result = MatchResult {
            is_match: true,
            score: 1.0,
            confidence: Confidence::High,
            method: MatchMethod::HashMatch,
            details: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["match"], true);
        assert_eq!(value["confidence"], "high");
        assert_eq!(value["method"], "hash_match");
        assert!(value.get("details").is_none());
    }
}
