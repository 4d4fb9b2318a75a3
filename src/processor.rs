/*!
 * Fingerprint Processor
 * Enrollment and authentication flows over the extractor and template engine
 */

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{FingerprintError, Result};
use crate::features::{FeatureExtractor, FeatureSet};
use crate::matcher::{Confidence, MatchDetails, MatchResult, Matcher};
use crate::quality::{QualitySource, ThreadRngQuality};
use crate::template::{self, Template, TemplateMetadata};

pub const ENROLLMENT_MESSAGE: &str = "Fingerprint processed successfully";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    pub quality: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub error_kind: Option<FingerprintError>,
}

impl EnrollmentOutcome {
    fn enrolled(template: Template, quality: f64) -> Self {
        Self {
            success: true,
            template: Some(template),
            quality,
            message: Some(ENROLLMENT_MESSAGE.to_string()),
            error: None,
            error_kind: None,
        }
    }

    fn failed(err: FingerprintError, quality: f64) -> Self {
        Self {
            success: false,
            template: None,
            quality,
            message: None,
            error: Some(err.to_string()),
            error_kind: Some(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOutcome {
    pub success: bool,
    pub authenticated: bool,
    pub score: f64,
    pub confidence: Confidence,
    pub quality: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<MatchDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub error_kind: Option<FingerprintError>,
}

impl AuthenticationOutcome {
    fn compared(result: MatchResult, quality: f64) -> Self {
        Self {
            success: true,
            authenticated: result.is_match,
            score: result.score,
            confidence: result.confidence,
            quality,
            details: result.details,
            error: None,
            error_kind: None,
        }
    }

    fn failed(err: FingerprintError, quality: f64) -> Self {
        Self {
            success: false,
            authenticated: false,
            score: 0.0,
            confidence: Confidence::None,
            quality,
            details: None,
            error: Some(err.to_string()),
            error_kind: Some(err),
        }
    }
}

/// Stateless engine facade. Cheap to build per call or share behind an `Arc`.
pub struct FingerprintProcessor {
    config: EngineConfig,
    quality: Arc<dyn QualitySource>,
    extractor: FeatureExtractor,
    matcher: Matcher,
}

impl FingerprintProcessor {
    pub fn new() -> Self {
        Self::with_parts(EngineConfig::default(), Arc::new(ThreadRngQuality))
    }

    pub fn with_config(self, config: EngineConfig) -> Self {
        Self::with_parts(config, self.quality)
    }

    /// Pin the per-point quality draws, e.g. to make tests reproducible.
    pub fn with_quality_source(self, quality: Arc<dyn QualitySource>) -> Self {
        Self::with_parts(self.config, quality)
    }

    fn with_parts(config: EngineConfig, quality: Arc<dyn QualitySource>) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.max_minutiae, Arc::clone(&quality)),
            matcher: Matcher::from_config(&config),
            config,
            quality,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn extract_features(&self, payload: &str) -> Result<FeatureSet> {
        self.extractor.extract(payload)
    }

    pub fn build_template(
        &self,
        features: &FeatureSet,
        metadata: &TemplateMetadata,
    ) -> Result<Template> {
        template::build_template(features, metadata, self.config.min_quality)
    }

    pub fn verify_template(&self, template: &Template) -> bool {
        template::verify_template(template)
    }

    pub fn compare_templates(&self, a: &Template, b: &Template) -> Result<MatchResult> {
        self.matcher.compare(a, b)
    }

    pub fn process_for_enrollment(
        &self,
        payload: &str,
        metadata: &TemplateMetadata,
    ) -> EnrollmentOutcome {
        info!(
            "Enrollment request: finger={}",
            metadata.finger_position.as_deref().unwrap_or(template::UNKNOWN_FINGER)
        );

        let features = match self.extract_features(payload) {
            Ok(features) => features,
            Err(err) => {
                warn!("Enrollment failed during extraction: {}", err);
                return EnrollmentOutcome::failed(err, 0.0);
            }
        };

        match self.build_template(&features, metadata) {
            Ok(template) => {
                info!(
                    "Enrollment succeeded: hash={}, quality={:.2}",
                    &template.hash[..12],
                    features.quality_score
                );
                EnrollmentOutcome::enrolled(template, features.quality_score)
            }
            Err(err) => {
                warn!("Enrollment failed: {}", err);
                EnrollmentOutcome::failed(err, features.quality_score)
            }
        }
    }

    pub fn process_for_authentication(
        &self,
        payload: &str,
        stored: &Template,
    ) -> AuthenticationOutcome {
        info!("Authentication request: finger={}", stored.finger_position);

        let features = match self.extract_features(payload) {
            Ok(features) => features,
            Err(err) => {
                warn!("Authentication failed during extraction: {}", err);
                return AuthenticationOutcome::failed(err, 0.0);
            }
        };

        let quality = features.quality_score;
        let result = self
            .build_template(&features, &TemplateMetadata::default())
            .and_then(|probe| self.compare_templates(&probe, stored));

        match result {
            Ok(result) => {
                info!(
                    "Authentication decided: authenticated={}, score={:.2}, method={:?}",
                    result.is_match, result.score, result.method
                );
                AuthenticationOutcome::compared(result, quality)
            }
            Err(err) => {
                warn!("Authentication failed: {}", err);
                AuthenticationOutcome::failed(err, quality)
            }
        }
    }
}

impl Default for FingerprintProcessor {
    fn default() -> Self {
        Self::new()
    }
}
