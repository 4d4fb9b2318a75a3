/*!
 * Fingerprint Engine
 * Feature extraction, signed templates, and template matching for
 * fingerprint enrollment and authentication
 */

pub mod config;
pub mod error;
pub mod features;
pub mod image;
pub mod matcher;
pub mod processor;
pub mod quality;
pub mod template;

pub use config::{EngineConfig, MatchTolerance};
pub use error::{FingerprintError, Result};
pub use features::{FeatureExtractor, FeatureSet, MinutiaKind, MinutiaPoint};
pub use image::{decode_image, image_to_base64};
pub use matcher::{
    compare_minutiae, compare_templates, is_minutiae_match, Confidence, MatchDetails,
    MatchMethod, MatchResult, Matcher,
};
pub use processor::{AuthenticationOutcome, EnrollmentOutcome, FingerprintProcessor};
pub use quality::{FixedQuality, QualitySource, ScriptedQuality, ThreadRngQuality};
pub use template::{
    build_template, verify_template, CompactMinutia, FingerPosition, Template, TemplateMetadata,
};
