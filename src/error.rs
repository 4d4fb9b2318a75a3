/*!
 * Engine Errors
 * Every failure the fingerprint engine can report
 */

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FingerprintError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FingerprintError {
    /// Payload missing, not canonical base64, or otherwise undecodable.
    #[error("Invalid base64 image data: {0}")]
    InvalidImageData(String),

    #[error("Fingerprint quality too low: {score:.2} (minimum: {threshold})")]
    QualityTooLow { score: f64, threshold: f64 },

    /// One of the compared templates failed self-verification.
    #[error("Invalid template signature")]
    InvalidTemplateSignature,

    #[error("Template serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FingerprintError {
    fn from(err: serde_json::Error) -> Self {
        FingerprintError::Serialization(err.to_string())
    }
}
