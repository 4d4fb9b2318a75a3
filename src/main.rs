/**
 * Fingerprint Engine Demo
 * Enrolls a capture, then authenticates the same and a different capture
 *
 * Usage: fingerprint-engine [capture-file]
 */

use fingerprint_engine::{
    image_to_base64, EngineConfig, FingerPosition, FingerprintProcessor, TemplateMetadata,
};
use tracing::{error, info, warn};

const SAMPLE_CAPTURE: &[u8] = b"sample fingerprint capture: right index, 500 dpi";
const DIFFERENT_CAPTURE: &[u8] = b"different fingerprint capture: left thumb, 500 dpi";

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting fingerprint engine demo");

    let capture = match std::env::args().nth(1) {
        Some(path) => match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to read capture {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SAMPLE_CAPTURE.to_vec(),
    };

    let processor = FingerprintProcessor::new().with_config(EngineConfig::from_env());
    let payload = image_to_base64(&capture);

    let metadata = TemplateMetadata::for_finger(FingerPosition::RightIndex);
    let enrollment = processor.process_for_enrollment(&payload, &metadata);
    print_json("enrollment", &enrollment);

    let Some(stored) = enrollment.template else {
        warn!("Enrollment failed: {}", enrollment.error.unwrap_or_default());
        std::process::exit(1);
    };

    let same = processor.process_for_authentication(&payload, &stored);
    print_json("authentication (same capture)", &same);

    let other = image_to_base64(DIFFERENT_CAPTURE);
    let different = processor.process_for_authentication(&other, &stored);
    print_json("authentication (different capture)", &different);

    info!(
        "Template: hash={}..., signature={}..., created={}",
        &stored.hash[..16],
        stored.signature.as_deref().map(|s| &s[..16]).unwrap_or("-"),
        stored.created_at.to_rfc3339()
    );
    info!(
        "Minutiae sample: {}",
        serde_json::to_string(&stored.minutiae.iter().take(3).collect::<Vec<_>>())
            .unwrap_or_default()
    );
}

fn print_json<T: serde::Serialize>(label: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("== {}\n{}", label, json),
        Err(e) => error!("Failed to serialize {}: {}", label, e),
    }
}
