/*!
 * Quality Source
 * Per-point quality draws for synthesized minutiae
 */

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

pub const QUALITY_FLOOR: f64 = 0.6;
pub const QUALITY_CEILING: f64 = 1.0;

/// Supplies the quality of each synthesized minutia, in `[0.6, 1.0)`.
///
/// `ThreadRngQuality` is the production source. `FixedQuality` and
/// `ScriptedQuality` exist so callers and tests can pin the draws.
pub trait QualitySource: Send + Sync {
    fn draw(&self) -> f64;
}

/// Production source: a fresh uniform draw from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngQuality;

impl QualitySource for ThreadRngQuality {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen_range(QUALITY_FLOOR..QUALITY_CEILING)
    }
}

/// Always returns the same value. Intended for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedQuality(pub f64);

impl QualitySource for FixedQuality {
    fn draw(&self) -> f64 {
        self.0
    }
}

/// Replays a fixed sequence of values, wrapping around at the end. Intended
/// for tests.
#[derive(Debug)]
pub struct ScriptedQuality {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

impl ScriptedQuality {
    /// An empty script behaves like `FixedQuality(0.6)`.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl QualitySource for ScriptedQuality {
    fn draw(&self) -> f64 {
        if self.values.is_empty() {
            return QUALITY_FLOOR;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.values[idx % self.values.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_rng_stays_in_range() {
        let source = ThreadRngQuality;
        for _ in 0..1000 {
            let q = source.draw();
            assert!((QUALITY_FLOOR..QUALITY_CEILING).contains(&q));
        }
    }

    #[test]
    fn scripted_wraps_around() {
        let source = ScriptedQuality::new(vec![0.7, 0.8]);
        let drawn: Vec<f64> = (0..5).map(|_| source.draw()).collect();
        assert_eq!(drawn, vec![0.7, 0.8, 0.7, 0.8, 0.7]);
        assert_eq!(ScriptedQuality::new(Vec::new()).draw(), QUALITY_FLOOR);
    }
}
