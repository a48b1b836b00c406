use log::info;
use rand::Rng;

use crate::reading::level::{DetectionLevel, DETECTION_LEVELS};

/// Picks an index below `len`. Implemented for every [`rand::Rng`].
pub trait RandomSource {
    fn pick(&mut self, len: usize) -> usize;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn pick(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Holds the level currently shown on the status screen.
///
/// No measurement feeds the result: every reading is a uniform pick among the three levels.
pub struct DetectionPresenter<R: RandomSource> {
    source: R,
    current: DetectionLevel,
}

impl<R: RandomSource> DetectionPresenter<R> {
    /// Entering the screen takes a first reading.
    pub fn new(mut source: R) -> Self {
        let current = DETECTION_LEVELS[source.pick(DETECTION_LEVELS.len())];
        DetectionPresenter { source, current }
    }

    pub fn current(&self) -> DetectionLevel {
        self.current
    }

    pub fn simulate_reading(&mut self) -> DetectionLevel {
        self.current = DETECTION_LEVELS[self.source.pick(DETECTION_LEVELS.len())];
        info!("Simulated reading: {}", self.current);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Sequence(Vec<usize>);

    impl RandomSource for Sequence {
        fn pick(&mut self, len: usize) -> usize {
            self.0.remove(0) % len
        }
    }

    #[test]
    fn pinned_source_selects_deterministically() {
        let mut presenter = DetectionPresenter::new(Sequence(vec![2, 0, 1]));

        assert_eq!(presenter.current(), DetectionLevel::Danger);
        assert_eq!(presenter.simulate_reading(), DetectionLevel::Safe);
        assert_eq!(presenter.simulate_reading(), DetectionLevel::Warning);
        assert_eq!(presenter.current(), DetectionLevel::Warning);
    }

    #[test]
    fn outcomes_are_uniform() {
        const READINGS: usize = 30_000;
        let mut presenter = DetectionPresenter::new(StdRng::seed_from_u64(7));

        let mut counts: HashMap<DetectionLevel, usize> = HashMap::new();
        for _ in 0..READINGS {
            *counts.entry(presenter.simulate_reading()).or_default() += 1;
        }

        for level in DETECTION_LEVELS {
            let frequency = counts.get(&level).copied().unwrap_or(0) as f64 / READINGS as f64;
            assert!((frequency - 1.0 / 3.0).abs() < 0.02, "{} came up with frequency {}", level, frequency);
        }
    }
}
