//! Defect sources feeding fault injection.
//!
//! An [`ErrorSource`] hands out i.i.d. memristor faults. [`RandomErrorGen`]
//! draws them from a seeded categorical distribution; [`ScriptedSource`]
//! replays a fixed sequence for regression fixtures.

use ftrm_common::config::{Probabilities, ProbabilityError};
use ftrm_common::fault::Fault;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplier of memristor faults.
pub trait ErrorSource {
    /// Draw the fault of one memristor.
    fn sample(&mut self) -> Fault;

    /// Draw the faults of one 2T2R cell as `(pull_up, pull_down)`.
    fn sample_pair(&mut self) -> (Fault, Fault) {
        let pull_up = self.sample();
        let pull_down = self.sample();
        (pull_up, pull_down)
    }
}

impl<S: ErrorSource + ?Sized> ErrorSource for &mut S {
    fn sample(&mut self) -> Fault {
        (**self).sample()
    }

    fn sample_pair(&mut self) -> (Fault, Fault) {
        (**self).sample_pair()
    }
}

// ─── Random Source ──────────────────────────────────────────────────

/// Seeded categorical fault sampler.
///
/// Absolute probabilities are stored as cumulative thresholds in the order
/// UD, SA0, SA1; a uniform draw above the last threshold is fault-free.
#[derive(Debug, Clone)]
pub struct RandomErrorGen {
    probabilities: Probabilities,
    cum_ud: f64,
    cum_sa0: f64,
    cum_sa1: f64,
    rng: StdRng,
}

impl RandomErrorGen {
    /// Create a sampler with the given absolute defect probabilities.
    ///
    /// # Errors
    /// `ProbabilityError` if a probability lies outside `[0, 1]` or the sum
    /// exceeds one.
    pub fn new(probabilities: Probabilities, seed: u64) -> Result<Self, ProbabilityError> {
        probabilities.validate()?;
        let cum_ud = probabilities.p_ud;
        let cum_sa0 = cum_ud + probabilities.p_sa0;
        let cum_sa1 = cum_sa0 + probabilities.p_sa1;
        Ok(Self {
            probabilities,
            cum_ud,
            cum_sa0,
            cum_sa1,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Same probability `p` for SA0, SA1 and UD.
    pub fn uniform(p: f64, seed: u64) -> Result<Self, ProbabilityError> {
        Self::new(Probabilities::uniform(p), seed)
    }

    /// Absolute probabilities this sampler was built with.
    pub const fn probabilities(&self) -> Probabilities {
        self.probabilities
    }
}

impl ErrorSource for RandomErrorGen {
    fn sample(&mut self) -> Fault {
        let u: f64 = self.rng.r#gen();
        if u < self.cum_ud {
            Fault::UD
        } else if u < self.cum_sa0 {
            Fault::SA0
        } else if u < self.cum_sa1 {
            Fault::SA1
        } else {
            Fault::FF
        }
    }
}

// ─── Scripted Source ────────────────────────────────────────────────

/// Replays a fixed fault sequence, wrapping around at the end.
///
/// An empty script yields fault-free memristors forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: Vec<Fault>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Fault>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Source that never injects a defect.
    pub fn fault_free() -> Self {
        Self::default()
    }

    /// Number of faults handed out so far.
    pub const fn drawn(&self) -> usize {
        self.cursor
    }
}

impl ErrorSource for ScriptedSource {
    fn sample(&mut self) -> Fault {
        if self.script.is_empty() {
            self.cursor += 1;
            return Fault::FF;
        }
        let fault = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        fault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let p = Probabilities::uniform(0.2);
        let mut a = RandomErrorGen::new(p, 1234).unwrap();
        let mut b = RandomErrorGen::new(p, 1234).unwrap();
        let seq_a: Vec<Fault> = (0..500).map(|_| a.sample()).collect();
        let seq_b: Vec<Fault> = (0..500).map(|_| b.sample()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn different_seed_different_sequence() {
        let p = Probabilities::uniform(0.2);
        let mut a = RandomErrorGen::new(p, 1).unwrap();
        let mut b = RandomErrorGen::new(p, 2).unwrap();
        let seq_a: Vec<Fault> = (0..500).map(|_| a.sample()).collect();
        let seq_b: Vec<Fault> = (0..500).map(|_| b.sample()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn zero_probabilities_never_fault() {
        let mut source = RandomErrorGen::new(Probabilities::default(), 9).unwrap();
        assert!((0..1000).all(|_| source.sample() == Fault::FF));
    }

    #[test]
    fn certain_ud_always_ud() {
        let mut source = RandomErrorGen::new(Probabilities::undefined_only(1.0), 9).unwrap();
        assert!((0..1000).all(|_| source.sample() == Fault::UD));
    }

    #[test]
    fn only_requested_kinds_appear() {
        let p = Probabilities {
            p_sa0: 0.3,
            p_sa1: 0.0,
            p_ud: 0.0,
        };
        let mut source = RandomErrorGen::new(p, 5).unwrap();
        let draws: Vec<Fault> = (0..2000).map(|_| source.sample()).collect();
        assert!(draws.iter().all(|f| matches!(f, Fault::FF | Fault::SA0)));
        let sa0 = draws.iter().filter(|f| **f == Fault::SA0).count();
        // 0.3 * 2000 = 600; allow generous slack.
        assert!((450..750).contains(&sa0), "sa0 count {sa0}");
    }

    #[test]
    fn rejects_invalid_probabilities() {
        assert!(matches!(
            RandomErrorGen::uniform(0.5, 0),
            Err(ProbabilityError::SumExceedsOne { .. })
        ));
        assert!(matches!(
            RandomErrorGen::new(
                Probabilities {
                    p_ud: -0.1,
                    ..Default::default()
                },
                0
            ),
            Err(ProbabilityError::OutOfRange { name: "p_ud", .. })
        ));
        assert!(matches!(
            RandomErrorGen::new(Probabilities::undefined_only(f64::NAN), 0),
            Err(ProbabilityError::OutOfRange { .. })
        ));
    }

    #[test]
    fn probabilities_are_reported_absolute() {
        let p = Probabilities {
            p_sa0: 0.1,
            p_sa1: 0.2,
            p_ud: 0.05,
        };
        let source = RandomErrorGen::new(p, 0).unwrap();
        assert_eq!(source.probabilities(), p);
    }

    #[test]
    fn scripted_source_wraps() {
        let mut source = ScriptedSource::new(vec![Fault::SA0, Fault::UD]);
        assert_eq!(source.sample_pair(), (Fault::SA0, Fault::UD));
        assert_eq!(source.sample(), Fault::SA0);
        assert_eq!(source.drawn(), 3);
    }

    #[test]
    fn empty_script_is_fault_free() {
        let mut source = ScriptedSource::fault_free();
        assert_eq!(source.sample_pair(), (Fault::FF, Fault::FF));
    }
}
