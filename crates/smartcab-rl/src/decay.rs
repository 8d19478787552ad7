//! Exploration decay schedules
//!
//! A [`DecaySchedule`] maps the current exploration rate and the training
//! trial number to the exploration rate for the next trial. Any
//! `Fn(f64, u32) -> f64` closure is a schedule too.

use tracing::debug;

/// Decay strategy for the exploration rate
pub trait DecaySchedule: Send + Sync {
    /// Exploration rate for training trial `trial` (1-based)
    fn next_epsilon(&self, epsilon: f64, trial: u32) -> f64;
}

impl<F> DecaySchedule for F
where
    F: Fn(f64, u32) -> f64 + Send + Sync,
{
    fn next_epsilon(&self, epsilon: f64, trial: u32) -> f64 {
        self(epsilon, trial)
    }
}

/// `epsilon * factor` every trial
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    pub factor: f64,
}

impl Exponential {
    pub const DEFAULT_FACTOR: f64 = 0.999;

    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl Default for Exponential {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FACTOR)
    }
}

impl DecaySchedule for Exponential {
    fn next_epsilon(&self, epsilon: f64, _trial: u32) -> f64 {
        epsilon * self.factor
    }
}

/// `epsilon - step` every trial
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linear {
    pub step: f64,
}

impl DecaySchedule for Linear {
    fn next_epsilon(&self, epsilon: f64, _trial: u32) -> f64 {
        epsilon - self.step
    }
}

/// `epsilon - 1 / t²`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InverseSquare;

impl DecaySchedule for InverseSquare {
    fn next_epsilon(&self, epsilon: f64, trial: u32) -> f64 {
        let t = f64::from(trial.max(1));
        epsilon - 1.0 / (t * t)
    }
}

/// `1 / t`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InverseTrial;

impl DecaySchedule for InverseTrial {
    fn next_epsilon(&self, _epsilon: f64, trial: u32) -> f64 {
        1.0 / f64::from(trial.max(1))
    }
}

/// Exploration rate, learning rate and trial counter, evolved once per trial
pub struct ParameterSchedule {
    epsilon: f64,
    alpha: f64,
    trial: u32,
    decay: Box<dyn DecaySchedule>,
}

impl ParameterSchedule {
    pub fn new(epsilon: f64, alpha: f64, decay: Box<dyn DecaySchedule>) -> Self {
        Self {
            epsilon,
            alpha,
            trial: 0,
            decay,
        }
    }

    /// Advance to the next trial.
    ///
    /// Testing trials freeze both rates at zero and leave the trial counter
    /// alone. Training trials bump the counter and decay epsilon.
    pub fn begin_trial(&mut self, testing: bool) {
        if testing {
            self.epsilon = 0.0;
            self.alpha = 0.0;
        } else {
            self.trial += 1;
            self.epsilon = self.decay.next_epsilon(self.epsilon, self.trial);
        }
        debug!(
            testing,
            trial = self.trial,
            epsilon = self.epsilon,
            alpha = self.alpha,
            "Parameters advanced"
        );
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Number of training trials started so far
    pub fn trial(&self) -> u32 {
        self.trial
    }

    /// Swap the decay strategy, keeping the current rates
    pub fn set_decay(&mut self, decay: Box<dyn DecaySchedule>) {
        self.decay = decay;
    }
}

impl std::fmt::Debug for ParameterSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterSchedule")
            .field("epsilon", &self.epsilon)
            .field("alpha", &self.alpha)
            .field("trial", &self.trial)
            .finish_non_exhaustive()
    }
}
