//! Decides, at each proposed parametrization, whether another sample should
//! be drawn before trusting its fitness.

use crate::history::{mean, median, std_dev};

/// How the resampling/allow-resampling thresholds shrink as the run
/// progresses. Matches `resampling_policies.py`'s `__SCHEDULES__` dict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    Constant,
    Logarithmic,
    Exponential,
}

impl Schedule {
    pub fn eval(self, k: usize) -> f64 {
        let k = k as f64;
        match self {
            Schedule::Constant => 1.0,
            Schedule::Logarithmic => 1.0 / (1.0 + k).ln(),
            Schedule::Exponential => 0.98_f64.powf(k),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResamplingPolicy {
    /// Always resample the same parametrization until `n` samples have
    /// been collected for it.
    Simple { n: usize },
    /// Resample while the confidence interval half-width
    /// `1.96 * std / sqrt(n)` exceeds `schedule(total_nbr) * mean(fitness)`.
    DynamicParametric {
        schedule: Schedule,
        allow_resampling_schedule: Schedule,
        allow_resampling_start: usize,
    },
    /// Same gating, using the non-parametric half-width
    /// `1.253 * std / sqrt(n)` against the median.
    DynamicNonParametric {
        schedule: Schedule,
        allow_resampling_schedule: Schedule,
        allow_resampling_start: usize,
    },
}

impl ResamplingPolicy {
    /// `samples` is every fitness value already recorded for the
    /// parametrization under consideration, in draw order. `total_nbr` is
    /// the total number of evaluations performed by the optimizer so far.
    pub fn should_resample(&self, samples: &[f64], total_nbr: usize) -> bool {
        match self {
            ResamplingPolicy::Simple { n } => samples.len() < *n,
            ResamplingPolicy::DynamicParametric {
                schedule,
                allow_resampling_schedule,
                allow_resampling_start,
            } => {
                if samples.len() < 2 {
                    return true;
                }
                if total_nbr < *allow_resampling_start {
                    return false;
                }
                let center = mean(samples);
                let ic_length = 1.96 * std_dev(samples) / (samples.len() as f64).sqrt();
                let gate = allow_resampling_schedule.eval(total_nbr) * center;
                if ic_length.abs() <= gate.abs() {
                    return false;
                }
                let ic_threshold = (schedule.eval(total_nbr) * center).abs();
                ic_length.abs() > ic_threshold
            }
            ResamplingPolicy::DynamicNonParametric {
                schedule,
                allow_resampling_schedule,
                allow_resampling_start,
            } => {
                if samples.len() < 2 {
                    return true;
                }
                if total_nbr < *allow_resampling_start {
                    return false;
                }
                let center = median(samples);
                let ic_length = 1.253 * std_dev(samples) / (samples.len() as f64).sqrt();
                let gate = allow_resampling_schedule.eval(total_nbr) * center;
                if ic_length.abs() <= gate.abs() {
                    return false;
                }
                let ic_threshold = (schedule.eval(total_nbr) * center).abs();
                ic_length.abs() > ic_threshold
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_resampling_stops_after_n_samples() {
        let policy = ResamplingPolicy::Simple { n: 3 };
        assert!(policy.should_resample(&[1.0, 2.0], 10));
        assert!(!policy.should_resample(&[1.0, 2.0, 3.0], 10));
    }

    #[test]
    fn dynamic_parametric_always_resamples_below_two_samples() {
        let policy = ResamplingPolicy::DynamicParametric {
            schedule: Schedule::Constant,
            allow_resampling_schedule: Schedule::Constant,
            allow_resampling_start: 0,
        };
        assert!(policy.should_resample(&[5.0], 10));
    }

    #[test]
    fn schedules_decay_as_expected() {
        assert_eq!(Schedule::Constant.eval(100), 1.0);
        assert!(Schedule::Logarithmic.eval(10) < Schedule::Logarithmic.eval(1));
        assert!(Schedule::Exponential.eval(10) < Schedule::Exponential.eval(1));
    }
}
