//! Run mode strategy: the caps each mode applies during execution
//!
//! Selection is a pure function of the run's mode; the limits are stateless
//! and shared by value across runs. Test-run budgets come from configuration
//! and default to 1000 generated tokens per step, 60 seconds of wall clock,
//! and 5 executed steps.

use std::time::{Duration, Instant};

use super::error::EngineError;
use crate::config::TestRunLimitsConfig;
use crate::domain::RunMode;

/// Caps applied while executing a run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLimits {
    /// Generated-token cap per step; requests are clamped to it
    pub max_tokens_per_step: Option<u32>,

    /// Wall-clock budget, checked between steps (not preemptive: a single
    /// provider call may overrun and is only caught after it returns)
    pub max_runtime: Option<Duration>,

    /// Maximum number of steps executed
    pub max_steps: Option<usize>,
}

impl RunLimits {
    /// Resolve the limits for a run mode
    pub fn for_mode(mode: RunMode, config: &TestRunLimitsConfig) -> Self {
        match mode {
            // Validate-only never reaches the step loop; full runs are uncapped
            RunMode::ValidateOnly | RunMode::FullRun => Self::default(),
            RunMode::TestRun => Self {
                max_tokens_per_step: Some(config.max_tokens_per_step),
                max_runtime: Some(Duration::from_secs(config.max_runtime_secs)),
                max_steps: Some(config.max_steps),
            },
        }
    }

    /// Fail if executing one more step would exceed the step budget
    pub fn check_step_budget(&self, steps_executed: usize) -> Result<(), EngineError> {
        match self.max_steps {
            Some(max) if steps_executed >= max => Err(EngineError::max_steps_exceeded(max)),
            _ => Ok(()),
        }
    }

    /// Fail if the wall-clock budget is already exhausted
    pub fn check_deadline(&self, started: Instant) -> Result<(), EngineError> {
        match self.max_runtime {
            Some(budget) if started.elapsed() > budget => {
                Err(EngineError::runtime_exceeded(budget.as_secs()))
            }
            _ => Ok(()),
        }
    }

    /// Fail if a step reported more generated tokens than the per-step cap
    pub fn check_step_tokens(&self, index: usize, generated: u32) -> Result<(), EngineError> {
        match self.max_tokens_per_step {
            Some(cap) if generated > cap => Err(EngineError::tokens_exceeded(index, cap, generated)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TestRunLimitsConfig {
        TestRunLimitsConfig::default()
    }

    #[test]
    fn test_full_run_has_no_caps() {
        let limits = RunLimits::for_mode(RunMode::FullRun, &test_config());
        assert!(limits.max_steps.is_none());
        assert!(limits.max_runtime.is_none());
        assert!(limits.max_tokens_per_step.is_none());

        assert!(limits.check_step_budget(10_000).is_ok());
        assert!(limits.check_step_tokens(0, u32::MAX).is_ok());
    }

    #[test]
    fn test_test_run_caps_from_config() {
        let limits = RunLimits::for_mode(RunMode::TestRun, &test_config());
        assert_eq!(limits.max_steps, Some(5));
        assert_eq!(limits.max_tokens_per_step, Some(1000));
        assert_eq!(limits.max_runtime, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_step_budget() {
        let limits = RunLimits::for_mode(RunMode::TestRun, &test_config());
        assert!(limits.check_step_budget(4).is_ok());

        let err = limits.check_step_budget(5).unwrap_err();
        assert!(err.is_cap_violation());
        assert!(err.to_string().contains("5 steps"));
    }

    #[test]
    fn test_token_cap() {
        let limits = RunLimits::for_mode(RunMode::TestRun, &test_config());
        assert!(limits.check_step_tokens(0, 1000).is_ok());
        assert!(limits.check_step_tokens(0, 1001).is_err());
    }

    #[test]
    fn test_deadline_not_preemptive() {
        let limits = RunLimits {
            max_runtime: Some(Duration::from_secs(0)),
            ..Default::default()
        };

        let started = Instant::now() - Duration::from_millis(10);
        assert!(limits.check_deadline(started).is_err());
    }
}
