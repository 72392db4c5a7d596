use crate::config::StudySettings;
use crate::steps::{self, Step};
use anyhow::{Result, bail};
use fsrs::DEFAULT_PARAMETERS;

/// Decay used by FSRS-4.5/5 weight sets, which do not carry their own
const LEGACY_DECAY: f32 = 0.5;

/// Everything the scheduler needs from the settings, already merged and converted
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub desired_retention: f32,
    pub learning_steps: Vec<Step>,
    pub relearning_steps: Vec<Step>,
    pub minimum_interval: u32,
    pub maximum_interval: u32,
    pub graduating_interval: u32,
    pub easy_interval: u32,
    pub enable_fuzz: bool,
    /// Model weights handed to the fsrs crate
    pub weights: Vec<f32>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::from_settings(&StudySettings::default())
    }
}

impl Parameters {
    /// Assemble model parameters from user settings.
    ///
    /// Minute-based steps become [`Step`]s, and the optional
    /// `fsrs_parameters` blob is merged over the result field by field.
    /// Easy and graduating intervals have no model equivalent; they are
    /// carried through for the scheduler to apply after projection.
    pub fn from_settings(settings: &StudySettings) -> Self {
        let mut params = Self {
            desired_retention: settings.desired_retention,
            learning_steps: steps::from_minutes(&settings.learning_steps),
            relearning_steps: steps::from_minutes(&settings.relearning_steps),
            minimum_interval: settings.minimum_interval,
            maximum_interval: settings.maximum_interval,
            graduating_interval: settings.graduating_interval,
            easy_interval: settings.easy_interval,
            enable_fuzz: settings.enable_fuzz,
            weights: DEFAULT_PARAMETERS.to_vec(),
        };

        if let Some(overrides) = &settings.fsrs_parameters {
            if let Some(retention) = overrides.request_retention {
                params.desired_retention = retention;
            }
            if let Some(max) = overrides.maximum_interval {
                params.maximum_interval = max;
            }
            if let Some(w) = &overrides.w
                && !w.is_empty()
            {
                params.weights = w.clone();
            }
            if let Some(fuzz) = overrides.enable_fuzz {
                params.enable_fuzz = fuzz;
            }
            if let Some(learning) = &overrides.learning_steps {
                params.learning_steps = learning.clone();
            }
            if let Some(relearning) = &overrides.relearning_steps {
                params.relearning_steps = relearning.clone();
            }
        }

        if params.minimum_interval > params.maximum_interval {
            log::warn!(
                "Minimum interval {} exceeds maximum interval {}, using the maximum",
                params.minimum_interval,
                params.maximum_interval
            );
            params.minimum_interval = params.maximum_interval;
        }

        params
    }

    /// Reject parameter sets the scheduler cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            bail!(
                "Desired retention must be in (0, 1), got {}",
                self.desired_retention
            );
        }
        if self.maximum_interval == 0 {
            bail!("Maximum interval must be at least one day");
        }
        if self.minimum_interval > self.maximum_interval {
            bail!(
                "Minimum interval {} exceeds maximum interval {}",
                self.minimum_interval,
                self.maximum_interval
            );
        }
        if self.weights.iter().any(|w| !w.is_finite()) {
            bail!("Model weights must be finite numbers");
        }
        Ok(())
    }

    /// Decay exponent of the forgetting curve for these weights
    pub fn decay(&self) -> f32 {
        self.weights.get(20).copied().unwrap_or(LEGACY_DECAY)
    }

    /// The smallest and largest review interval, in days
    pub fn interval_bounds(&self) -> (f64, f64) {
        (
            self.minimum_interval.max(1) as f64,
            self.maximum_interval as f64,
        )
    }
}
