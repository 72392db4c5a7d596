use crate::steps::Step;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-user study settings. Read-only input to every scheduling call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySettings {
    /// New cards introduced per day (default: 20)
    #[serde(default = "default_new_cards_per_day")]
    pub new_cards_per_day: u32,

    /// Reviews shown per day (default: 200)
    #[serde(default = "default_max_reviews_per_day")]
    pub max_reviews_per_day: u32,

    /// Learning steps in minutes (default: [1, 10])
    #[serde(default = "default_learning_steps")]
    pub learning_steps: Vec<u32>,

    /// Days until first review after clearing the learning steps (default: 1)
    #[serde(default = "default_graduating_interval")]
    pub graduating_interval: u32,

    /// Days until first review when a new card is rated Easy (default: 4)
    #[serde(default = "default_easy_interval")]
    pub easy_interval: u32,

    /// Shortest review interval in days (default: 1)
    #[serde(default = "default_minimum_interval")]
    pub minimum_interval: u32,

    /// Longest review interval in days (default: 36500)
    #[serde(default = "default_maximum_interval")]
    pub maximum_interval: u32,

    /// Relearning steps in minutes (default: [10])
    #[serde(default = "default_relearning_steps")]
    pub relearning_steps: Vec<u32>,

    /// FSRS desired retention rate 0.0-1.0 (default: 0.9)
    #[serde(default = "default_desired_retention")]
    pub desired_retention: f32,

    /// Randomize review intervals to spread out due dates (default: true)
    #[serde(default = "default_enable_fuzz")]
    pub enable_fuzz: bool,

    /// Raw overrides for the FSRS model, merged over everything above
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsrs_parameters: Option<FsrsOverrides>,
}

/// Shallow overrides for the model parameters. Unset fields keep the
/// values derived from [`StudySettings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FsrsOverrides {
    #[serde(default)]
    pub request_retention: Option<f32>,
    #[serde(default)]
    pub maximum_interval: Option<u32>,
    /// Model weights; an empty list means the library defaults
    #[serde(default)]
    pub w: Option<Vec<f32>>,
    #[serde(default)]
    pub enable_fuzz: Option<bool>,
    /// Bare minutes or step notation (`"10m"`, `"1h"`, `"1d"`)
    #[serde(default)]
    pub learning_steps: Option<Vec<Step>>,
    #[serde(default)]
    pub relearning_steps: Option<Vec<Step>>,
}

fn default_new_cards_per_day() -> u32 {
    20
}

fn default_max_reviews_per_day() -> u32 {
    200
}

fn default_learning_steps() -> Vec<u32> {
    vec![1, 10]
}

fn default_graduating_interval() -> u32 {
    1
}

fn default_easy_interval() -> u32 {
    4
}

fn default_minimum_interval() -> u32 {
    1
}

fn default_maximum_interval() -> u32 {
    36500
}

fn default_relearning_steps() -> Vec<u32> {
    vec![10]
}

fn default_desired_retention() -> f32 {
    0.9
}

fn default_enable_fuzz() -> bool {
    true
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            new_cards_per_day: default_new_cards_per_day(),
            max_reviews_per_day: default_max_reviews_per_day(),
            learning_steps: default_learning_steps(),
            graduating_interval: default_graduating_interval(),
            easy_interval: default_easy_interval(),
            minimum_interval: default_minimum_interval(),
            maximum_interval: default_maximum_interval(),
            relearning_steps: default_relearning_steps(),
            desired_retention: default_desired_retention(),
            enable_fuzz: default_enable_fuzz(),
            fsrs_parameters: None,
        }
    }
}

impl StudySettings {
    /// Load settings from the default location or return defaults
    pub fn load() -> Result<Self> {
        let path = Self::settings_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(StudySettings::default())
        }
    }

    /// Load settings from an explicit TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: StudySettings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        Ok(settings)
    }

    /// Path to settings file
    pub fn settings_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("cardsched").join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }
}
