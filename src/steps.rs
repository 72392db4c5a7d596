use anyhow::{Context, Result, bail};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit of a step duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUnit {
    Minutes,
    Hours,
    Days,
}

impl StepUnit {
    fn suffix(&self) -> char {
        match self {
            StepUnit::Minutes => 'm',
            StepUnit::Hours => 'h',
            StepUnit::Days => 'd',
        }
    }

    fn minutes(&self) -> u32 {
        match self {
            StepUnit::Minutes => 1,
            StepUnit::Hours => 60,
            StepUnit::Days => 24 * 60,
        }
    }
}

/// One delay on a learning or relearning staircase, e.g. `10m`, `1h` or `2d`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStep", into = "String")]
pub struct Step {
    amount: u32,
    unit: StepUnit,
}

impl Step {
    pub fn minutes(amount: u32) -> Self {
        Self {
            amount,
            unit: StepUnit::Minutes,
        }
    }

    pub fn hours(amount: u32) -> Self {
        Self {
            amount,
            unit: StepUnit::Hours,
        }
    }

    pub fn days(amount: u32) -> Self {
        Self {
            amount,
            unit: StepUnit::Days,
        }
    }

    /// Total length in minutes
    pub fn as_minutes(&self) -> u64 {
        self.amount as u64 * self.unit.minutes() as u64
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.as_minutes() as i64)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl FromStr for Step {
    type Err = anyhow::Error;

    /// Parse step notation; a bare number means minutes
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("Empty step");
        }

        let (digits, unit) = match s.chars().last() {
            Some('m') => (&s[..s.len() - 1], StepUnit::Minutes),
            Some('h') => (&s[..s.len() - 1], StepUnit::Hours),
            Some('d') => (&s[..s.len() - 1], StepUnit::Days),
            Some(c) if c.is_ascii_digit() => (s, StepUnit::Minutes),
            _ => bail!("Unknown step unit in '{s}'. Use m, h or d."),
        };

        let amount: u32 = digits
            .trim()
            .parse()
            .with_context(|| format!("Invalid step amount in '{s}'"))?;
        if amount == 0 {
            bail!("Step '{s}' must be longer than zero");
        }

        Ok(Step { amount, unit })
    }
}

impl From<Step> for String {
    fn from(step: Step) -> String {
        step.to_string()
    }
}

/// Steps arrive either as bare minute counts or as step notation strings
#[derive(Deserialize)]
#[serde(untagged)]
enum RawStep {
    Minutes(u32),
    Text(String),
}

impl TryFrom<RawStep> for Step {
    type Error = anyhow::Error;

    fn try_from(raw: RawStep) -> Result<Self> {
        match raw {
            RawStep::Minutes(0) => bail!("Step must be longer than zero"),
            RawStep::Minutes(n) => Ok(Step::minutes(n)),
            RawStep::Text(text) => text.parse(),
        }
    }
}

/// Convert bare minute counts (the settings format) into steps.
/// Zero-length entries are dropped.
pub fn from_minutes(minutes: &[u32]) -> Vec<Step> {
    minutes
        .iter()
        .filter(|&&m| m > 0)
        .map(|&m| Step::minutes(m))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("10m".parse::<Step>().unwrap(), Step::minutes(10));
        assert_eq!("1h".parse::<Step>().unwrap(), Step::hours(1));
        assert_eq!("2d".parse::<Step>().unwrap(), Step::days(2));
    }

    #[test]
    fn test_parse_bare_number_is_minutes() {
        assert_eq!("15".parse::<Step>().unwrap(), Step::minutes(15));
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Step>().is_err());
        assert!("0m".parse::<Step>().is_err());
        assert!("10x".parse::<Step>().is_err());
        assert!("m".parse::<Step>().is_err());
        assert!("-5m".parse::<Step>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Step::minutes(10).to_string(), "10m");
        assert_eq!(Step::hours(3).to_string(), "3h");
        assert_eq!(Step::days(1).to_string(), "1d");
    }

    #[test]
    fn test_duration() {
        assert_eq!(Step::minutes(10).duration(), Duration::minutes(10));
        assert_eq!(Step::hours(2).duration(), Duration::minutes(120));
        assert_eq!(Step::days(1).duration(), Duration::days(1));
    }

    #[test]
    fn test_from_minutes_drops_zero() {
        assert_eq!(
            from_minutes(&[1, 0, 10]),
            vec![Step::minutes(1), Step::minutes(10)]
        );
        assert!(from_minutes(&[]).is_empty());
    }

    #[test]
    fn test_deserialize_mixed() {
        #[derive(Deserialize)]
        struct Wrapper {
            steps: Vec<Step>,
        }
        let w: Wrapper = toml::from_str(r#"steps = [1, "10m", "1h"]"#).unwrap();
        assert_eq!(
            w.steps,
            vec![Step::minutes(1), Step::minutes(10), Step::hours(1)]
        );
    }

    #[test]
    fn test_deserialize_rejects_bad_notation() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            #[allow(dead_code)]
            steps: Vec<Step>,
        }
        assert!(toml::from_str::<Wrapper>(r#"steps = ["soon"]"#).is_err());
        assert!(toml::from_str::<Wrapper>(r#"steps = [0]"#).is_err());
    }
}
