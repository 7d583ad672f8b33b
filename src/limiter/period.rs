use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Length of one replenishment window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Seconds,
    Minutes,
    Hours,
}

impl PeriodUnit {
    pub fn duration(self) -> Duration {
        match self {
            PeriodUnit::Seconds => Duration::from_secs(1),
            PeriodUnit::Minutes => Duration::from_secs(60),
            PeriodUnit::Hours => Duration::from_secs(60 * 60),
        }
    }
}

impl FromStr for PeriodUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seconds" => Ok(PeriodUnit::Seconds),
            "minutes" => Ok(PeriodUnit::Minutes),
            "hours" => Ok(PeriodUnit::Hours),
            other => Err(AppError::config(format!("Unsupported time unit: {}", other))),
        }
    }
}

impl fmt::Display for PeriodUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodUnit::Seconds => write!(f, "seconds"),
            PeriodUnit::Minutes => write!(f, "minutes"),
            PeriodUnit::Hours => write!(f, "hours"),
        }
    }
}
