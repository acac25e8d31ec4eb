//! Per-run timestamps used to name output artifacts.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Timestamp identifying one run, formatted as `YYYYmmdd_HHMMSS`.
///
/// Captured once when a run starts and reused for every artifact of that
/// run, so the report directory, final report and metadata file share a
/// suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunStamp(String);

impl RunStamp {
    /// Stamp for the current local time.
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Stamp for a specific point in time.
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(at.format("%Y%m%d_%H%M%S").to_string())
    }

    /// The formatted stamp.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
