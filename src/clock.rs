//! Time sources and reference-time resolution.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    at: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at: RwLock::new(at),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.at.write().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.at.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A caller-supplied moment to sample at, either already typed or raw text
/// from a query string or command line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceTime {
    At(DateTime<Utc>),
    Text(String),
}

impl From<DateTime<Utc>> for ReferenceTime {
    fn from(value: DateTime<Utc>) -> Self {
        ReferenceTime::At(value)
    }
}

impl From<&str> for ReferenceTime {
    fn from(value: &str) -> Self {
        ReferenceTime::Text(value.to_string())
    }
}

impl From<String> for ReferenceTime {
    fn from(value: String) -> Self {
        ReferenceTime::Text(value)
    }
}

impl ReferenceTime {
    /// The instant this reference denotes, or `None` when the text is not a
    /// recognisable timestamp.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            ReferenceTime::At(at) => Some(*at),
            ReferenceTime::Text(text) => parse_timestamp(text),
        }
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTime {
    pub at: DateTime<Utc>,
    /// Set only when a valid reference time was supplied.
    pub hours_ago: Option<f64>,
}

impl ResolvedTime {
    pub fn is_historical(&self) -> bool {
        matches!(self.hours_ago, Some(hours) if hours > 0.0)
    }
}

/// Absent or unparseable references resolve to `now`; this never fails.
pub fn resolve(reference: Option<&ReferenceTime>, now: DateTime<Utc>) -> ResolvedTime {
    match reference.and_then(ReferenceTime::instant) {
        Some(at) => ResolvedTime {
            at,
            hours_ago: Some((now - at).num_milliseconds() as f64 / 3_600_000.0),
        },
        None => ResolvedTime {
            at: now,
            hours_ago: None,
        },
    }
}

/// Zero-based month and hour of day as seen from `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarPoint {
    pub month0: u32,
    pub hour: u32,
}

impl CalendarPoint {
    pub fn of(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = at.with_timezone(&offset);
        Self {
            month0: local.month0(),
            hour: local.hour(),
        }
    }
}
