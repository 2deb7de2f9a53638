//! Parsed cadence and next-fire-time computation

use std::{str::FromStr, time::Duration};

use chrono::{DateTime, Duration as ChronoDuration, TimeZone};
use croner::Cron;

use super::CronError;

/// A parsed cadence expression
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Five-field cron expression
    Cron(Cron),
    /// Fixed interval from `@every <duration>`
    Every(Duration),
}

impl Schedule {
    /// Parse a cadence expression such as `*/5 * * * *`, `@daily` or `@every 1h30m`
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(CronError::Empty);
        }

        if let Some(descriptor) = expression.strip_prefix('@') {
            return Self::parse_descriptor(descriptor);
        }

        let found = expression.split_whitespace().count();
        if found != 5 {
            return Err(CronError::FieldCount {
                expression: expression.to_string(),
                found,
            });
        }

        Cron::new(expression)
            .parse()
            .map(Schedule::Cron)
            .map_err(|source| CronError::Invalid {
                expression: expression.to_string(),
                source,
            })
    }

    fn parse_descriptor(descriptor: &str) -> Result<Self, CronError> {
        let (name, argument) = match descriptor.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, Some(argument.trim())),
            None => (descriptor, None),
        };

        let expanded = match (name.to_ascii_lowercase().as_str(), argument) {
            ("every", Some(duration)) => return parse_duration(duration).map(Schedule::Every),
            ("yearly" | "annually", None) => "0 0 1 1 *",
            ("monthly", None) => "0 0 1 * *",
            ("weekly", None) => "0 0 * * 0",
            ("daily" | "midnight", None) => "0 0 * * *",
            ("hourly", None) => "0 * * * *",
            _ => return Err(CronError::UnknownDescriptor(format!("@{}", descriptor))),
        };

        Self::parse(expanded)
    }

    /// Next fire time strictly after `after`, or `None` if there is none
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        match self {
            Schedule::Cron(cron) => cron.find_next_occurrence(after, false).ok(),
            Schedule::Every(interval) => {
                let interval = ChronoDuration::from_std(*interval).ok()?;
                after.clone().checked_add_signed(interval)
            }
        }
    }
}

impl FromStr for Schedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse durations like `90s`, `1h30m` or `250ms`
fn parse_duration(raw: &str) -> Result<Duration, CronError> {
    let invalid = || CronError::InvalidDuration(raw.to_string());
    let mut total = Duration::ZERO;
    let mut rest = raw.trim();

    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let amount: u32 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "ms" => Duration::from_millis(1),
            "s" => Duration::from_secs(1),
            "m" => Duration::from_secs(60),
            "h" => Duration::from_secs(3600),
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        let part = unit.checked_mul(amount).ok_or_else(invalid)?;
        total = total.checked_add(part).ok_or_else(invalid)?;
    }

    if total.is_zero() {
        return Err(invalid());
    }

    Ok(total)
}
