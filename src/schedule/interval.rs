//! The fixed set of rotation intervals and their cron expressions.

use std::fmt;

use crate::error::TorError;

/// Supported rotation intervals. Arbitrary minute counts are rejected rather
/// than turned into cron expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    EveryMinute,
    HalfHourly,
    Hourly,
    EveryFourHours,
    EveryTwelveHours,
    Daily,
}

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::EveryMinute,
        Interval::HalfHourly,
        Interval::Hourly,
        Interval::EveryFourHours,
        Interval::EveryTwelveHours,
        Interval::Daily,
    ];

    pub fn minutes(&self) -> u32 {
        match self {
            Interval::EveryMinute => 1,
            Interval::HalfHourly => 30,
            Interval::Hourly => 60,
            Interval::EveryFourHours => 240,
            Interval::EveryTwelveHours => 720,
            Interval::Daily => 1440,
        }
    }

    /// Five-field cron expression (minute hour day month weekday).
    pub fn cron_expression(&self) -> &'static str {
        match self {
            Interval::EveryMinute => "* * * * *",
            Interval::HalfHourly => "*/30 * * * *",
            Interval::Hourly => "0 * * * *",
            Interval::EveryFourHours => "0 */4 * * *",
            Interval::EveryTwelveHours => "0 */12 * * *",
            Interval::Daily => "0 0 * * *",
        }
    }

    /// Reverse of [`cron_expression`](Interval::cron_expression).
    pub fn from_cron_expression(expr: &str) -> Option<Self> {
        let normalized = expr.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|interval| interval.cron_expression() == normalized)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interval::EveryMinute => "1 min",
            Interval::HalfHourly => "30 min",
            Interval::Hourly => "1 hour",
            Interval::EveryFourHours => "4 hours",
            Interval::EveryTwelveHours => "12 hours",
            Interval::Daily => "24 hours",
        }
    }
}

impl TryFrom<u32> for Interval {
    type Error = TorError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|interval| interval.minutes() == minutes)
            .ok_or(TorError::UnsupportedInterval(minutes))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
