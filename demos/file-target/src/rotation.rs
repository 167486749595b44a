//! Date-based rotation, grounded on the `InnerAppender`
//! roll-on-write-if-stale pattern: every write compares the current time
//! against a precomputed `next_date` and only touches the filesystem again
//! if it's actually due.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

/// How often the backing file is rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Never roll; every message goes to the same file.
    Never,
    /// Roll at the top of every hour.
    Hourly,
    /// Roll at midnight UTC.
    Daily,
}

impl Rotation {
    /// The file name for `prefix` at `date`, given this rotation.
    pub fn filename(&self, prefix: &str, date: &DateTime<Utc>) -> String {
        match self {
            Rotation::Never => prefix.to_string(),
            Rotation::Hourly => format!("{prefix}.{}", date.format("%Y-%m-%d-%H")),
            Rotation::Daily => format!("{prefix}.{}", date.format("%Y-%m-%d")),
        }
    }

    /// The instant at or after which a file opened at `current` must be
    /// rolled over. `Rotation::Never` returns a date far enough in the
    /// future that `should_rollover` never fires.
    pub fn next_date(&self, current: &DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Rotation::Never => *current + Duration::days(365 * 100),
            Rotation::Hourly => {
                let start_of_hour = current
                    .with_minute(0)
                    .and_then(|d| d.with_second(0))
                    .and_then(|d| d.with_nanosecond(0))
                    .unwrap_or(*current);
                start_of_hour + Duration::hours(1)
            }
            Rotation::Daily => {
                let start_of_day = current
                    .with_hour(0)
                    .and_then(|d| d.with_minute(0))
                    .and_then(|d| d.with_second(0))
                    .and_then(|d| d.with_nanosecond(0))
                    .unwrap_or(*current);
                start_of_day + Duration::days(1)
            }
        }
    }

    /// Whether a file opened with `next_date` as its rollover point needs
    /// to be replaced, given the current time `now`.
    pub fn should_rollover(&self, next_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now >= next_date
    }
}
