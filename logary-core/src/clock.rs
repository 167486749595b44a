use std::fmt;
use std::time::{Duration as StdDuration, SystemTime, UNIX_EPOCH};

/// The number of 100ns ticks in one second.
///
/// Matches the host platform's standard tick resolution referenced in §4.3
/// ("Duration"): 100ns, the same resolution .NET's `DateTime`/`TimeSpan`
/// ticks use, which is what the wire convention for `spanInfo` assumes.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// A point in time, represented as ticks (100ns units) since the Unix epoch.
///
/// `Message.timestamp` and `Span.beginAt`/`endAt` are all `Timestamp`s.
/// Using a plain `i64` tick count (rather than `SystemTime`/`Instant`)
/// matches the wire convention in §6: `spanInfo` fields are carried as
/// "unix ticks, int64".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Constructs a `Timestamp` from a raw tick count.
    pub const fn from_ticks(ticks: i64) -> Self {
        Timestamp(ticks)
    }

    /// Returns the raw tick count.
    pub const fn ticks(&self) -> i64 {
        self.0
    }

    /// The current wall-clock time, per [`SystemTime::now`].
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(StdDuration::ZERO);
        Timestamp(duration_to_ticks(since_epoch))
    }

    /// Ticks elapsed between `earlier` and `self`. Negative if `self` is
    /// actually before `earlier` (a caller error, but we don't panic for
    /// it — see the duration invariant in §8: `duration >= 0` is a property
    /// of well-formed spans, not something this type enforces).
    pub fn ticks_since(&self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn duration_to_ticks(d: StdDuration) -> i64 {
    let secs_ticks = d.as_secs() as i64 * TICKS_PER_SECOND;
    let subsec_ticks = (d.subsec_nanos() / 100) as i64;
    secs_ticks + subsec_ticks
}

/// A source of [`Timestamp`]s, injectable so spans and messages can be
/// tested with deterministic time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// The default [`Clock`], backed by [`std::time::SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
