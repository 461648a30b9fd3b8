//! Time sources for event timestamps
//!
//! Timestamps travel in two shapes: a calendar [`DateTime<Utc>`] attached to
//! [`KeyEvent`](crate::codec::KeyEvent)s, and a [`SystemTimestamp`] of whole
//! seconds plus nanoseconds since the Unix epoch, which is what the kernel
//! wire record is built from. [`to_system`] and [`from_system`] convert
//! between them without loss for every instant at or after the epoch.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SystemTimestamp {
    pub seconds: u64,
    pub nanoseconds: u32,
}

impl SystemTimestamp {
    pub const EPOCH: Self = Self {
        seconds: 0,
        nanoseconds: 0,
    };

    pub fn new(seconds: u64, nanoseconds: u32) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }
}

impl From<Duration> for SystemTimestamp {
    fn from(since_epoch: Duration) -> Self {
        Self::new(since_epoch.as_secs(), since_epoch.subsec_nanos())
    }
}

/// Current wall-clock time.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current wall-clock time in two-component form, skipping the calendar
/// conversion.
pub fn system_now() -> SystemTimestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(SystemTimestamp::from)
        .unwrap_or(SystemTimestamp::EPOCH)
}

/// Calendar time to two-component form.
///
/// Instants before the epoch have no two-component representation and
/// clamp to [`SystemTimestamp::EPOCH`].
pub fn to_system(time: DateTime<Utc>) -> SystemTimestamp {
    match u64::try_from(time.timestamp()) {
        Ok(seconds) => SystemTimestamp::new(seconds, time.timestamp_subsec_nanos()),
        Err(_) => SystemTimestamp::EPOCH,
    }
}

/// Two-component form to calendar time.
///
/// Seconds beyond chrono's range saturate to [`DateTime::<Utc>::MAX_UTC`].
pub fn from_system(ts: SystemTimestamp) -> DateTime<Utc> {
    i64::try_from(ts.seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, ts.nanoseconds))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Suspend the current task for `duration`.
pub async fn wait(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Create a [`Metronome`] that ticks every `period`.
pub fn metronome(period: Duration) -> Metronome {
    Metronome::new(period)
}

/// Periodic tick source.
///
/// Each call to [`tick`](Metronome::tick) waits one full period, measured
/// from the call itself, and returns the wall-clock time at wake-up. A late
/// caller never gets an immediate catch-up tick.
#[derive(Debug, Clone, Copy)]
pub struct Metronome {
    period: Duration,
}

impl Metronome {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait one period, then return the current time.
    pub async fn tick(&self) -> DateTime<Utc> {
        wait(self.period).await;
        now()
    }
}
