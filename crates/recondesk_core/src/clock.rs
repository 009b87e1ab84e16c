//! Time source used by overdue and "due today" computations.

use chrono::{DateTime, Local, NaiveDateTime, Utc};

pub trait Clock {
    /// Instant used for `created_at`/`updated_at` stamps.
    fn now_utc(&self) -> DateTime<Utc>;
    /// Dealership wall-clock time used for due date comparisons.
    fn now_local(&self) -> NaiveDateTime;
}

/// Reads the host clock and time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one local wall-clock instant, treated as UTC for stamps.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    local: NaiveDateTime,
}

impl FixedClock {
    pub fn new(local: NaiveDateTime) -> Self {
        Self { local }
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.local.and_utc()
    }

    fn now_local(&self) -> NaiveDateTime {
        self.local
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_utc(&self) -> DateTime<Utc> {
        (**self).now_utc()
    }

    fn now_local(&self) -> NaiveDateTime {
        (**self).now_local()
    }
}
