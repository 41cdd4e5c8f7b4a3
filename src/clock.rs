// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::{DateTime, Utc};

/// A source of "now" in milliseconds since the Unix epoch.
///
/// The [`Generator`] reads time only through this trait, so tests can swap in a
/// fixed or stepped clock.
///
/// Any `Fn() -> DateTime<Utc>` closure is a time source:
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use flake::TimeSource;
///
/// let fixed = || Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
/// assert_eq!(fixed.current_millis(), 1_719_792_000_000);
/// ```
///
/// [`Generator`]: crate::Generator
pub trait TimeSource: Send + Sync {
    fn current_millis(&self) -> u64;
}

/// The host wall clock in UTC, truncated to milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        to_millis(Utc::now())
    }
}

impl<F> TimeSource for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn current_millis(&self) -> u64 {
        to_millis(self())
    }
}

/// Instants before the Unix epoch clamp to 0.
fn to_millis(time: DateTime<Utc>) -> u64 {
    u64::try_from(time.timestamp_millis()).unwrap_or(0)
}
