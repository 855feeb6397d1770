// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of access-syslog.
//
// access-syslog is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// access-syslog is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with access-syslog.  If
// not, see <http://www.gnu.org/licenses/>.

//! The TIMESTAMP field of the preamble.
//!
//! RFC [3164] timestamps have one-second resolution (`Mmm dd hh:mm:ss`), while access-log events
//! arrive many times per second. [`TimestampFormatter`] therefore caches the last string it
//! produced, keyed by epoch second, and only reformats when an event lands in a different
//! second.
//!
//! [3164]: https://datatracker.ietf.org/doc/html/rfc3164
//!
//! The month abbreviation is always English (chrono's `%b`), the day of month is space-padded
//! to two columns & the clock is 24-hour. The time zone is an explicit type parameter,
//! defaulting to the process' local time zone.

use crate::error::{Error, Result};

use backtrace::Backtrace;
use chrono::{
    format::{Item, StrftimeItems},
    Local, TimeZone, Utc,
};

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};

/// `Mmm dd hh:mm:ss`; `%e` is the space-padded day of month
pub const TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S";

// 0000-01-01T00:00:00Z & 9999-12-31T23:59:59.999Z. Clamping to these keeps every instant
// representable in any time zone.
const MIN_MILLIS: i64 = -62_167_219_200_000;
const MAX_MILLIS: i64 = 253_402_300_799_999;

/// The epoch second containing `millis` (floor division, so negative instants behave)
pub fn epoch_second(millis: i64) -> i64 {
    millis.div_euclid(1000)
}

struct Cache {
    second: i64,
    text: Arc<str>,
}

/// Format epoch milliseconds to RFC 3164 timestamps, caching the result per second.
///
/// [`format`](TimestampFormatter::format) takes `&self` & may be called concurrently: the
/// compare-and-refresh of the cached `(second, text)` pair happens under a single lock, so no
/// caller ever sees text belonging to a different second than the one recorded alongside it.
pub struct TimestampFormatter<Tz: TimeZone = Local> {
    tz: Tz,
    items: Vec<Item<'static>>,
    cache: Mutex<Option<Cache>>,
    refreshes: AtomicU64,
}

impl TimestampFormatter<Local> {
    /// Format in the process' local time zone
    pub fn local() -> Result<Self> {
        TimestampFormatter::new(Local)
    }
}

impl<Tz: TimeZone> TimestampFormatter<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    /// Build a formatter rendering instants in `tz`.
    ///
    /// Fails with [`Error::FormatterInitFailed`] if [`TIMESTAMP_FORMAT`] does not parse.
    pub fn new(tz: Tz) -> Result<Self> {
        let items: Vec<Item<'static>> = StrftimeItems::new(TIMESTAMP_FORMAT).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(Error::FormatterInitFailed {
                format: TIMESTAMP_FORMAT,
                back: Backtrace::new(),
            });
        }
        Ok(TimestampFormatter {
            tz,
            items,
            cache: Mutex::new(None),
            refreshes: AtomicU64::new(0),
        })
    }
    /// Produce the timestamp for `millis` (milliseconds since the Unix epoch).
    ///
    /// Every call for the same epoch second returns the same shared string; only the first call
    /// after the second changes does any formatting.
    pub fn format(&self, millis: i64) -> Arc<str> {
        let second = epoch_second(millis);
        // The pair is only ever replaced whole, so a poisoned lock still guards a consistent one.
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.as_ref().filter(|hit| hit.second == second) {
            return hit.text.clone();
        }
        let text: Arc<str> = Arc::from(self.render(millis));
        *cache = Some(Cache {
            second,
            text: text.clone(),
        });
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        text
    }
    /// The epoch second currently cached, if any
    pub fn cached_second(&self) -> Option<i64> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|hit| hit.second)
    }
    /// How many times the cache has been (re)filled
    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }
    pub fn time_zone(&self) -> &Tz {
        &self.tz
    }
    fn render(&self, millis: i64) -> String {
        Utc.timestamp_millis_opt(millis.clamp(MIN_MILLIS, MAX_MILLIS))
            .single()
            .unwrap_or_default()
            .with_timezone(&self.tz)
            .format_with_items(self.items.iter())
            .to_string()
    }
}
