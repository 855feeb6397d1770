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

//! Assembling the `<PRI>TIMESTAMP HOSTNAME ` preamble.
//!
//! # Introduction
//!
//! When access-log records are forwarded to a syslog collector, each one is prefixed with a BSD
//! (RFC [3164]) style header:
//!
//! ```text
//! <131>Jan  3 09:04:07 myhost.example.com GET /index.html HTTP/1.1 200 ...
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//! ```
//!
//! [3164]: https://datatracker.ietf.org/doc/html/rfc3164
//!
//! [`Preamble`] produces the underlined part, including the trailing space that separates it
//! from whatever the next stage of the pipeline renders. A [`Preamble`] can only be obtained from
//! [`PreambleBuilder::build`], which performs all the startup work (facility lookup, hostname
//! resolution, timestamp formatter construction), so holding one means the preamble is ready.
//!
//! # Examples
//!
//! ```rust
//! use access_syslog::preamble::Preamble;
//! use access_syslog::status::TracingStatus;
//!
//! let preamble = Preamble::builder()
//!     .facility_name("LOCAL0")
//!     .hostname_as_string("myhost.example.com".to_string())
//!     .unwrap()
//!     .time_zone(chrono::Utc)
//!     .build(&TracingStatus)
//!     .unwrap();
//!
//! assert_eq!(preamble.format_at(1_704_272_647_000), "<131>Jan  3 09:04:07 myhost.example.com ");
//! ```

use crate::{
    error::{Error, Result},
    facility::{Facility, ACCESS_SEVERITY},
    hostname::{Hostname, HostnameResolver, SystemHostname},
    status::StatusReporter,
    timestamp::TimestampFormatter,
};

use backtrace::Backtrace;
use bytes::BufMut;
use chrono::{Local, TimeZone};

/// The one thing the preamble needs to know about an access-log event: when it happened.
pub trait AccessEvent {
    /// Milliseconds since the Unix epoch
    fn timestamp_millis(&self) -> i64;
}

impl AccessEvent for i64 {
    fn timestamp_millis(&self) -> i64 {
        *self
    }
}

impl AccessEvent for std::time::SystemTime {
    fn timestamp_millis(&self) -> i64 {
        match self.duration_since(std::time::UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
            Err(err) => i64::try_from(err.duration().as_millis())
                .map(|ms| -ms)
                .unwrap_or(i64::MIN),
        }
    }
}

impl<Tz: TimeZone> AccessEvent for chrono::DateTime<Tz> {
    fn timestamp_millis(&self) -> i64 {
        chrono::DateTime::timestamp_millis(self)
    }
}

impl<E: AccessEvent + ?Sized> AccessEvent for &E {
    fn timestamp_millis(&self) -> i64 {
        (**self).timestamp_millis()
    }
}

/// A ready-to-use preamble formatter.
///
/// Facility & hostname are fixed at construction; the only mutable state is the timestamp
/// cache, which is internally synchronized, so a `Preamble` may be shared freely between
/// threads (e.g. behind an [`Arc`](std::sync::Arc)).
pub struct Preamble<Tz: TimeZone = Local> {
    facility: Facility,
    hostname: Hostname,
    timestamps: TimestampFormatter<Tz>,
}

impl Preamble<Local> {
    pub fn builder() -> PreambleBuilder<Local> {
        PreambleBuilder::default()
    }
}

impl<Tz: TimeZone> Preamble<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    pub fn facility(&self) -> Facility {
        self.facility
    }
    pub fn hostname(&self) -> &Hostname {
        &self.hostname
    }
    /// The PRI value every record receives
    pub fn priority(&self) -> u8 {
        self.facility.priority(ACCESS_SEVERITY)
    }
    pub fn timestamps(&self) -> &TimestampFormatter<Tz> {
        &self.timestamps
    }
    /// Produce the preamble for `event`
    pub fn format<E: AccessEvent + ?Sized>(&self, event: &E) -> String {
        self.format_at(event.timestamp_millis())
    }
    /// Produce the preamble for an event at `millis` milliseconds since the epoch
    pub fn format_at(&self, millis: i64) -> String {
        format!(
            "<{}>{} {} ",
            self.priority(),
            self.timestamps.format(millis),
            self.hostname
        )
    }
    /// Append the preamble for `event` to `buf`
    pub fn write_to<E: AccessEvent + ?Sized, B: BufMut>(&self, event: &E, buf: &mut B) {
        buf.put_u8(b'<');
        buf.put_slice(self.priority().to_string().as_bytes());
        buf.put_u8(b'>');
        buf.put_slice(self.timestamps.format(event.timestamp_millis()).as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.hostname.as_str().as_bytes());
        buf.put_u8(b' ');
    }
}

enum FacilitySetting {
    Unset,
    Code(Facility),
    Name(String),
}

/// Configure & start a [`Preamble`].
///
/// A facility must be given, either as a [`Facility`] or by name. Unless a hostname is supplied
/// explicitly it is looked-up via the configured [`HostnameResolver`] (by default,
/// [`SystemHostname`]) when [`build`](PreambleBuilder::build) is called. Timestamps are rendered
/// in the local time zone unless [`time_zone`](PreambleBuilder::time_zone) says otherwise.
pub struct PreambleBuilder<Tz: TimeZone = Local> {
    facility: FacilitySetting,
    hostname: Option<Hostname>,
    resolver: Box<dyn HostnameResolver + Send + Sync>,
    tz: Tz,
}

impl std::default::Default for PreambleBuilder<Local> {
    fn default() -> Self {
        PreambleBuilder {
            facility: FacilitySetting::Unset,
            hostname: None,
            resolver: Box::new(SystemHostname),
            tz: Local,
        }
    }
}

impl<Tz: TimeZone> PreambleBuilder<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    pub fn facility(mut self, facility: Facility) -> Self {
        self.facility = FacilitySetting::Code(facility);
        self
    }
    /// Name the facility (e.g. "LOCAL0"); the name is checked in [`build`](Self::build)
    pub fn facility_name<S: Into<String>>(mut self, name: S) -> Self {
        self.facility = FacilitySetting::Name(name.into());
        self
    }
    pub fn hostname(mut self, hostname: Hostname) -> Self {
        self.hostname = Some(hostname);
        self
    }
    pub fn hostname_as_string(mut self, hostname: String) -> Result<Self> {
        self.hostname = Some(Hostname::try_from(hostname)?);
        Ok(self)
    }
    pub fn resolver<R: HostnameResolver + Send + Sync + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Box::new(resolver);
        self
    }
    /// Render timestamps in `tz` rather than the current time zone
    pub fn time_zone<Tz2: TimeZone>(self, tz: Tz2) -> PreambleBuilder<Tz2> {
        PreambleBuilder {
            facility: self.facility,
            hostname: self.hostname,
            resolver: self.resolver,
            tz,
        }
    }
    /// Run the startup sequence.
    ///
    /// Facility problems & timestamp formatter construction failures are fatal & returned. A
    /// hostname that can't be resolved is reported to `status` as a warning and replaced with
    /// [`UNKNOWN_LOCALHOST`](crate::hostname::UNKNOWN_LOCALHOST).
    pub fn build(self, status: &dyn StatusReporter) -> Result<Preamble<Tz>> {
        let facility = match self.facility {
            FacilitySetting::Code(facility) => facility,
            FacilitySetting::Name(name) => name.parse::<Facility>()?,
            FacilitySetting::Unset => {
                return Err(Error::MissingFacility {
                    back: Backtrace::new(),
                })
            }
        };

        let hostname = match self.hostname {
            Some(hostname) => hostname,
            None => self.resolver.resolve().unwrap_or_else(|err| {
                status.warn("Could not determine local host name", Some(&err));
                Hostname::unknown()
            }),
        };

        let timestamps = TimestampFormatter::new(self.tz)?;

        tracing::debug!(%facility, %hostname, "syslog preamble configured");
        Ok(Preamble {
            facility,
            hostname,
            timestamps,
        })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::status::test::{Recorder, Report};

    use chrono::Utc;

    use std::sync::Arc;

    // 2024-01-03T09:04:07Z
    const JAN_3: i64 = 1_704_272_647_000;

    fn user_at_bree() -> Preamble<Utc> {
        Preamble::builder()
            .facility_name("USER")
            .hostname_as_string("bree".to_string())
            .unwrap()
            .time_zone(Utc)
            .build(&Recorder::default())
            .unwrap()
    }

    /// Check `s` against `<PRI>Mmm dd hh:mm:ss HOST `
    fn assert_grammar(s: &str, pri: u8, host: &str) {
        let head = format!("<{}>", pri);
        assert!(s.starts_with(&head), "{:?}", s);
        let rest = &s[head.len()..];
        let ts = &rest[..15];
        let b = ts.as_bytes();
        assert!(b[..3].iter().all(u8::is_ascii_alphabetic), "{:?}", ts);
        assert_eq!(b[3], b' ');
        assert!(b[4] == b' ' || b[4].is_ascii_digit(), "{:?}", ts);
        assert!(b[5].is_ascii_digit(), "{:?}", ts);
        assert_eq!(b[6], b' ');
        for i in [7, 8, 10, 11, 13, 14] {
            assert!(b[i].is_ascii_digit(), "{:?}", ts);
        }
        assert_eq!((b[9], b[12]), (b':', b':'));
        assert_eq!(&rest[15..], format!(" {} ", host));
        assert!(!s.ends_with("  "));
    }

    #[test]
    fn test_end_to_end() {
        let p = user_at_bree();
        assert_eq!(p.facility(), Facility::LOG_USER);
        assert_eq!(p.priority(), 11);
        let s = p.format(&JAN_3);
        assert_eq!(s, "<11>Jan  3 09:04:07 bree ");
        assert_grammar(&s, 11, "bree");

        let now = p.format(&std::time::SystemTime::now());
        assert_grammar(&now, 11, "bree");
    }

    #[test]
    fn test_local0_example() {
        let p = Preamble::builder()
            .facility(Facility::LOG_LOCAL0)
            .hostname_as_string("myhost.example.com".to_string())
            .unwrap()
            .time_zone(Utc)
            .build(&Recorder::default())
            .unwrap();
        assert_eq!(
            p.format_at(JAN_3 + 250),
            "<131>Jan  3 09:04:07 myhost.example.com "
        );
    }

    #[test]
    fn test_event_types_agree() {
        let p = user_at_bree();
        let at = Utc.timestamp_millis_opt(JAN_3).unwrap();
        let sys = std::time::UNIX_EPOCH + std::time::Duration::from_millis(JAN_3 as u64);
        assert_eq!(p.format(&at), p.format(&JAN_3));
        assert_eq!(p.format(&sys), p.format(&JAN_3));
        let before = std::time::UNIX_EPOCH - std::time::Duration::from_millis(1500);
        assert_eq!(before.timestamp_millis(), -1500);
    }

    #[test]
    fn test_write_to() {
        let p = user_at_bree();
        let mut buf: Vec<u8> = Vec::new();
        p.write_to(&JAN_3, &mut buf);
        buf.put_slice(b"GET / HTTP/1.1");
        assert_eq!(
            std::str::from_utf8(&buf).unwrap(),
            "<11>Jan  3 09:04:07 bree GET / HTTP/1.1"
        );

        let mut buf = bytes::BytesMut::new();
        p.write_to(&JAN_3, &mut buf);
        assert_eq!(&buf[..], p.format(&JAN_3).as_bytes());
    }

    #[test]
    fn test_missing_facility() {
        let rec = Recorder::default();
        let r = Preamble::builder().time_zone(Utc).build(&rec);
        assert!(matches!(r, Err(Error::MissingFacility { .. })));
        let r = Preamble::builder().facility_name("").build(&rec);
        assert!(matches!(r, Err(Error::MissingFacility { .. })));
    }

    #[test]
    fn test_unknown_facility() {
        let r = Preamble::builder()
            .facility_name("LOCAL8")
            .hostname(Hostname::unknown())
            .build(&Recorder::default());
        assert!(matches!(r, Err(Error::UnknownFacility { .. })));
    }

    #[test]
    fn test_case_insensitive_facility() {
        for name in ["local5", "LOCAL5", "Local5"] {
            let p = Preamble::builder()
                .facility_name(name)
                .hostname(Hostname::unknown())
                .build(&Recorder::default())
                .unwrap();
            assert_eq!(p.facility(), Facility::LOG_LOCAL5);
        }
    }

    #[test]
    fn test_bad_explicit_hostname() {
        assert!(matches!(
            Preamble::builder().hostname_as_string("two words".to_string()),
            Err(Error::BadHostname { .. })
        ));
    }

    #[test]
    fn test_hostname_resolution() {
        let rec = Recorder::default();
        let p = Preamble::builder()
            .facility(Facility::LOG_DAEMON)
            .resolver(|| Hostname::try_from("resolved.example.com".to_string()))
            .time_zone(Utc)
            .build(&rec)
            .unwrap();
        assert_eq!(p.hostname().as_str(), "resolved.example.com");
        assert!(rec.reports().is_empty());
    }

    #[test]
    fn test_hostname_fallback() {
        let rec = Recorder::default();
        let p = Preamble::builder()
            .facility(Facility::LOG_DAEMON)
            .resolver(|| -> Result<Hostname> {
                Err(Error::NoHostname {
                    source: "no such host".into(),
                    back: Backtrace::new(),
                })
            })
            .time_zone(Utc)
            .build(&rec)
            .unwrap();
        assert_eq!(p.hostname().as_str(), "UNKNOWN_LOCALHOST");
        assert_eq!(p.format_at(JAN_3), "<27>Jan  3 09:04:07 UNKNOWN_LOCALHOST ");
        assert_eq!(
            rec.reports(),
            vec![Report::Warn(
                "Could not determine local host name".to_string(),
                Some("Could not determine local host name: no such host".to_string())
            )]
        );
    }

    #[test]
    fn test_explicit_hostname_skips_resolver() {
        let rec = Recorder::default();
        let p = Preamble::builder()
            .facility(Facility::LOG_USER)
            .hostname(Hostname::try_from("bree".to_string()).unwrap())
            .resolver(|| -> Result<Hostname> { panic!("resolver should not be consulted") })
            .build(&rec)
            .unwrap();
        assert_eq!(p.hostname().as_str(), "bree");
        assert_eq!(rec.warnings(), 0);
    }

    #[test]
    fn test_concurrent_format() {
        let p = Arc::new(user_at_bree());
        let handles: Vec<_> = (0..16_i64)
            .map(|i| {
                let p = p.clone();
                std::thread::spawn(move || p.format_at(JAN_3 + i * 61))
            })
            .collect();
        let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for s in &results {
            assert_eq!(s, "<11>Jan  3 09:04:07 bree ");
        }
        assert_eq!(p.timestamps().refreshes(), 1);
    }
}
