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

//! The access-log pattern converter that emits syslog preambles.
//!
//! [`SyslogStartConverter`] wraps a [`PreambleBuilder`] in the lifecycle a logging pipeline
//! expects: it is created unconfigured, [started](SyslogStartConverter::start) once with its
//! pattern options, and from then on either converts events or (if startup failed) silently
//! produces nothing. Startup failures go to the [`StatusReporter`], never to whoever is
//! converting events.

use crate::{
    error::Error,
    preamble::{AccessEvent, Preamble, PreambleBuilder},
    status::{StatusReporter, TracingStatus},
};

use chrono::{Local, TimeZone};

const COMPONENT: &str = "SyslogStartConverter";

/// Where a [`SyslogStartConverter`] is in its lifecycle
pub enum State<Tz: TimeZone = Local> {
    /// [`start`](SyslogStartConverter::start) hasn't been called yet
    Uninitialized,
    /// Started successfully; producing preambles
    Active(Preamble<Tz>),
    /// Startup failed; a new converter must be built to try again
    Disabled(Error),
}

/// Converts access-log events to syslog preambles.
///
/// # Examples
///
/// ```rust
/// use access_syslog::converter::SyslogStartConverter;
/// use access_syslog::preamble::Preamble;
///
/// let mut converter = SyslogStartConverter::new(Preamble::builder().time_zone(chrono::Utc));
/// assert!(converter.start(&["LOCAL0"]).is_ok());
/// let preamble = converter.convert(&1_704_272_647_000_i64).unwrap();
/// assert!(preamble.starts_with("<131>Jan  3 09:04:07 "));
///
/// let mut broken = SyslogStartConverter::default();
/// assert!(broken.start::<&str>(&[]).is_err());
/// assert!(broken.convert(&1_704_272_647_000_i64).is_none());
/// ```
pub struct SyslogStartConverter<Tz: TimeZone = Local> {
    pending: Option<PreambleBuilder<Tz>>,
    state: State<Tz>,
    status: Box<dyn StatusReporter + Send + Sync>,
}

impl std::default::Default for SyslogStartConverter<Local> {
    /// Format in local time, resolve the hostname from the OS & report through [`tracing`]
    ///
    /// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
    fn default() -> Self {
        SyslogStartConverter::new(PreambleBuilder::default())
    }
}

impl<Tz: TimeZone> SyslogStartConverter<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    /// An unstarted converter that will complete `builder` with its facility option at
    /// [`start`](Self::start); startup reports go to [`TracingStatus`]
    pub fn new(builder: PreambleBuilder<Tz>) -> Self {
        SyslogStartConverter {
            pending: Some(builder),
            state: State::Uninitialized,
            status: Box::new(TracingStatus),
        }
    }
    /// Send startup reports to `status` instead
    pub fn with_status<R: StatusReporter + Send + Sync + 'static>(mut self, status: R) -> Self {
        self.status = Box::new(status);
        self
    }
    /// Start the converter.
    ///
    /// The first of `options` names the syslog facility; any others are ignored. On success the
    /// converter becomes [`State::Active`] and a "started" signal goes to the status reporter; on
    /// failure the error is reported and the converter is permanently [`State::Disabled`].
    /// Starting an already-started (or disabled) converter just returns the existing outcome.
    pub fn start<S: AsRef<str>>(
        &mut self,
        options: &[S],
    ) -> std::result::Result<&Preamble<Tz>, &Error> {
        if let Some(builder) = self.pending.take() {
            let builder = match options.first() {
                Some(facility) => builder.facility_name(facility.as_ref()),
                None => builder,
            };
            self.state = match builder.build(self.status.as_ref()) {
                Ok(preamble) => {
                    self.status.started(COMPONENT);
                    State::Active(preamble)
                }
                Err(err) => {
                    self.status.error(&err.to_string(), Some(&err));
                    State::Disabled(err)
                }
            };
        }
        match &self.state {
            State::Active(preamble) => Ok(preamble),
            State::Disabled(err) => Err(err),
            // `pending` is only ever taken when `state` is replaced
            State::Uninitialized => unreachable!(),
        }
    }
    pub fn state(&self) -> &State<Tz> {
        &self.state
    }
    pub fn is_started(&self) -> bool {
        matches!(self.state, State::Active(_))
    }
    pub fn preamble(&self) -> Option<&Preamble<Tz>> {
        match &self.state {
            State::Active(preamble) => Some(preamble),
            _ => None,
        }
    }
    pub fn error(&self) -> Option<&Error> {
        match &self.state {
            State::Disabled(err) => Some(err),
            _ => None,
        }
    }
    /// The preamble for `event`, or `None` unless the converter is active
    pub fn convert<E: AccessEvent + ?Sized>(&self, event: &E) -> Option<String> {
        self.preamble().map(|preamble| preamble.format(event))
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::{
        error::Result,
        facility::Facility,
        hostname::Hostname,
        status::test::{Recorder, Report},
    };

    use backtrace::Backtrace;
    use chrono::Utc;

    use std::sync::Arc;

    // 2024-01-03T09:04:07Z
    const JAN_3: i64 = 1_704_272_647_000;

    fn converter(rec: &Arc<Recorder>) -> SyslogStartConverter<Utc> {
        SyslogStartConverter::new(
            Preamble::builder()
                .resolver(|| Hostname::try_from("bree".to_string()))
                .time_zone(Utc),
        )
        .with_status(rec.clone())
    }

    #[test]
    fn test_start_user() {
        let rec = Arc::new(Recorder::default());
        let mut c = converter(&rec);
        assert!(!c.is_started());
        assert!(c.convert(&JAN_3).is_none());
        assert!(matches!(c.state(), State::Uninitialized));

        let p = c.start(&["user"]).unwrap();
        assert_eq!(p.facility(), Facility::LOG_USER);

        assert!(c.is_started());
        assert_eq!(c.convert(&JAN_3).unwrap(), "<11>Jan  3 09:04:07 bree ");
        assert_eq!(rec.reports(), vec![Report::Started(COMPONENT.to_string())]);
    }

    #[test]
    fn test_extra_options_ignored() {
        let rec = Arc::new(Recorder::default());
        let mut c = converter(&rec);
        assert!(c.start(&["LOCAL1", "whatever", "else"]).is_ok());
        assert_eq!(c.convert(&JAN_3).unwrap(), "<139>Jan  3 09:04:07 bree ");
    }

    #[test]
    fn test_missing_facility() {
        let rec = Arc::new(Recorder::default());
        let mut c = converter(&rec);
        assert!(matches!(
            c.start::<&str>(&[]),
            Err(Error::MissingFacility { .. })
        ));
        assert!(!c.is_started());
        assert!(c.convert(&JAN_3).is_none());
        assert_eq!(rec.errors(), 1);
        assert_eq!(rec.starts(), 0);

        let rec = Arc::new(Recorder::default());
        let mut c = converter(&rec);
        assert!(matches!(c.start(&[""]), Err(Error::MissingFacility { .. })));
        assert!(c.convert(&JAN_3).is_none());
        assert_eq!(rec.errors(), 1);
    }

    #[test]
    fn test_unknown_facility_disables() {
        let rec = Arc::new(Recorder::default());
        let mut c = converter(&rec);
        assert!(matches!(
            c.start(&["LOCAL9"]),
            Err(Error::UnknownFacility { .. })
        ));
        assert!(matches!(c.error(), Some(Error::UnknownFacility { .. })));
        assert!(c.preamble().is_none());
        assert_eq!(rec.starts(), 0);
        match &rec.reports()[..] {
            [Report::Error(msg, Some(_))] => {
                assert_eq!(msg, "\"LOCAL9\" is not a valid syslog facility string")
            }
            other => panic!("unexpected reports {:?}", other),
        }
    }

    #[test]
    fn test_no_retry() {
        let rec = Arc::new(Recorder::default());
        let mut c = converter(&rec);
        assert!(c.start(&["bogus"]).is_err());
        // A second start with a good facility changes nothing
        assert!(c.start(&["USER"]).is_err());
        assert!(c.convert(&JAN_3).is_none());
        assert_eq!(rec.errors(), 1);

        let rec = Arc::new(Recorder::default());
        let mut c = converter(&rec);
        assert!(c.start(&["USER"]).is_ok());
        assert_eq!(c.start(&["LOCAL0"]).unwrap().facility(), Facility::LOG_USER);
        assert_eq!(rec.starts(), 1);
    }

    #[test]
    fn test_hostname_failure_still_starts() {
        let rec = Arc::new(Recorder::default());
        let mut c = SyslogStartConverter::new(
            Preamble::builder()
                .resolver(|| -> Result<Hostname> {
                    Err(Error::NoHostname {
                        source: "no such host".into(),
                        back: Backtrace::new(),
                    })
                })
                .time_zone(Utc),
        )
        .with_status(rec.clone());
        assert!(c.start(&["LOCAL0"]).is_ok());
        assert_eq!(
            c.convert(&JAN_3).unwrap(),
            "<131>Jan  3 09:04:07 UNKNOWN_LOCALHOST "
        );
        assert_eq!(rec.warnings(), 1);
        assert_eq!(rec.errors(), 0);
        assert_eq!(rec.starts(), 1);
    }

    #[test]
    fn test_shared_between_threads() {
        let rec = Arc::new(Recorder::default());
        let mut c = converter(&rec);
        c.start(&["LOCAL7"]).unwrap();
        let c = Arc::new(c);
        let handles: Vec<_> = (0..8_i64)
            .map(|i| {
                let c = c.clone();
                std::thread::spawn(move || {
                    (0..100_i64)
                        .map(|j| c.convert(&(JAN_3 + (i * 100 + j) % 1000)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            for s in handle.join().unwrap() {
                assert_eq!(s, "<187>Jan  3 09:04:07 bree ");
            }
        }
        assert_eq!(c.preamble().unwrap().timestamps().refreshes(), 1);
    }
}
