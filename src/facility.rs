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

//! syslog facility & severity definitions.
//!
//! [`Facility`] and [`Level`] replicate the names used in `<syslog.h>`. Facilities are stored
//! pre-multiplied by 8 so that a PRI value is simply `facility | level`.
//!
//! Access-log records carry no per-event severity, so every preamble uses the single constant
//! [`ACCESS_SEVERITY`].

use crate::error::{Error, Result};

use backtrace::Backtrace;

type StdResult<T, E> = std::result::Result<T, E>;

/// The BSD syslog facilities, as enumerated in RFC [3164] section 4.1.1 (plus the `LOCALn`
/// block). Values are the facility number shifted left by three.
///
/// [3164]: https://datatracker.ietf.org/doc/html/rfc3164
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Facility {
    /// kernel messages
    LOG_KERN = 0 << 3,
    /// random user-level messages
    LOG_USER = 1 << 3,
    /// mail system
    LOG_MAIL = 2 << 3,
    /// system daemons
    LOG_DAEMON = 3 << 3,
    /// security/authorization messages
    LOG_AUTH = 4 << 3,
    /// messages generated internally by syslogd
    LOG_SYSLOG = 5 << 3,
    /// line printer subsystem
    LOG_LPR = 6 << 3,
    /// network news subsystem
    LOG_NEWS = 7 << 3,
    /// UUCP subsystem
    LOG_UUCP = 8 << 3,
    /// clock daemon
    LOG_CRON = 9 << 3,
    /// security/authorization messages (private)
    LOG_AUTHPRIV = 10 << 3,
    /// ftp daemon
    LOG_FTP = 11 << 3,
    /// NTP subsystem
    LOG_NTP = 12 << 3,
    /// log audit
    LOG_AUDIT = 13 << 3,
    /// log alert
    LOG_ALERT = 14 << 3,
    /// clock daemon (the other one)
    LOG_CLOCK = 15 << 3,
    LOG_LOCAL0 = 16 << 3,
    LOG_LOCAL1 = 17 << 3,
    LOG_LOCAL2 = 18 << 3,
    LOG_LOCAL3 = 19 << 3,
    LOG_LOCAL4 = 20 << 3,
    LOG_LOCAL5 = 21 << 3,
    LOG_LOCAL6 = 22 << 3,
    LOG_LOCAL7 = 23 << 3,
}

/// The fixed facility name table, in code order. Names are the conventional configuration
/// spellings; matching against them is case-insensitive.
const FACILITY_NAMES: [(&str, Facility); 24] = [
    ("KERN", Facility::LOG_KERN),
    ("USER", Facility::LOG_USER),
    ("MAIL", Facility::LOG_MAIL),
    ("DAEMON", Facility::LOG_DAEMON),
    ("AUTH", Facility::LOG_AUTH),
    ("SYSLOG", Facility::LOG_SYSLOG),
    ("LPR", Facility::LOG_LPR),
    ("NEWS", Facility::LOG_NEWS),
    ("UUCP", Facility::LOG_UUCP),
    ("CRON", Facility::LOG_CRON),
    ("AUTHPRIV", Facility::LOG_AUTHPRIV),
    ("FTP", Facility::LOG_FTP),
    ("NTP", Facility::LOG_NTP),
    ("AUDIT", Facility::LOG_AUDIT),
    ("ALERT", Facility::LOG_ALERT),
    ("CLOCK", Facility::LOG_CLOCK),
    ("LOCAL0", Facility::LOG_LOCAL0),
    ("LOCAL1", Facility::LOG_LOCAL1),
    ("LOCAL2", Facility::LOG_LOCAL2),
    ("LOCAL3", Facility::LOG_LOCAL3),
    ("LOCAL4", Facility::LOG_LOCAL4),
    ("LOCAL5", Facility::LOG_LOCAL5),
    ("LOCAL6", Facility::LOG_LOCAL6),
    ("LOCAL7", Facility::LOG_LOCAL7),
];

impl Facility {
    /// Look `name` up in the facility table.
    ///
    /// Matching ignores ASCII case & surrounding whitespace, and tolerates a leading `LOG_` so
    /// that the [`Display`](std::fmt::Display) form parses back. Returns `None` for anything
    /// not in the table.
    pub fn from_name(name: &str) -> Option<Facility> {
        let name = name.trim();
        let name = match name.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("LOG_") => &name[4..],
            _ => name,
        };
        FACILITY_NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|&(_, facility)| facility)
    }
    /// The bare table name of this facility (e.g. "LOCAL0")
    pub fn name(&self) -> &'static str {
        // The table is in code order, one entry per facility.
        FACILITY_NAMES[(*self as usize) >> 3].0
    }
    /// The numeric facility code (already multiplied by 8)
    pub fn code(&self) -> u8 {
        *self as u8
    }
    /// The syslog PRI for a message of severity `level` in this facility
    pub fn priority(&self, level: Level) -> u8 {
        self.code() | level as u8
    }
}

impl std::default::Default for Facility {
    /// The default facility is `LOG_USER`.
    fn default() -> Self {
        Facility::LOG_USER
    }
}

impl std::fmt::Display for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "LOG_{}", self.name())
    }
}

impl std::str::FromStr for Facility {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::MissingFacility {
                back: Backtrace::new(),
            });
        }
        Facility::from_name(s).ok_or_else(|| Error::UnknownFacility {
            name: s.to_string(),
            back: Backtrace::new(),
        })
    }
}

/// Both RFCs [5424] & [3164] define eight severity levels for messages. The enumeration values
/// duplicate the constants documented as per the `syslog()` manual [page] & defined in
/// `<syslog.h>`.
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
/// [3164]: https://datatracker.ietf.org/doc/html/rfc3164
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    /// system is unusable
    LOG_EMERG,
    /// action must be take immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

/// The severity used for every access-log preamble.
pub const ACCESS_SEVERITY: Level = Level::LOG_ERR;
