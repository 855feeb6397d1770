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
//! Syslog preambles for forwarded access-log records
//!
//! # Introduction
//!
//! When HTTP access-log records are shipped to a [`syslog`] collector rather than written to a
//! file, each record needs the BSD-style (RFC [3164]) header that the collector expects:
//!
//! [`syslog`]: https://en.wikipedia.org/wiki/Syslog
//! [3164]: https://datatracker.ietf.org/doc/html/rfc3164
//!
//! ```text
//! <PRI>Mmm dd hh:mm:ss HOSTNAME <the access-log record>
//! ```
//!
//! This crate produces that preamble, and nothing else: rendering the record itself & sending
//! the result over the wire are someone else's job. Small as it is, getting it right takes a
//! little care:
//!
//! - the PRI is the configured [facility](facility::Facility) plus a fixed severity (access logs
//!   have no notion of severity, so every record is sent at [`LOG_ERR`](facility::Level::LOG_ERR))
//! - the timestamp has fixed columns: an English month abbreviation regardless of the host's
//!   locale, a space-padded day of month & a 24-hour clock
//! - the hostname is looked-up exactly once, & a failure there must not take logging down
//! - records are produced from many threads at once, and reformatting the timestamp for every one
//!   of them is wasteful when it only changes once a second
//!
//! # Usage
//!
//! Configure a [`Preamble`](preamble::Preamble) & build it:
//!
//! ```rust
//! use access_syslog::{facility::Facility, preamble::Preamble, status::TracingStatus};
//!
//! let preamble = Preamble::builder()
//!     .facility(Facility::LOG_LOCAL0)
//!     .build(&TracingStatus)
//!     .unwrap();
//!
//! // Something like "<131>Jan  3 09:04:07 myhost.example.com "
//! let header = preamble.format(&std::time::SystemTime::now());
//! assert!(header.starts_with("<131>"));
//! ```
//!
//! or, when facility names arrive as pattern options, let a
//! [`SyslogStartConverter`](converter::SyslogStartConverter) manage the startup lifecycle &
//! report any configuration problems through [`tracing`].
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html

pub mod converter;
pub mod error;
pub mod facility;
pub mod hostname;
pub mod preamble;
pub mod status;
pub mod timestamp;
