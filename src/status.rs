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

//! Startup status reporting.
//!
//! The preamble formatter never surfaces errors to whoever is formatting events; everything that
//! goes wrong happens at startup and is handed to a [`StatusReporter`]. [`TracingStatus`], the
//! default, forwards those reports as [`tracing`] events.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html

type Cause<'a> = Option<&'a (dyn std::error::Error + 'static)>;

/// A sink for startup errors, warnings & lifecycle transitions.
///
/// Implementations must not panic; reporting is purely a side-channel.
pub trait StatusReporter {
    /// A fatal problem; the reporting component will not start
    fn error(&self, msg: &str, cause: Cause<'_>);
    /// A recoverable problem; the reporting component carries on
    fn warn(&self, msg: &str, cause: Cause<'_>);
    /// `component` has started successfully
    fn started(&self, _component: &str) {}
}

impl<T: StatusReporter + ?Sized> StatusReporter for std::sync::Arc<T> {
    fn error(&self, msg: &str, cause: Cause<'_>) {
        (**self).error(msg, cause)
    }
    fn warn(&self, msg: &str, cause: Cause<'_>) {
        (**self).warn(msg, cause)
    }
    fn started(&self, component: &str) {
        (**self).started(component)
    }
}

impl<T: StatusReporter + ?Sized> StatusReporter for &T {
    fn error(&self, msg: &str, cause: Cause<'_>) {
        (**self).error(msg, cause)
    }
    fn warn(&self, msg: &str, cause: Cause<'_>) {
        (**self).warn(msg, cause)
    }
    fn started(&self, component: &str) {
        (**self).started(component)
    }
}

/// Report status through [`tracing`].
///
/// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingStatus;

impl StatusReporter for TracingStatus {
    fn error(&self, msg: &str, cause: Cause<'_>) {
        match cause {
            Some(cause) => tracing::error!(cause = %cause, "{}", msg),
            None => tracing::error!("{}", msg),
        }
    }
    fn warn(&self, msg: &str, cause: Cause<'_>) {
        match cause {
            Some(cause) => tracing::warn!(cause = %cause, "{}", msg),
            None => tracing::warn!("{}", msg),
        }
    }
    fn started(&self, component: &str) {
        tracing::info!(component, "started");
    }
}
