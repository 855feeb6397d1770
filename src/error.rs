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

//! [access-syslog](crate) errors

use backtrace::Backtrace;

/// [access-syslog](crate) error type
///
/// Like the rest of the crate, this eschews [thiserror] & [anyhow] in favor of a straightforward
/// enumeration. Every variant but [`Error::NoHostname`] is fatal at startup; that one is recovered
/// locally by substituting a sentinel hostname.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied hostname is not usable in a syslog preamble
    BadHostname { name: Vec<u8>, back: Backtrace },
    /// The timestamp format items could not be constructed
    FormatterInitFailed {
        format: &'static str,
        back: Backtrace,
    },
    /// No facility name was configured (or it was blank)
    MissingFacility { back: Backtrace },
    /// Failed to fetch the local hostname
    NoHostname {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// The configured facility name is not in the syslog facility table
    UnknownFacility { name: String, back: Backtrace },
}

impl Error {
    /// `true` for errors that leave the preamble formatter disabled
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::NoHostname { .. })
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadHostname { name, .. } => write!(
                f,
                "{:?} is not a syslog-compliant hostname",
                String::from_utf8_lossy(name)
            ),
            Error::FormatterInitFailed { format, .. } => {
                write!(f, "Could not instantiate a timestamp formatter for {:?}", format)
            }
            Error::MissingFacility { .. } => {
                write!(f, "Was expecting a facility string as an option")
            }
            Error::NoHostname { source, .. } => {
                write!(f, "Could not determine local host name: {}", source)
            }
            Error::UnknownFacility { name, .. } => {
                write!(f, "{:?} is not a valid syslog facility string", name)
            }
            _ => write!(f, "Other access-syslog error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadHostname { name: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::FormatterInitFailed { format: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::MissingFacility { back } => write!(f, "{}\n{:#?}", self, back),
            Error::NoHostname { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::UnknownFacility { name: _, back } => write!(f, "{}\n{:#?}", self, back),
            err => write!(f, "access-syslog error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NoHostname { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
