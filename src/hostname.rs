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

//! The HOSTNAME field of the preamble.
//!
//! The local hostname is resolved exactly once, at startup, through a [`HostnameResolver`]. The
//! production implementation is [`SystemHostname`]; tests (and hosts with unusual naming
//! requirements) can supply their own.

use crate::error::{Error, Result};

use backtrace::Backtrace;

type StdResult<T, E> = std::result::Result<T, E>;

/// Substituted for the local hostname when it cannot be determined
pub const UNKNOWN_LOCALHOST: &str = "UNKNOWN_LOCALHOST";

/// A `String` with the additional constraint that it be non-empty, printable ASCII above 32
/// (space).
///
/// The preamble is space-delimited, so an embedded space or control character would corrupt
/// every record that follows it. Unlike a strict RFC 3164 HOSTNAME, a domain is permitted: the
/// name is forwarded exactly as the host reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hostname(String);

impl Hostname {
    pub fn new(bytes: Vec<u8>) -> Result<Hostname> {
        if !bytes.is_empty() && bytes.iter().all(|&x| x > 32 && x < 127) {
            // All ASCII, hence valid UTF-8
            String::from_utf8(bytes)
                .map(Hostname)
                .map_err(|err| Error::BadHostname {
                    name: err.into_bytes(),
                    back: Backtrace::new(),
                })
        } else {
            Err(Error::BadHostname {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
    /// The sentinel used when resolution fails
    pub fn unknown() -> Hostname {
        Hostname(UNKNOWN_LOCALHOST.to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::convert::TryFrom<String> for Hostname {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        Hostname::new(x.into_bytes())
    }
}

impl std::fmt::Display for Hostname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        f.write_str(&self.0)
    }
}

/// Query the host environment for its name.
pub trait HostnameResolver {
    fn resolve(&self) -> Result<Hostname>;
}

/// Resolve the hostname through the operating system (`gethostname(2)` on Unix).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHostname;

impl HostnameResolver for SystemHostname {
    fn resolve(&self) -> Result<Hostname> {
        let name = hostname::get().map_err(|err| Error::NoHostname {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        // A name that isn't even UTF-8 can't be compliant; report it as such.
        let name = name.into_string().map_err(|os| Error::BadHostname {
            name: os.to_string_lossy().into_owned().into_bytes(),
            back: Backtrace::new(),
        })?;
        Hostname::try_from(name)
    }
}

/// Any `Fn() -> Result<Hostname>` may serve as a resolver.
impl<F> HostnameResolver for F
where
    F: Fn() -> Result<Hostname>,
{
    fn resolve(&self) -> Result<Hostname> {
        self()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_hostname() {
        let _x = SystemHostname.resolve(); // At least _exercise_ it

        assert!(Hostname::new(b"not valid".to_vec()).is_err());
        assert!(Hostname::new(b"tab\tbed".to_vec()).is_err());
        assert!(Hostname::new(Vec::new()).is_err());
        assert!(Hostname::new("bréé".as_bytes().to_vec()).is_err());

        let x = Hostname::try_from(String::from("myhost.example.com")).unwrap();
        assert_eq!(x.as_str(), "myhost.example.com");
        assert_eq!(format!("{}", x), "myhost.example.com");

        assert_eq!(Hostname::unknown().as_str(), "UNKNOWN_LOCALHOST");
    }

    #[test]
    fn test_closure_resolver() {
        let r = || Hostname::try_from("bree".to_string());
        assert_eq!(r.resolve().unwrap().as_str(), "bree");

        let r = || -> Result<Hostname> {
            Err(Error::NoHostname {
                source: "lookup failed".into(),
                back: Backtrace::new(),
            })
        };
        assert!(matches!(r.resolve(), Err(Error::NoHostname { .. })));
    }
}
