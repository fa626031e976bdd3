//! The address the user is currently at.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::RoutingError;

/// An absolute location: origin plus path.
///
/// The guard reads the path to pick a route and the port to tell which
/// application instance it is running in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Parses an absolute URL such as `http://localhost:5174/admin/login`.
    pub fn parse(input: &str) -> Result<Self, RoutingError> {
        Url::parse(input)
            .map(Self::from)
            .map_err(|source| RoutingError::InvalidLocation {
                input: input.to_string(),
                source,
            })
    }

    /// The path, without query or fragment. Never empty for http(s).
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// The explicit port, or the scheme's default.
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    /// `scheme://host[:port]`.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The same origin at `path`. Query and fragment are dropped.
    pub fn with_path(&self, path: &str) -> Self {
        let mut url = self.url.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        Self { url }
    }
}

impl From<Url> for Location {
    fn from(url: Url) -> Self {
        Self { url }
    }
}

impl FromStr for Location {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
