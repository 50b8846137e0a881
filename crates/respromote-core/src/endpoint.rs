//! Rule Execution Server coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Management API root, appended to `http://host[:port]`.
const API_ROOT: &str = "/res/apiauth/v1";

/// Host, optional port and basic credentials of one server.
///
/// Immutable once built; the password is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    #[serde(default)]
    port: Option<u16>,
    user: String,
    password: String,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(
        host: impl Into<String>,
        port: Option<u16>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
        }
    }

    /// Server host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port, if one was given.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Basic auth user name.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Basic auth password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// `host` or `host:port`.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        }
    }

    /// Management base URL: `http://{host}[:{port}]/res/apiauth/v1`.
    ///
    /// # Example
    ///
    /// ```
    /// use respromote_core::Endpoint;
    ///
    /// let ep = Endpoint::new("res.example.com", Some(9080), "resAdmin", "secret");
    /// assert_eq!(ep.base_url(), "http://res.example.com:9080/res/apiauth/v1");
    ///
    /// let ep = Endpoint::new("res.example.com", None, "resAdmin", "secret");
    /// assert_eq!(ep.base_url(), "http://res.example.com/res/apiauth/v1");
    /// ```
    pub fn base_url(&self) -> String {
        format!("http://{}{API_ROOT}", self.authority())
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let ep = Endpoint::new("localhost", Some(9081), "resAdmin", "hunter2");
        let printed = format!("{ep:?}");
        assert!(printed.contains("resAdmin"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_authority() {
        assert_eq!(
            Endpoint::new("localhost", Some(9081), "u", "p").authority(),
            "localhost:9081"
        );
        assert_eq!(Endpoint::new("localhost", None, "u", "p").authority(), "localhost");
    }
}
