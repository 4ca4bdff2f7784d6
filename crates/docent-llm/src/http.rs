//! Shared HTTP client construction for providers.

use std::time::Duration;

/// Connect and whole-request timeouts applied to every provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            request: Duration::from_secs(60),
        }
    }
}

/// Build a client with rustls TLS, a `docent/{version}` user-agent and a
/// redirect limit of 10.
#[must_use]
pub fn client_with_timeouts(timeouts: HttpTimeouts) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .user_agent(concat!("docent/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("HTTP client construction must not fail")
}

#[must_use]
pub fn default_client() -> reqwest::Client {
    client_with_timeouts(HttpTimeouts::default())
}
