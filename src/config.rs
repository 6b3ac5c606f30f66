use chrono::{FixedOffset, Local, Offset};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";
pub const DEFAULT_RETURN_URL: &str = "http://localhost:5000/";
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Resolved settings shared by the HTTP adapters and the application context.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the marketplace API, without a trailing slash.
    pub api_base: String,
    /// Where the processor sends the user back after an out-of-band
    /// authentication step such as 3-D Secure.
    pub return_url: String,
    pub stripe_api_base: String,
    pub timeout: Duration,
    /// Offset used to read the wall-clock date and time typed into the form.
    pub utc_offset: FixedOffset,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            return_url: DEFAULT_RETURN_URL.to_string(),
            stripe_api_base: DEFAULT_STRIPE_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            utc_offset: Local::now().offset().fix(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_return_url(mut self, return_url: impl Into<String>) -> Self {
        self.return_url = return_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn with_stripe_api_base(mut self, base: impl Into<String>) -> Self {
        self.stripe_api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}
