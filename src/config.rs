use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Pause between the approval notice and the move to order confirmation.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1200);

/// Runtime settings for a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Base URL of the PIX proxy.
    pub gateway_url: String,
    /// Per-request timeout for calls to the proxy.
    pub request_timeout: Duration,
    pub redirect_delay: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
        }
    }
}
