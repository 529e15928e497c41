/// Runtime configuration for client-side token expiry checks.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryConfig {
    /// Seconds before `exp` at which a token is already treated as expired.
    pub leeway_seconds: u32,
}

impl ExpiryConfig {
    /// 30 second leeway.
    pub fn new() -> Self {
        Self { leeway_seconds: 30 }
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self::new()
    }
}
