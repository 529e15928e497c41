use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct ClientMetrics {
    registry: Registry,
    requests: IntCounterVec,
    token_refreshes: IntCounterVec,
    http_errors: IntCounterVec,
}

impl ClientMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new(
                "client_requests_total",
                "Count of API requests grouped by method and outcome",
            ),
            &["method", "outcome"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        let token_refreshes = IntCounterVec::new(
            Opts::new(
                "client_token_refresh_total",
                "Count of access token refresh attempts grouped by trigger and outcome",
            ),
            &["trigger", "outcome"],
        )?;
        registry.register(Box::new(token_refreshes.clone()))?;

        let http_errors = IntCounterVec::new(
            Opts::new(
                "client_http_errors_total",
                "Count of error responses received (status >= 400)",
            ),
            &["status"],
        )?;
        registry.register(Box::new(http_errors.clone()))?;

        Ok(Self {
            registry,
            requests,
            token_refreshes,
            http_errors,
        })
    }

    pub fn request(&self, method: &str, outcome: &str) {
        self.requests.with_label_values(&[method, outcome]).inc();
    }

    pub fn token_refresh(&self, trigger: &str, outcome: &str) {
        self.token_refreshes
            .with_label_values(&[trigger, outcome])
            .inc();
    }

    pub fn http_error(&self, status: u16) {
        self.http_errors
            .with_label_values(&[&status.to_string()])
            .inc();
    }

    pub fn refresh_count(&self, trigger: &str, outcome: &str) -> u64 {
        self.token_refreshes
            .with_label_values(&[trigger, outcome])
            .get()
    }

    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
