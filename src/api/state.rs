//! Server configuration and the shared state handed to handlers.

use std::sync::Arc;
use std::time::Duration;

use super::handlers::{OriginResolver, RequestThrottle};
use crate::guard::{LoginEngine, ProtectionConfig};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_LOGIN_REQUESTS_PER_MINUTE: u32 = 5;
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 10;
const DEFAULT_PRUNE_INTERVAL_SECONDS: u64 = 300;
const DEFAULT_CORS_ALLOW_ORIGIN: &str = "*";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    port: u16,
    protection: ProtectionConfig,
    login_requests_per_minute: u32,
    default_requests_per_minute: u32,
    trust_forwarded_for: bool,
    prune_interval: Duration,
    cors_allow_origin: String,
}

impl ApiConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            protection: ProtectionConfig::new(),
            login_requests_per_minute: DEFAULT_LOGIN_REQUESTS_PER_MINUTE,
            default_requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            trust_forwarded_for: false,
            prune_interval: Duration::from_secs(DEFAULT_PRUNE_INTERVAL_SECONDS),
            cors_allow_origin: DEFAULT_CORS_ALLOW_ORIGIN.to_string(),
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_protection(mut self, protection: ProtectionConfig) -> Self {
        self.protection = protection;
        self
    }

    #[must_use]
    pub fn with_login_requests_per_minute(mut self, requests: u32) -> Self {
        self.login_requests_per_minute = requests;
        self
    }

    #[must_use]
    pub fn with_default_requests_per_minute(mut self, requests: u32) -> Self {
        self.default_requests_per_minute = requests;
        self
    }

    #[must_use]
    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    #[must_use]
    pub fn with_prune_interval_seconds(mut self, seconds: u64) -> Self {
        self.prune_interval = Duration::from_secs(seconds.max(1));
        self
    }

    #[must_use]
    pub fn with_cors_allow_origin(mut self, origin: String) -> Self {
        self.cors_allow_origin = origin;
        self
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    #[must_use]
    pub fn login_requests_per_minute(&self) -> u32 {
        self.login_requests_per_minute
    }

    #[must_use]
    pub fn default_requests_per_minute(&self) -> u32 {
        self.default_requests_per_minute
    }

    #[must_use]
    pub fn trust_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }

    #[must_use]
    pub fn prune_interval(&self) -> Duration {
        self.prune_interval
    }

    #[must_use]
    pub fn cors_allow_origin(&self) -> &str {
        &self.cors_allow_origin
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LoginEngine>,
    pub origins: OriginResolver,
    pub throttle: Arc<RequestThrottle>,
}

impl AppState {
    #[must_use]
    pub fn new(engine: Arc<LoginEngine>, config: &ApiConfig) -> Self {
        let origins = OriginResolver::new(config.trust_forwarded_for());
        let throttle = Arc::new(RequestThrottle::new(
            config.login_requests_per_minute(),
            config.default_requests_per_minute(),
            origins,
        ));
        Self {
            engine,
            origins,
            throttle,
        }
    }
}
