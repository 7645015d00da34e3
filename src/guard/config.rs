//! Thresholds and windows for account suspension and origin blocking.

use chrono::Duration;

const DEFAULT_USER_THRESHOLD: u32 = 5;
const DEFAULT_USER_WINDOW_MINUTES: i64 = 5;
const DEFAULT_SUSPENSION_MINUTES: i64 = 15;
const DEFAULT_IP_THRESHOLD: u32 = 100;
const DEFAULT_IP_WINDOW_MINUTES: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtectionConfig {
    user_threshold: u32,
    user_window: Duration,
    suspension_duration: Duration,
    ip_threshold: u32,
    ip_window: Duration,
}

impl ProtectionConfig {
    /// Defaults: 5 failures in 5 minutes suspend an account for 15 minutes,
    /// 100 failures in 5 minutes block an origin address.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_threshold: DEFAULT_USER_THRESHOLD,
            user_window: Duration::minutes(DEFAULT_USER_WINDOW_MINUTES),
            suspension_duration: Duration::minutes(DEFAULT_SUSPENSION_MINUTES),
            ip_threshold: DEFAULT_IP_THRESHOLD,
            ip_window: Duration::minutes(DEFAULT_IP_WINDOW_MINUTES),
        }
    }

    #[must_use]
    pub fn with_user_threshold(mut self, threshold: u32) -> Self {
        self.user_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_user_window_minutes(mut self, minutes: i64) -> Self {
        self.user_window = Duration::minutes(minutes);
        self
    }

    #[must_use]
    pub fn with_suspension_minutes(mut self, minutes: i64) -> Self {
        self.suspension_duration = Duration::minutes(minutes);
        self
    }

    #[must_use]
    pub fn with_ip_threshold(mut self, threshold: u32) -> Self {
        self.ip_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_ip_window_minutes(mut self, minutes: i64) -> Self {
        self.ip_window = Duration::minutes(minutes);
        self
    }

    /// Clamp degenerate values: a zero threshold would suspend everyone and a
    /// negative window would count nothing.
    #[must_use]
    pub fn normalize(self) -> Self {
        Self {
            user_threshold: self.user_threshold.max(1),
            user_window: self.user_window.max(Duration::zero()),
            suspension_duration: self.suspension_duration.max(Duration::zero()),
            ip_threshold: self.ip_threshold.max(1),
            ip_window: self.ip_window.max(Duration::zero()),
        }
    }

    #[must_use]
    pub fn user_threshold(&self) -> u32 {
        self.user_threshold
    }

    #[must_use]
    pub fn user_window(&self) -> Duration {
        self.user_window
    }

    #[must_use]
    pub fn suspension_duration(&self) -> Duration {
        self.suspension_duration
    }

    #[must_use]
    pub fn ip_threshold(&self) -> u32 {
        self.ip_threshold
    }

    #[must_use]
    pub fn ip_window(&self) -> Duration {
        self.ip_window
    }

    /// Age past which a failed attempt can no longer influence any decision.
    #[must_use]
    pub fn retention(&self) -> Duration {
        self.user_window
            .max(self.suspension_duration)
            .max(self.ip_window)
    }
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self::new()
    }
}
