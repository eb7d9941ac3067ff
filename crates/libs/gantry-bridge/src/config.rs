use std::time::Duration;

use serde::Deserialize;

/// Timing knobs for the bridge.
///
/// Defaults match the production cadence; tests shrink them. All fields are
/// milliseconds so a config file stays plain numbers.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Spacing of `connection` retries while no session is bound.
    pub connect_retry_ms: u64,
    /// Cadence of the liveness check.
    pub liveness_check_ms: u64,
    /// How long since the last successful connection before the liveness
    /// check proactively reconnects.
    pub liveness_stale_after_ms: u64,
    /// Cadence of the delegation-expiry check.
    pub expiry_check_ms: u64,
    /// Renew once the delegation expires within this margin.
    pub renew_margin_ms: u64,
    /// Timeout for payment requests.
    pub pay_timeout_ms: u64,
    /// Timeout for transaction lookups.
    pub lookup_timeout_ms: u64,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Navigation background hint passed with `connection` commands, for
    /// hosts that theme their chrome around the embedded app.
    pub navbg: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            connect_retry_ms: 1_000,
            liveness_check_ms: 5 * 60 * 1_000,
            liveness_stale_after_ms: 60 * 60 * 1_000,
            expiry_check_ms: 60 * 1_000,
            renew_margin_ms: 5 * 60 * 1_000,
            pay_timeout_ms: 120 * 1_000,
            lookup_timeout_ms: 30 * 1_000,
            event_capacity: 64,
            navbg: None,
        }
    }
}

impl BridgeConfig {
    pub fn connect_retry(&self) -> Duration {
        Duration::from_millis(self.connect_retry_ms)
    }

    pub fn liveness_check(&self) -> Duration {
        Duration::from_millis(self.liveness_check_ms)
    }

    pub fn expiry_check(&self) -> Duration {
        Duration::from_millis(self.expiry_check_ms)
    }

    pub fn pay_timeout(&self) -> Duration {
        Duration::from_millis(self.pay_timeout_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_cadence() {
        let config = BridgeConfig::default();
        assert_eq!(config.connect_retry(), Duration::from_secs(1));
        assert_eq!(config.liveness_check(), Duration::from_secs(300));
        assert_eq!(config.liveness_stale_after_ms, 3_600_000);
        assert_eq!(config.expiry_check(), Duration::from_secs(60));
        assert_eq!(config.renew_margin_ms, 300_000);
        assert_eq!(config.pay_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: BridgeConfig =
            toml::from_str("connect_retry_ms = 50\npay_timeout_ms = 2000\n").expect("toml");
        assert_eq!(config.connect_retry_ms, 50);
        assert_eq!(config.pay_timeout_ms, 2_000);
        assert_eq!(config.expiry_check_ms, BridgeConfig::default().expiry_check_ms);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<BridgeConfig>("retry = 1\n").is_err());
    }
}
