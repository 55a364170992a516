use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Process-lifetime configuration, read once at startup from the
/// environment. There is no hot reload.
#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: String,
    pub tick_period: Duration,
    pub capabilities: Capabilities,
    pub link: LinkConfig,
    pub time: TimeConfig,
    pub supervisor: SupervisorConfig,
}

/// Replaces the original firmware's copy-pasted sketch variants
/// (with/without humidity, with/without web server) with one core.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub has_humidity: bool,
    pub has_web_server: bool,
}

#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Probed with a bounded TCP connect to decide link health, normally
    /// the LAN gateway.
    pub probe_addr: String,
    pub probe_timeout: Duration,
    pub static_address: String,
    pub gateway: String,
    pub netmask: String,
    pub reconnect_attempts: u32,
    pub reconnect_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct TimeConfig {
    pub server: String,
    pub utc_offset_secs: i32,
    pub boot_sync_attempts: u32,
    pub boot_sync_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub link_check_interval: Duration,
    pub resync_interval: Duration,
    pub memory_check_interval: Duration,
    pub max_link_failures: u32,
    pub memory_floor_bytes: u64,
    pub watchdog_timeout: Duration,
    /// How long the final notice stays on the display before a fatal
    /// condition is handed up.
    pub fatal_grace: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            http_addr: var_or("HTTP_ADDR", "0.0.0.0:8080"),
            tick_period: Duration::from_millis(parse_or("TICK_MS", 1000)),
            capabilities: Capabilities {
                has_humidity: parse_or("HAS_HUMIDITY", true),
                has_web_server: parse_or("HAS_WEB_SERVER", true),
            },
            link: LinkConfig {
                probe_addr: var_or("LINK_PROBE_ADDR", "192.168.1.1:80"),
                probe_timeout: Duration::from_millis(parse_or("LINK_PROBE_TIMEOUT_MS", 3000)),
                static_address: var_or("STATIC_ADDRESS", "192.168.1.200"),
                gateway: var_or("GATEWAY", "192.168.1.1"),
                netmask: var_or("NETMASK", "255.255.255.0"),
                reconnect_attempts: parse_or("LINK_RECONNECT_ATTEMPTS", 10),
                reconnect_delay: Duration::from_millis(parse_or("LINK_RECONNECT_DELAY_MS", 1000)),
            },
            time: TimeConfig {
                server: var_or("NTP_SERVER", "pool.ntp.org"),
                utc_offset_secs: parse_or("UTC_OFFSET_SECS", 8 * 3600),
                boot_sync_attempts: parse_or("BOOT_SYNC_ATTEMPTS", 10),
                boot_sync_delay: Duration::from_millis(parse_or("BOOT_SYNC_DELAY_MS", 500)),
            },
            supervisor: SupervisorConfig {
                link_check_interval: Duration::from_secs(parse_or("LINK_CHECK_SECS", 30)),
                resync_interval: Duration::from_secs(parse_or("RESYNC_SECS", 600)),
                memory_check_interval: Duration::from_secs(parse_or("MEMORY_CHECK_SECS", 60)),
                max_link_failures: parse_or("MAX_LINK_FAILURES", 5),
                memory_floor_bytes: parse_or("MEMORY_FLOOR_BYTES", 30_000),
                watchdog_timeout: Duration::from_secs(parse_or("WATCHDOG_TIMEOUT_SECS", 30)),
                fatal_grace: Duration::from_millis(parse_or("FATAL_GRACE_MS", 2000)),
            },
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var reads share process state, so overrides and defaults are
    // exercised in one test to keep them from racing each other.
    #[test]
    fn from_env_defaults_and_overrides() {
        let config = Config::from_env();
        assert_eq!(config.supervisor.max_link_failures, 5);
        assert_eq!(config.supervisor.link_check_interval, Duration::from_secs(30));
        assert_eq!(config.supervisor.resync_interval, Duration::from_secs(600));
        assert_eq!(config.supervisor.memory_floor_bytes, 30_000);
        assert_eq!(config.tick_period, Duration::from_millis(1000));
        assert!(config.capabilities.has_humidity);
        assert!(config.capabilities.has_web_server);

        env::set_var("MAX_LINK_FAILURES", "3");
        env::set_var("HAS_HUMIDITY", "false");
        let config = Config::from_env();
        assert_eq!(config.supervisor.max_link_failures, 3);
        assert!(!config.capabilities.has_humidity);
        env::remove_var("MAX_LINK_FAILURES");
        env::remove_var("HAS_HUMIDITY");
    }

    #[test]
    fn parse_or_falls_back_on_garbage() {
        env::set_var("ENVSTATION_TEST_GARBAGE", "not-a-number");
        assert_eq!(parse_or("ENVSTATION_TEST_GARBAGE", 42u64), 42);
        env::remove_var("ENVSTATION_TEST_GARBAGE");
    }
}
