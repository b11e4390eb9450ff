//! Runtime configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Cross-process connects retry while the peer starts up.
pub const CONNECT_ATTEMPTS: u32 = 40;
pub const CONNECT_DELAY: Duration = Duration::from_millis(250);

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|s| matches!(s.as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn env_path(name: &str, default: PathBuf) -> PathBuf {
    std::env::var(name).map(PathBuf::from).unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the four stream sockets.
    pub socket_dir: PathBuf,
    /// Lock file guarding paid-flag flips across processes.
    pub lock_file: PathBuf,
    /// Wall-clock length of a simulation run.
    pub sim_duration: Duration,
    /// Fleet size cap.
    pub max_aircraft: usize,
    /// Seconds between runway-flag polls (also the engine tick length).
    pub poll_interval: Duration,
    /// Polls an aircraft waits for a runway before giving up.
    pub runway_wait_polls: u32,
    /// Cadence of the ATC allocation loop.
    pub atc_interval: Duration,
    /// Cadence of the radar sampling loop.
    pub radar_interval: Duration,
    /// How long shutdown waits for flight tasks and children to drain.
    pub shutdown_grace: Duration,
    /// Portal pays each affordable unpaid notice as it arrives.
    pub auto_pay: bool,
    /// Payment service approves requests as they arrive.
    pub auto_approve: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let socket_dir = env_path("ACX_SOCKET_DIR", std::env::temp_dir().join("aircontrolx"));
        let lock_file = env_path("ACX_LOCK_FILE", socket_dir.join("avn.lock"));
        Self {
            socket_dir,
            lock_file,
            sim_duration: Duration::from_secs(env_u64("ACX_SIM_DURATION_SECS", 300)),
            max_aircraft: env_u64("ACX_MAX_AIRCRAFT", 20) as usize,
            poll_interval: Duration::from_millis(env_u64("ACX_POLL_INTERVAL_MS", 1000)),
            runway_wait_polls: env_u64("ACX_RUNWAY_WAIT_POLLS", 30) as u32,
            atc_interval: Duration::from_millis(env_u64("ACX_ATC_INTERVAL_MS", 1000)),
            radar_interval: Duration::from_millis(env_u64("ACX_RADAR_INTERVAL_MS", 500)),
            shutdown_grace: Duration::from_millis(env_u64("ACX_SHUTDOWN_GRACE_MS", 10_000)),
            auto_pay: env_bool("ACX_AUTO_PAY", true),
            auto_approve: env_bool("ACX_AUTO_APPROVE", true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_simulation_parameters() {
        // Scrub the variables this test cares about; other tests do not
        // touch ACX_* so this is safe within the process.
        for key in ["ACX_SIM_DURATION_SECS", "ACX_RUNWAY_WAIT_POLLS", "ACX_RADAR_INTERVAL_MS"] {
            std::env::remove_var(key);
        }
        let config = Config::from_env();
        assert_eq!(config.sim_duration, Duration::from_secs(300));
        assert_eq!(config.runway_wait_polls, 30);
        assert_eq!(config.radar_interval, Duration::from_millis(500));
        assert_eq!(config.max_aircraft, 20);
        assert!(config.auto_pay);
    }
}
