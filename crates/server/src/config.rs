//! Environment-driven service configuration

use rewards_engine::RewardAmounts;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the REST server binds to
    pub bind_addr: SocketAddr,
    /// Directory holding the ledger database
    pub data_dir: PathBuf,
    /// Base URL of the chain relay service
    pub gateway_url: String,
    /// Points-to-token settlement divisor
    pub points_divisor: f64,
    /// Fixed point amounts per accrual category
    pub amounts: RewardAmounts,
    /// How long a fetched token price stays fresh
    pub price_ttl: Duration,
}

impl Config {
    /// Build configuration from `REWARDS_*` environment variables,
    /// falling back to defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = RewardAmounts::default();
        Self {
            bind_addr: env_parse("REWARDS_BIND_ADDR", ([127, 0, 0, 1], 8787).into()),
            data_dir: std::env::var("REWARDS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            gateway_url: std::env::var("REWARDS_GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:9000/api".to_string()),
            points_divisor: env_parse("REWARDS_POINTS_DIVISOR", 10.0),
            amounts: RewardAmounts {
                referral_bonus: env_parse("REWARDS_REFERRAL_BONUS", defaults.referral_bonus),
                referral_signup_bonus: env_parse(
                    "REWARDS_REFERRAL_SIGNUP_BONUS",
                    defaults.referral_signup_bonus,
                ),
                daily_task: env_parse("REWARDS_DAILY_TASK_BONUS", defaults.daily_task),
                level_bonus: env_parse("REWARDS_LEVEL_BONUS", defaults.level_bonus),
            },
            price_ttl: Duration::from_secs(env_parse("REWARDS_PRICE_TTL_SECS", 60)),
        }
    }

    /// Path of the SQLite ledger file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("rewards.db")
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_env();
        assert_eq!(config.points_divisor, 10.0);
        assert_eq!(config.db_path().file_name().unwrap(), "rewards.db");
    }
}
