use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;

/// Runtime knobs of the scheduling core. Defaults mirror the usual shop
/// setup: 30 minute slot raster, reminders one day ahead, five minute
/// dispatch polling.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slot_granularity_minutes: i64,
    pub reminder_lead_days: i64,
    pub poll_interval_secs: u64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: 30,
            reminder_lead_days: 1,
            poll_interval_secs: 300,
            port: 3000,
        }
    }
}

impl AppConfig {
    /// Environment overrides on top of the defaults. Unparseable values fall
    /// back to the default rather than aborting startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            slot_granularity_minutes: env_or("SLOT_GRANULARITY_MINUTES", defaults.slot_granularity_minutes),
            reminder_lead_days: env_or("REMINDER_LEAD_DAYS", defaults.reminder_lead_days),
            poll_interval_secs: env_or("REMINDER_POLL_SECS", defaults.poll_interval_secs),
            port: env_or("PORT", defaults.port),
        }
    }

    pub fn granularity(&self) -> Duration {
        Duration::minutes(self.slot_granularity_minutes)
    }

    pub fn reminder_lead(&self) -> Duration {
        Duration::days(self.reminder_lead_days)
    }

    pub fn poll_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.poll_interval_secs)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
