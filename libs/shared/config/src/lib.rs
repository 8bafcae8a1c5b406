use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub scheduling: SchedulingConfig,
}

/// Establishment-level scheduling knobs. Defaults match what the booking
/// page has always assumed; overridable per deployment via env.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    /// Granularity of the candidate-slot walk, in minutes.
    pub slot_step_minutes: i64,
    /// Minimum buffer between "now" and the earliest bookable start.
    pub min_lead_minutes: i64,
    /// Booking horizon: no slots offered or accepted beyond this many days.
    pub max_advance_days: i64,
    /// Upper bound on any single store round-trip.
    pub store_timeout_seconds: u64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_step_minutes: 15,
            min_lead_minutes: 60,
            max_advance_days: 90,
            store_timeout_seconds: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL").unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY").unwrap_or_else(|_| {
                warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                String::new()
            }),
            scheduling: SchedulingConfig {
                slot_step_minutes: env_i64("SLOT_STEP_MINUTES", 15),
                min_lead_minutes: env_i64("MIN_LEAD_MINUTES", 60),
                max_advance_days: env_i64("MAX_ADVANCE_DAYS", 90),
                store_timeout_seconds: env_i64("STORE_TIMEOUT_SECONDS", 10) as u64,
            },
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid integer, using default {}", name, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scheduling_knobs() {
        let knobs = SchedulingConfig::default();
        assert_eq!(knobs.slot_step_minutes, 15);
        assert_eq!(knobs.min_lead_minutes, 60);
        assert_eq!(knobs.max_advance_days, 90);
    }
}
