use std::env;
use std::time::Duration;

const DEFAULT_API_KEY: &str = "dev-companion-key";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Runtime settings, read from `COMPANION_*` environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub api_key: String,
    pub database_url: Option<String>,
    pub hotels_base_url: Option<String>,
    pub payment_base_url: Option<String>,
    pub llm: Option<LlmConfig>,
    pub allowed_origins: Vec<String>,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub booking_tick: Duration,
    pub max_open_bookings: usize,
    pub booking_idle_ttl: Duration,
    pub http_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            database_url: None,
            hotels_base_url: None,
            payment_base_url: None,
            llm: None,
            allowed_origins: vec!["http://localhost:5500".to_string()],
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 120,
            booking_tick: Duration::from_secs(1),
            max_open_bookings: 10_000,
            booking_idle_ttl: Duration::from_secs(30 * 60),
            http_timeout: Duration::from_secs(20),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let llm = match (
            non_empty_var("COMPANION_LLM_BASE_URL"),
            non_empty_var("COMPANION_LLM_API_KEY"),
        ) {
            (Some(base_url), Some(api_key)) => Some(LlmConfig {
                base_url,
                api_key,
                model: non_empty_var("COMPANION_LLM_MODEL")
                    .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            }),
            _ => None,
        };

        Self {
            bind: non_empty_var("COMPANION_BIND").unwrap_or(defaults.bind),
            api_key: non_empty_var("COMPANION_API_KEY").unwrap_or(defaults.api_key),
            database_url: non_empty_var("COMPANION_DATABASE_URL"),
            hotels_base_url: non_empty_var("COMPANION_HOTELS_BASE_URL"),
            payment_base_url: non_empty_var("COMPANION_PAYMENT_BASE_URL"),
            llm,
            allowed_origins: non_empty_var("COMPANION_ALLOWED_ORIGINS")
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),
            rate_limit_window: parsed_var("COMPANION_RATE_LIMIT_WINDOW_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: parsed_var("COMPANION_RATE_LIMIT_MAX")
                .unwrap_or(defaults.rate_limit_max),
            booking_tick: positive_millis_var("COMPANION_BOOKING_TICK_MILLIS")
                .unwrap_or(defaults.booking_tick),
            max_open_bookings: parsed_var("COMPANION_MAX_OPEN_BOOKINGS")
                .unwrap_or(defaults.max_open_bookings),
            booking_idle_ttl: parsed_var("COMPANION_BOOKING_IDLE_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.booking_idle_ttl),
            http_timeout: parsed_var("COMPANION_HTTP_TIMEOUT_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    non_empty_var(name).and_then(|value| value.parse::<T>().ok())
}

/// A zero period is treated as unset.
fn positive_millis_var(name: &str) -> Option<Duration> {
    parsed_var::<u64>(name)
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tick_falls_back_to_default() {
        env::set_var("COMPANION_CONFIG_TEST_TICK_ZERO", "0");
        env::set_var("COMPANION_CONFIG_TEST_TICK_SET", "250");

        assert_eq!(positive_millis_var("COMPANION_CONFIG_TEST_TICK_ZERO"), None);
        assert_eq!(
            positive_millis_var("COMPANION_CONFIG_TEST_TICK_SET"),
            Some(Duration::from_millis(250))
        );
        assert_eq!(positive_millis_var("COMPANION_CONFIG_TEST_TICK_UNSET"), None);
    }
}
