//! Delays between route apply attempts.

use std::time::Duration;

use rand::Rng;

use crate::config::RouteConfig;

/// Delay before the `retry`-th retry of a route apply; 0 means none.
///
/// Doubles from `base_delay_ms` up to `max_delay_ms`, plus up to a tenth of
/// the capped delay as jitter.
pub fn calculate_backoff(retry: u32, config: &RouteConfig) -> Duration {
    let Some(doublings) = retry.checked_sub(1) else {
        return Duration::ZERO;
    };
    let factor = 1u64.checked_shl(doublings).unwrap_or(u64::MAX);
    let capped = config.base_delay_ms.saturating_mul(factor).min(config.max_delay_ms);
    let jitter = rand::thread_rng().gen_range(0..=capped / 10);
    Duration::from_millis(capped.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(base_delay_ms: u64, max_delay_ms: u64) -> RouteConfig {
        RouteConfig {
            base_delay_ms,
            max_delay_ms,
            ..RouteConfig::default()
        }
    }

    #[test]
    fn test_delay_doubles_until_capped() {
        let config = route(200, 2_000);
        assert_eq!(calculate_backoff(0, &config), Duration::ZERO);

        let first = calculate_backoff(1, &config).as_millis();
        assert!((200..=220).contains(&first));

        let second = calculate_backoff(2, &config).as_millis();
        assert!((400..=440).contains(&second));

        let capped = calculate_backoff(12, &config).as_millis();
        assert!((2_000..=2_200).contains(&capped));
    }

    #[test]
    fn test_large_retry_counts_saturate() {
        let d = calculate_backoff(u32::MAX, &route(u64::MAX, 5_000)).as_millis();
        assert!((5_000..=5_500).contains(&d));
    }

    #[test]
    fn test_zero_cap_retries_immediately() {
        assert_eq!(calculate_backoff(3, &route(200, 0)), Duration::ZERO);
    }
}
