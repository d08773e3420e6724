use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Circuit breaker guarding calls to an upstream service.
pub type UpstreamBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Creates a circuit breaker for the record store and the geocoder so an
/// outage fails fast instead of stacking up timeouts.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// Only transport-level failures count. A geocoder answer with zero matches
/// is a successful call.
pub fn create_upstream_circuit_breaker() -> UpstreamBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use failsafe::futures::CircuitBreaker;
    use failsafe::Error;

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let cb = create_upstream_circuit_breaker();

        for _ in 0..5 {
            let result = cb.call(async { Err::<(), &str>("simulated error") }).await;
            assert!(result.is_err());
        }

        let result = cb.call(async { Ok::<(), &str>(()) }).await;
        match result {
            Err(Error::Rejected) => {}
            _ => panic!("Expected circuit to be open and reject requests"),
        }
    }

    #[tokio::test]
    async fn test_circuit_breaker_allows_success() {
        let cb = create_upstream_circuit_breaker();

        let result = cb.call(async { Ok::<i32, &str>(42) }).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_empty_answers_do_not_trip() {
        let cb = create_upstream_circuit_breaker();

        for _ in 0..10 {
            let result = cb.call(async { Ok::<Option<f64>, &str>(None) }).await;
            assert!(matches!(result, Ok(None)));
        }
        assert!(cb.is_call_permitted());
    }
}
